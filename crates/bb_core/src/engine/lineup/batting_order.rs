//! Era batting-order strategies.
//!
//! Each strategy ranks the hitters by a different signal and maps ranks to
//! lineup spots. Transition years blend two neighboring strategies by moving a
//! proportional number of spots from the older order to the newer one.

use serde::{Deserialize, Serialize};

use crate::models::{EventRates, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EraStrategy {
    /// Speed at the top, power in the middle.
    Traditional,
    /// On-base leadoff, best bat third, cleanup slugger.
    Composite,
    /// Best on-base hitters first, then best overall bats.
    EarlyAnalytics,
    /// Best hitters in spots 1, 2 and 4.
    Modern,
}

/// Strategy mix for one season. `factor` is the share of `to` in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EraBlend {
    pub from: EraStrategy,
    pub to: EraStrategy,
    pub factor: f64,
}

impl EraBlend {
    pub fn pure(strategy: EraStrategy) -> Self {
        Self { from: strategy, to: strategy, factor: 0.0 }
    }

    pub fn for_year(year: u16) -> Self {
        use EraStrategy::*;
        // (first transition year, last transition year, from, to)
        const TRANSITIONS: [(u16, u16, EraStrategy, EraStrategy); 3] = [
            (1980, 1984, Traditional, Composite),
            (1995, 1999, Composite, EarlyAnalytics),
            (2010, 2014, EarlyAnalytics, Modern),
        ];
        for (start, end, from, to) in TRANSITIONS {
            if year < start {
                return Self::pure(from);
            }
            if year <= end {
                let span = (end - start + 2) as f64;
                return Self { from, to, factor: (year - start + 1) as f64 / span };
            }
        }
        Self::pure(Modern)
    }
}

/// What the order builder needs to know about a hitter.
#[derive(Debug, Clone)]
pub struct HitterProfile {
    pub id: PlayerId,
    pub on_base: f64,
    pub slugging: f64,
    pub contact: f64,
    pub speed: f64,
}

impl HitterProfile {
    pub fn from_rates(id: PlayerId, rates: &EventRates, speed: f64) -> Self {
        Self {
            id,
            on_base: rates.on_base_share(),
            slugging: rates.slugging_share(),
            contact: rates.contact_share(),
            speed,
        }
    }

    pub fn ops(&self) -> f64 {
        self.on_base + self.slugging
    }
}

/// Indices sorted by `key` descending; ties keep input order.
fn ranked<F>(hitters: &[HitterProfile], key: F) -> Vec<usize>
where
    F: Fn(&HitterProfile) -> f64,
{
    let mut idx: Vec<usize> = (0..hitters.len()).collect();
    idx.sort_by(|&a, &b| key(&hitters[b]).total_cmp(&key(&hitters[a])));
    idx
}

/// Take the best remaining hitter by `key`.
fn take_best<F>(hitters: &[HitterProfile], remaining: &mut Vec<usize>, key: F) -> Option<usize>
where
    F: Fn(&HitterProfile) -> f64,
{
    let best_pos = remaining
        .iter()
        .enumerate()
        .max_by(|x, y| key(&hitters[*x.1]).total_cmp(&key(&hitters[*y.1])).then(y.0.cmp(&x.0)))
        .map(|(pos, _)| pos)?;
    Some(remaining.remove(best_pos))
}

/// Order for a single strategy, as indices into `hitters`.
pub fn order_for(strategy: EraStrategy, hitters: &[HitterProfile]) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..hitters.len()).collect();
    let mut order = Vec::with_capacity(hitters.len());

    match strategy {
        EraStrategy::Traditional => {
            order.extend(take_best(hitters, &mut remaining, |h| h.on_base * 0.5 + h.speed * 0.5));
            order.extend(take_best(hitters, &mut remaining, |h| h.contact));
            order.extend(take_best(hitters, &mut remaining, HitterProfile::ops));
            order.extend(take_best(hitters, &mut remaining, |h| h.slugging));
            order.extend(take_best(hitters, &mut remaining, |h| h.slugging));
        }
        EraStrategy::Composite => {
            order.extend(take_best(hitters, &mut remaining, |h| h.on_base));
            order.extend(take_best(hitters, &mut remaining, |h| h.on_base * 0.7 + h.contact * 0.3));
            order.extend(take_best(hitters, &mut remaining, HitterProfile::ops));
            order.extend(take_best(hitters, &mut remaining, |h| h.slugging));
        }
        EraStrategy::EarlyAnalytics => {
            order.extend(take_best(hitters, &mut remaining, |h| h.on_base));
            order.extend(take_best(hitters, &mut remaining, |h| h.on_base));
            order.extend(take_best(hitters, &mut remaining, HitterProfile::ops));
            order.extend(take_best(hitters, &mut remaining, HitterProfile::ops));
        }
        EraStrategy::Modern => {
            // Rank by OPS, then place ranks into spots 2, 1, 4, 3, 5, ...
            let by_ops = ranked(hitters, HitterProfile::ops);
            const SPOT_FOR_RANK: [usize; 9] = [1, 0, 3, 2, 4, 5, 6, 7, 8];
            let mut spots = vec![usize::MAX; hitters.len()];
            for (rank, &hitter) in by_ops.iter().enumerate() {
                let spot = SPOT_FOR_RANK.get(rank).copied().filter(|&s| s < hitters.len()).unwrap_or(rank);
                spots[spot] = hitter;
            }
            return spots;
        }
    }

    // Everyone else by OPS
    for i in ranked(hitters, HitterProfile::ops) {
        if remaining.contains(&i) {
            order.push(i);
        }
    }
    order
}

/// Blend two orders: the first `round(factor * n)` spots where they differ
/// take the newer order's hitter, swapping within the older order.
pub fn blend_orders(from: &[usize], to: &[usize], factor: f64) -> Vec<usize> {
    let mut order = from.to_vec();
    let mut swaps = (factor.clamp(0.0, 1.0) * order.len() as f64).round() as usize;
    for spot in 0..order.len() {
        if swaps == 0 {
            break;
        }
        if order[spot] == to[spot] {
            continue;
        }
        if let Some(other) = order.iter().position(|&h| h == to[spot]) {
            order.swap(spot, other);
            swaps -= 1;
        }
    }
    order
}

/// Batting order for the season's era blend.
pub fn batting_order(blend: EraBlend, hitters: &[HitterProfile]) -> Vec<PlayerId> {
    let from = order_for(blend.from, hitters);
    let indices = if blend.from == blend.to || blend.factor <= 0.0 {
        from
    } else {
        let to = order_for(blend.to, hitters);
        blend_orders(&from, &to, blend.factor)
    };
    indices.into_iter().map(|i| hitters[i].id.clone()).collect()
}
