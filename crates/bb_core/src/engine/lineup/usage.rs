//! Usage multiplier applied to selection weights.

use rand::Rng;

use crate::engine::config::UsageConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageWeight {
    pub multiplier: f64,
    /// Ratio is past the hard cap; selection still possible but warned.
    pub hard_capped: bool,
}

/// Map a usage ratio (actual / prorated target) to a selection multiplier.
///
/// - no ratio yet: neutral
/// - below `underuse_threshold`: boosted, up to `underuse_max_boost` at zero use
/// - up to `soft_threshold`: neutral
/// - up to `steep_threshold`: falls linearly to `steep_floor`
/// - up to `hard_cap`: falls linearly to `hard_cap_floor`
/// - beyond: `hard_cap_floor` and flagged
pub fn usage_multiplier(ratio: Option<f64>, cfg: &UsageConfig) -> UsageWeight {
    let Some(r) = ratio.filter(|r| r.is_finite()) else {
        return UsageWeight { multiplier: 1.0, hard_capped: false };
    };
    let r = r.max(0.0);

    let multiplier = if r < cfg.underuse_threshold {
        let deficit = (cfg.underuse_threshold - r) / cfg.underuse_threshold;
        1.0 + (cfg.underuse_max_boost - 1.0) * deficit
    } else if r <= cfg.soft_threshold {
        1.0
    } else if r <= cfg.steep_threshold {
        let t = (r - cfg.soft_threshold) / (cfg.steep_threshold - cfg.soft_threshold).max(1e-9);
        1.0 + (cfg.steep_floor - 1.0) * t
    } else if r <= cfg.hard_cap {
        let t = (r - cfg.steep_threshold) / (cfg.hard_cap - cfg.steep_threshold).max(1e-9);
        cfg.steep_floor + (cfg.hard_cap_floor - cfg.steep_floor) * t
    } else {
        cfg.hard_cap_floor
    };

    UsageWeight { multiplier, hard_capped: r > cfg.hard_cap }
}

/// Weighted random pick; returns an index into `weights`.
///
/// Non-positive weights are never picked unless every weight is non-positive,
/// in which case the first index is returned.
pub fn weighted_choice_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
    if total <= 0.0 {
        return 0;
    }
    let mut r = rng.gen::<f64>() * total;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        last_positive = i;
        r -= w;
        if r <= 0.0 {
            return i;
        }
    }
    last_positive
}
