//! # Lineup Builder
//!
//! Turns a roster into a legal starting lineup, a classified bullpen and a
//! bench:
//!
//! 1. starting pitcher: weighted by games started, usage-modulated
//! 2. defensive positions: scarcest first, weighted by plate appearances and
//!    usage, with a deterministic Hungarian fallback
//! 3. batting order: era strategy blend for the season
//!
//! An invalid lineup is never returned: every result passes the lineup
//! validator or the build fails with an error.

pub mod batting_order;
pub mod pitching_staff;
pub mod positions;
pub mod usage;

pub use batting_order::{EraBlend, EraStrategy, HitterProfile};
pub use usage::{usage_multiplier, weighted_choice_index, UsageWeight};

use rand::Rng;

use crate::data::{SeasonNorms, TeamRoster, UsageTracker};
use crate::engine::config::SimConfig;
use crate::error::{Result, SimError};
use crate::models::{
    BullpenState, EventRates, Handedness, LineupSlot, LineupState, OutcomeTable, PlayerId,
    Position, SplitRates,
};
use positions::Candidate;

/// Inputs for one team's pre-game lineup.
#[derive(Debug, Clone, Copy)]
pub struct LineupRequest<'a> {
    pub roster: &'a TeamRoster,
    pub norms: &'a SeasonNorms,
    pub year: u16,
    pub dh_in_effect: bool,
    pub usage: Option<&'a UsageTracker>,
    /// Throwing hand of the opposing starter, when known.
    pub opposing_hand: Option<Handedness>,
}

#[derive(Debug, Clone)]
pub struct BuiltLineup {
    pub lineup: LineupState,
    pub bullpen: BullpenState,
    /// Unused position players, most playing time first.
    pub bench: Vec<PlayerId>,
    /// Selected players whose usage is past the hard cap.
    pub overused: Vec<PlayerId>,
    pub used_fallback: bool,
}

pub struct LineupBuilder<'c> {
    config: &'c SimConfig,
}

impl<'c> LineupBuilder<'c> {
    pub fn new(config: &'c SimConfig) -> Self {
        Self { config }
    }

    pub fn build<R: Rng + ?Sized>(&self, req: &LineupRequest<'_>, rng: &mut R) -> Result<BuiltLineup> {
        let roster = req.roster;
        let (starter, starter_capped) =
            pitching_staff::select_starter(roster, req.usage, self.config, rng)?;
        let starter_id = starter.id.clone();

        let mut capped_hitters = Vec::new();
        let candidates: Vec<Candidate<'_>> = roster
            .position_players()
            .map(|p| {
                let ratio = req.usage.and_then(|u| u.batting_ratio(&roster.team_id, p));
                let weight = usage_multiplier(ratio, &self.config.usage);
                if weight.hard_capped {
                    capped_hitters.push(p.id.clone());
                }
                Candidate { player: p, weight: (p.plate_appearances().max(1) as f64) * weight.multiplier }
            })
            .collect();

        let fill = positions::fill_order(req.dh_in_effect);
        if candidates.len() < fill.len() {
            return Err(SimError::InsufficientRoster {
                team: roster.team_id.clone(),
                reason: format!("{} position players for {} spots", candidates.len(), fill.len()),
            });
        }

        let mut built = None;
        for attempt in 0..self.config.lineup.max_attempts {
            let Some(assignment) = positions::random_assignment(
                &candidates,
                &fill,
                self.config.lineup.secondary_position_weight,
                rng,
            ) else {
                continue;
            };
            match self.assemble(req, &assignment, &starter_id) {
                Ok(lineup) => {
                    built = Some((lineup, false));
                    break;
                }
                Err(e) => tracing::debug!(team = %roster.team_id, attempt, "lineup attempt rejected: {e}"),
            }
        }

        let (lineup, used_fallback) = match built {
            Some(b) => b,
            None => {
                tracing::debug!(team = %roster.team_id, "falling back to deterministic assignment");
                let assignment = positions::fallback_assignment(&candidates, &fill).ok_or_else(|| {
                    SimError::InsufficientRoster {
                        team: roster.team_id.clone(),
                        reason: "no eligible player for every position".to_string(),
                    }
                })?;
                (self.assemble(req, &assignment, &starter_id)?, true)
            }
        };

        let bullpen = pitching_staff::build_bullpen(roster, &starter_id, req.norms, self.config)?;

        let mut bench: Vec<&crate::models::RosterPlayer> =
            roster.position_players().filter(|p| !lineup.contains(&p.id)).collect();
        bench.sort_by(|a, b| b.plate_appearances().cmp(&a.plate_appearances()).then(a.id.cmp(&b.id)));

        let mut overused: Vec<PlayerId> =
            capped_hitters.into_iter().filter(|id| lineup.contains(id)).collect();
        if starter_capped {
            overused.push(starter_id);
        }

        Ok(BuiltLineup {
            lineup,
            bullpen,
            bench: bench.into_iter().map(|p| p.id.clone()).collect(),
            overused,
            used_fallback,
        })
    }

    /// Order the assigned players and validate the result.
    fn assemble(
        &self,
        req: &LineupRequest<'_>,
        assignment: &[(Position, PlayerId)],
        starter: &PlayerId,
    ) -> Result<LineupState> {
        let roster = req.roster;
        let hitters: Vec<HitterProfile> = assignment
            .iter()
            .filter_map(|(_, id)| {
                let player = roster.player(id)?;
                let batting = player.batting.as_ref()?;
                let rates = match req.opposing_hand {
                    Some(hand) => *batting.rates.against(hand),
                    None => averaged(&batting.rates),
                };
                Some(HitterProfile::from_rates(id.clone(), &rates, batting.speed))
            })
            .collect();

        let order = batting_order::batting_order(EraBlend::for_year(req.year), &hitters);
        let mut slots: Vec<LineupSlot> = order
            .into_iter()
            .filter_map(|id| {
                let position = assignment.iter().find(|(_, a)| *a == id).map(|(p, _)| *p)?;
                Some(LineupSlot::new(id, position))
            })
            .collect();
        if !req.dh_in_effect {
            slots.push(LineupSlot::new(starter.clone(), Position::Pitcher));
        }

        let lineup = LineupState::new(roster.team_id.clone(), slots, starter.clone(), req.dh_in_effect);
        let violations = lineup.violations(|id, pos| roster.is_eligible(id, pos));
        if !violations.is_empty() {
            return Err(SimError::InvalidLineup { team: roster.team_id.clone(), violations });
        }
        Ok(lineup)
    }
}

/// Mean of both handedness splits.
pub fn averaged(rates: &SplitRates) -> EventRates {
    OutcomeTable::from_pairs(
        rates.vs_left.iter().map(|(o, v)| (o, (v + rates.vs_right.get(o)) / 2.0)),
    )
}
