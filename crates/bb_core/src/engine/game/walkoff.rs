//! Walk-off truncation.
//!
//! When the home team takes the lead in the bottom of the final regulation
//! inning or later, the game ends the moment the winning run scores. Only the
//! runs needed for a one-run lead count, except on a home run where every run
//! counts.
//!
//! Runner placement after truncation is an approximation: runners whose runs
//! no longer count are put back on the highest open base, and a batter whose
//! double or triple ended the game is credited with a single and stands on
//! first.

use crate::engine::baserunning::TransitionResult;
use crate::models::{Base, BaserunningState, Half, Outcome, PlayerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOff {
    /// Outcome as credited to the batter.
    pub outcome: Outcome,
    /// Scorers that count, in crossing order.
    pub scorer_ids: Vec<PlayerId>,
    pub bases_after: BaserunningState,
}

/// Game-ending play for the home team, or `None` when the play does not end the game.
pub fn truncate(
    inning: u8,
    half: Half,
    regulation_innings: u8,
    home_lead_before: i32,
    outcome: Outcome,
    batter: &PlayerId,
    transition: &TransitionResult,
) -> Option<WalkOff> {
    if half != Half::Bottom || inning < regulation_innings || home_lead_before > 0 {
        return None;
    }
    let runs = transition.scorer_ids.len() as i32;
    if transition.inning_over || home_lead_before + runs <= 0 {
        return None;
    }

    if outcome == Outcome::HomeRun {
        return Some(WalkOff {
            outcome,
            scorer_ids: transition.scorer_ids.clone(),
            bases_after: transition.next.clone(),
        });
    }

    let needed = (1 - home_lead_before) as usize;
    let (counted, returned) = transition.scorer_ids.split_at(needed.min(transition.scorer_ids.len()));
    let mut bases = transition.next.clone();

    let credited = match outcome {
        Outcome::Double | Outcome::Triple => {
            for base in [Base::Second, Base::Third] {
                if bases.runner(base) == Some(batter) {
                    *bases.slot_mut(base) = None;
                }
            }
            if bases.runner(Base::First).is_none() {
                *bases.slot_mut(Base::First) = Some(batter.clone());
            }
            Outcome::Single
        }
        other => other,
    };

    for runner in returned.iter().filter(|id| *id != batter) {
        if let Some(base) = Base::LEAD_FIRST.into_iter().find(|b| !bases.is_occupied(*b)) {
            *bases.slot_mut(base) = Some(runner.clone());
        }
    }

    Some(WalkOff { outcome: credited, scorer_ids: counted.to_vec(), bases_after: bases })
}
