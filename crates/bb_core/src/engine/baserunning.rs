//! Baserunning state machine
//!
//! `transition` maps (base/out state, outcome, batter) to the next state and
//! the runners who scored. One handler per outcome family; every handler is
//! pure, so identical inputs always give identical results.
//!
//! A play that records the third out ends the half-inning: the returned state
//! is empty with zero outs and any runs crossing on that play are discarded.

use crate::models::{Base, BaserunningState, Outcome, PlayerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub next: BaserunningState,
    /// Scorers in the order they crossed the plate.
    pub scorer_ids: Vec<PlayerId>,
    /// Runner (not batter) retired on the play.
    pub out_runner_id: Option<PlayerId>,
    pub outs_recorded: u8,
    pub inning_over: bool,
    /// Batter reached base safely (or scored).
    pub batter_reached: bool,
}

impl TransitionResult {
    pub fn runs_scored(&self) -> u32 {
        self.scorer_ids.len() as u32
    }
}

/// Working copy of a play in progress.
struct Play {
    bases: BaserunningState,
    scored: Vec<PlayerId>,
    out_runner: Option<PlayerId>,
    outs_recorded: u8,
    batter_reached: bool,
}

impl Play {
    fn new(state: &BaserunningState) -> Self {
        Self {
            bases: state.clone(),
            scored: Vec::new(),
            out_runner: None,
            outs_recorded: 0,
            batter_reached: false,
        }
    }

    fn total_outs(&self) -> u8 {
        self.bases.outs + self.outs_recorded
    }

    fn batter_out(&mut self) {
        self.outs_recorded += 1;
    }

    fn batter_to(&mut self, base: Base, batter: &PlayerId) {
        *self.bases.slot_mut(base) = Some(batter.clone());
        self.batter_reached = true;
    }

    fn score_from(&mut self, base: Base) {
        if let Some(runner) = self.bases.slot_mut(base).take() {
            self.scored.push(runner);
        }
    }

    /// Move one runner up a base if the base ahead is free; third scores.
    fn advance_if_open(&mut self, base: Base) {
        match base.next() {
            None => self.score_from(base),
            Some(ahead) => {
                if !self.bases.is_occupied(ahead) {
                    let runner = self.bases.slot_mut(base).take();
                    *self.bases.slot_mut(ahead) = runner;
                }
            }
        }
    }

    /// Every runner moves up `count` bases, lead runner first.
    fn advance_all(&mut self, count: u8) {
        for base in Base::LEAD_FIRST {
            let Some(runner) = self.bases.slot_mut(base).take() else {
                continue;
            };
            let target = base.index() as u8 + count;
            match target {
                0 => *self.bases.slot_mut(Base::First) = Some(runner),
                1 => *self.bases.slot_mut(Base::Second) = Some(runner),
                2 => *self.bases.slot_mut(Base::Third) = Some(runner),
                _ => self.scored.push(runner),
            }
        }
    }

    /// Forced runners move up one base to make room for the batter at first.
    fn force_batter_to_first(&mut self, batter: &PlayerId) {
        if self.bases.first.is_some() {
            if self.bases.second.is_some() {
                if self.bases.third.is_some() {
                    self.score_from(Base::Third);
                }
                self.bases.third = self.bases.second.take();
            }
            self.bases.second = self.bases.first.take();
        }
        self.batter_to(Base::First, batter);
    }

    fn finish(self) -> TransitionResult {
        let total_outs = self.total_outs();
        if total_outs >= 3 {
            return TransitionResult {
                next: BaserunningState::empty(),
                scorer_ids: Vec::new(),
                out_runner_id: self.out_runner,
                outs_recorded: self.outs_recorded,
                inning_over: true,
                batter_reached: self.batter_reached,
            };
        }
        let mut next = self.bases;
        next.outs = total_outs;
        TransitionResult {
            next,
            scorer_ids: self.scored,
            out_runner_id: self.out_runner,
            outs_recorded: self.outs_recorded,
            inning_over: false,
            batter_reached: self.batter_reached,
        }
    }
}

/// Apply one plate appearance outcome to a base/out state.
pub fn transition(state: &BaserunningState, outcome: Outcome, batter: &PlayerId) -> TransitionResult {
    let mut play = Play::new(state);
    match outcome {
        Outcome::Single | Outcome::Double | Outcome::Triple | Outcome::HomeRun => {
            hit(&mut play, outcome, batter)
        }
        Outcome::Walk | Outcome::HitByPitch | Outcome::CatcherInterference => {
            play.force_batter_to_first(batter)
        }
        Outcome::Strikeout | Outcome::LineOut | Outcome::PopOut => play.batter_out(),
        Outcome::GroundOut => ground_out(&mut play),
        Outcome::FlyOut => fly_out(&mut play),
        Outcome::SacrificeFly => sacrifice_fly(&mut play),
        Outcome::SacrificeBunt => sacrifice_bunt(&mut play),
        Outcome::FieldersChoice => fielders_choice(&mut play, batter),
        Outcome::ReachedOnError => {
            play.advance_all(1);
            play.batter_to(Base::First, batter);
        }
    }
    play.finish()
}

// ============================================================================
// Handlers
// ============================================================================

fn hit(play: &mut Play, outcome: Outcome, batter: &PlayerId) {
    match outcome {
        Outcome::Single => {
            for base in Base::LEAD_FIRST {
                play.advance_if_open(base);
            }
            play.batter_to(Base::First, batter);
        }
        Outcome::Double => {
            play.advance_all(2);
            play.batter_to(Base::Second, batter);
        }
        Outcome::Triple => {
            play.advance_all(3);
            play.batter_to(Base::Third, batter);
        }
        _ => {
            play.advance_all(3);
            play.scored.push(batter.clone());
            play.batter_reached = true;
        }
    }
}

fn ground_out(play: &mut Play) {
    let prior_outs = play.bases.outs;
    play.batter_out();
    if play.total_outs() >= 3 {
        return;
    }
    // Third holds with nobody out, scores with one out
    if prior_outs == 1 {
        play.score_from(Base::Third);
    }
    play.advance_if_open(Base::Second);
    play.advance_if_open(Base::First);
}

fn fly_out(play: &mut Play) {
    play.batter_out();
    if play.total_outs() >= 3 {
        return;
    }
    // Runner on second tags when third is open
    play.advance_if_open(Base::Second);
}

fn sacrifice_fly(play: &mut Play) {
    play.batter_out();
    if play.total_outs() >= 3 {
        return;
    }
    play.score_from(Base::Third);
    play.advance_if_open(Base::Second);
}

fn sacrifice_bunt(play: &mut Play) {
    play.batter_out();
    if play.total_outs() >= 3 {
        return;
    }
    play.advance_all(1);
}

fn fielders_choice(play: &mut Play, batter: &PlayerId) {
    // Lead forced runner: end of the occupied chain starting at first.
    // With first open nobody is forced and the lead runner is cut down.
    let target = if play.bases.first.is_some() {
        if play.bases.second.is_none() {
            Some(Base::First)
        } else if play.bases.third.is_none() {
            Some(Base::Second)
        } else {
            Some(Base::Third)
        }
    } else {
        Base::LEAD_FIRST.into_iter().find(|&b| play.bases.is_occupied(b))
    };

    let Some(target) = target else {
        // Nobody to put out: the batter is retired
        play.batter_out();
        return;
    };

    play.out_runner = play.bases.slot_mut(target).take();
    play.outs_recorded += 1;

    // Runners behind the retired one are forced up; runners ahead hold
    match target {
        Base::Third => {
            play.bases.third = play.bases.second.take();
            play.bases.second = play.bases.first.take();
        }
        Base::Second => {
            play.bases.second = play.bases.first.take();
        }
        Base::First => {}
    }
    play.batter_to(Base::First, batter);
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PlayerId {
        PlayerId::from(s)
    }

    fn state(outs: u8, first: Option<&str>, second: Option<&str>, third: Option<&str>) -> BaserunningState {
        BaserunningState {
            outs,
            first: first.map(id),
            second: second.map(id),
            third: third.map(id),
        }
    }

    #[test]
    fn test_single_moves_everyone_one_base() {
        let r = transition(&state(0, Some("a"), Some("b"), Some("c")), Outcome::Single, &id("bat"));
        assert_eq!(r.scorer_ids, vec![id("c")]);
        assert_eq!(r.next, state(0, Some("bat"), Some("a"), Some("b")));
        assert!(r.batter_reached);
    }

    #[test]
    fn test_double_scores_runners_from_second_and_third() {
        let r = transition(&state(1, Some("a"), Some("b"), Some("c")), Outcome::Double, &id("bat"));
        assert_eq!(r.scorer_ids, vec![id("c"), id("b")]);
        assert_eq!(r.next, state(1, None, Some("bat"), Some("a")));
    }

    #[test]
    fn test_triple_clears_bases() {
        let r = transition(&state(2, Some("a"), None, Some("c")), Outcome::Triple, &id("bat"));
        assert_eq!(r.runs_scored(), 2);
        assert_eq!(r.next, state(2, None, None, Some("bat")));
    }

    #[test]
    fn test_grand_slam() {
        let r = transition(&state(2, Some("a"), Some("b"), Some("c")), Outcome::HomeRun, &id("bat"));
        assert_eq!(r.scorer_ids, vec![id("c"), id("b"), id("a"), id("bat")]);
        assert!(r.next.is_empty());
        assert_eq!(r.next.outs, 2);
    }

    #[test]
    fn test_walk_only_moves_forced_runners() {
        let r = transition(&state(0, None, Some("b"), Some("c")), Outcome::Walk, &id("bat"));
        assert_eq!(r.next, state(0, Some("bat"), Some("b"), Some("c")));
        assert_eq!(r.runs_scored(), 0);

        let r = transition(&state(0, Some("a"), None, Some("c")), Outcome::HitByPitch, &id("bat"));
        assert_eq!(r.next, state(0, Some("bat"), Some("a"), Some("c")));

        let r = transition(&state(1, Some("a"), Some("b"), Some("c")), Outcome::Walk, &id("bat"));
        assert_eq!(r.scorer_ids, vec![id("c")]);
        assert_eq!(r.next, state(1, Some("bat"), Some("a"), Some("b")));
    }

    #[test]
    fn test_ground_out_runner_on_third_holds_with_nobody_out() {
        let r = transition(&state(0, None, None, Some("c")), Outcome::GroundOut, &id("bat"));
        assert_eq!(r.runs_scored(), 0);
        assert_eq!(r.next, state(1, None, None, Some("c")));
    }

    #[test]
    fn test_ground_out_runner_on_third_scores_with_one_out() {
        let r = transition(&state(1, Some("a"), None, Some("c")), Outcome::GroundOut, &id("bat"));
        assert_eq!(r.scorer_ids, vec![id("c")]);
        assert_eq!(r.next, state(2, None, Some("a"), None));
    }

    #[test]
    fn test_ground_out_with_two_outs_ends_half_inning() {
        let r = transition(&state(2, None, None, Some("c")), Outcome::GroundOut, &id("bat"));
        assert!(r.inning_over);
        assert_eq!(r.next.outs, 0);
        assert!(r.next.is_empty());
        assert_eq!(r.runs_scored(), 0);
    }

    #[test]
    fn test_fly_out_tags_from_second() {
        let r = transition(&state(0, Some("a"), Some("b"), None), Outcome::FlyOut, &id("bat"));
        assert_eq!(r.next, state(1, Some("a"), None, Some("b")));
    }

    #[test]
    fn test_sacrifice_fly_scores_from_third() {
        let r = transition(&state(1, None, Some("b"), Some("c")), Outcome::SacrificeFly, &id("bat"));
        assert_eq!(r.scorer_ids, vec![id("c")]);
        assert_eq!(r.next, state(2, None, None, Some("b")));
    }

    #[test]
    fn test_sacrifice_bunt_advances_runners() {
        let r = transition(&state(0, Some("a"), Some("b"), None), Outcome::SacrificeBunt, &id("bat"));
        assert_eq!(r.next, state(1, None, Some("a"), Some("b")));
        assert!(!r.batter_reached);
    }

    #[test]
    fn test_fielders_choice_forces_lead_runner() {
        let r = transition(&state(0, Some("a"), Some("b"), Some("c")), Outcome::FieldersChoice, &id("bat"));
        assert_eq!(r.out_runner_id, Some(id("c")));
        assert_eq!(r.next, state(1, Some("bat"), Some("a"), Some("b")));
        assert_eq!(r.runs_scored(), 0);

        let r = transition(&state(0, Some("a"), None, Some("c")), Outcome::FieldersChoice, &id("bat"));
        assert_eq!(r.out_runner_id, Some(id("a")));
        assert_eq!(r.next, state(1, Some("bat"), None, Some("c")));

        let r = transition(&state(1, None, Some("b"), None), Outcome::FieldersChoice, &id("bat"));
        assert_eq!(r.out_runner_id, Some(id("b")));
        assert_eq!(r.next, state(2, Some("bat"), None, None));
    }

    #[test]
    fn test_reached_on_error_advances_everyone() {
        let r = transition(&state(0, Some("a"), None, Some("c")), Outcome::ReachedOnError, &id("bat"));
        assert_eq!(r.scorer_ids, vec![id("c")]);
        assert_eq!(r.next, state(0, Some("bat"), Some("a"), None));
    }

    #[test]
    fn test_third_out_discards_runs() {
        let r = transition(&state(2, Some("a"), Some("b"), Some("c")), Outcome::FieldersChoice, &id("bat"));
        assert!(r.inning_over);
        assert!(r.scorer_ids.is_empty());
        assert_eq!(r.next, BaserunningState::empty());
    }

    #[test]
    fn test_transition_is_pure() {
        let s = state(1, Some("a"), Some("b"), None);
        for outcome in Outcome::ALL {
            assert_eq!(transition(&s, outcome, &id("bat")), transition(&s, outcome, &id("bat")));
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn any_state() -> impl Strategy<Value = BaserunningState> {
            (0u8..=2, any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(outs, f, s, t)| {
                BaserunningState {
                    outs,
                    first: f.then(|| id("r1")),
                    second: s.then(|| id("r2")),
                    third: t.then(|| id("r3")),
                }
            })
        }

        proptest! {
            #[test]
            fn transition_preserves_invariants(s in any_state(), idx in 0usize..16) {
                let outcome = Outcome::ALL[idx];
                let r = transition(&s, outcome, &id("bat"));
                prop_assert!(r.next.check_invariants().is_ok());
                prop_assert!(r.next.outs <= 2);
                prop_assert!(r.next.occupied_count() <= 3);

                if r.inning_over {
                    prop_assert_eq!(r.next.outs, 0);
                    prop_assert!(r.next.is_empty());
                } else {
                    // Nobody appears or vanishes: batter plus runners before the
                    // play equals runners after plus scorers plus outs recorded
                    let before = s.occupied_count() + 1;
                    let after = r.next.occupied_count() + r.scorer_ids.len() + r.outs_recorded as usize;
                    prop_assert_eq!(before, after);
                    prop_assert!(r.next.outs >= s.outs);
                }
            }
        }
    }
}
