//! # Game Engine
//!
//! Drives one game plate appearance by plate appearance:
//!
//! 1. managerial check: pitching change for the fielding team, pinch-hitter
//!    for the batting team
//! 2. outcome: blend rates, strip situationally impossible outcomes, sample
//! 3. baserunning transition, then walk-off truncation when it applies
//! 4. play event appended, batter advanced
//! 5. on the third out: half-inning summary, bases and outs reset, half flips,
//!    any pending pitcher enters and the new fielding team's lineup is audited
//!
//! The engine exclusively owns the game state and the substitution-tracking
//! sets (removed players, used pinch-hitters, mid-game relievers).

pub mod snapshot;
pub mod walkoff;

mod contract_tests;

pub use snapshot::GameSnapshot;

use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::data::{GameUsage, SeasonData, TeamRoster, UsageRecord, UsageTracker};
use crate::engine::baserunning;
use crate::engine::config::SimConfig;
use crate::engine::lineup::{LineupBuilder, LineupRequest};
use crate::engine::manager::{
    self, AuditResolution, EraOptions, PinchHitDecision, PinchHitReason, PinchHitRequest,
    PullDecision, PullReason, Situation,
};
use crate::engine::rate_model::{Matchup, MatchupSide, RateModel};
use crate::error::{Result, SimError};
use crate::models::{
    BaserunningState, BoxScore, BullpenState, EventFlags, GameState, GameWarning, Half, Handedness,
    Outcome, PitcherLine, PitcherRoleKind, PlayEvent, PlayerId, Position, RunsScored, SplitRates,
    TeamBox, TeamSide, WarningKind,
};

// ============================================================================
// Context
// ============================================================================

/// Read-only inputs for one game.
#[derive(Debug, Clone, Copy)]
pub struct GameContext<'a> {
    pub season: &'a SeasonData,
    pub config: &'a SimConfig,
    pub away: &'a TeamRoster,
    pub home: &'a TeamRoster,
    pub dh_in_effect: bool,
    /// Season usage so far, for lineup construction.
    pub usage: Option<&'a UsageTracker>,
}

impl<'a> GameContext<'a> {
    /// The DH follows the home team's league for the season year.
    pub fn new(season: &'a SeasonData, config: &'a SimConfig, away_id: &str, home_id: &str) -> Result<Self> {
        if away_id == home_id {
            return Err(SimError::InvalidData(format!("team {away_id} cannot play itself")));
        }
        let away = season.team(away_id)?;
        let home = season.team(home_id)?;
        let dh_in_effect = season.dh_rules().in_effect(&home.league, season.year);
        Ok(Self { season, config, away, home, dh_in_effect, usage: None })
    }

    pub fn with_usage(mut self, usage: &'a UsageTracker) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn roster(&self, side: TeamSide) -> &'a TeamRoster {
        match side {
            TeamSide::Away => self.away,
            TeamSide::Home => self.home,
        }
    }

    #[inline]
    pub fn year(&self) -> u16 {
        self.season.year
    }

    #[inline]
    fn regulation_innings(&self) -> u8 {
        self.config.game.regulation_innings
    }
}

// ============================================================================
// Result
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    pub away: u16,
    pub home: u16,
}

impl FinalScore {
    pub fn winner(&self) -> Option<TeamSide> {
        match self.away.cmp(&self.home) {
            std::cmp::Ordering::Greater => Some(TeamSide::Away),
            std::cmp::Ordering::Less => Some(TeamSide::Home),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub away_team: String,
    pub home_team: String,
    /// Play log, oldest first.
    pub plays: Vec<PlayEvent>,
    pub box_score: BoxScore,
    pub final_score: FinalScore,
    pub innings: u8,
    pub warnings: Vec<GameWarning>,
    pub plate_appearances: u32,
    /// Force-completed by the plate-appearance cap.
    pub truncated: bool,
}

/// Completion rule, checked after every bottom-half play and at the end of
/// every half-inning from the final regulation inning on.
///
/// The game is over when the home team leads in the bottom half, when the
/// home team leads after the top half (it does not need to bat), or when the
/// away team leads once the home team has batted.
pub fn game_over(state: &GameState, regulation_innings: u8, half_complete: bool) -> bool {
    if state.inning < regulation_innings {
        return false;
    }
    let (away, home) = (state.away_score, state.home_score);
    match state.half {
        Half::Bottom => home > away || (half_complete && away > home),
        Half::Top => half_complete && home > away,
    }
}

fn half_label(half: Half) -> &'static str {
    match half {
        Half::Top => "top",
        Half::Bottom => "bottom",
    }
}

// ============================================================================
// Engine
// ============================================================================

pub struct GameEngine<'a> {
    ctx: GameContext<'a>,
    model: RateModel,
    era: EraOptions,
    seed: u64,
    rng: ChaCha8Rng,
    state: GameState,
    bullpens: [BullpenState; 2],
    /// Bench players who can still enter, per side.
    bench: [Vec<PlayerId>; 2],
    removed: BTreeSet<PlayerId>,
    used_pinch_hitters: BTreeSet<PlayerId>,
    mid_game_relievers: BTreeSet<PlayerId>,
    /// Runners who reached on an error; their runs are unearned.
    reached_on_error: BTreeSet<PlayerId>,
    /// Pitcher was pinch-hit for; a reliever must enter before the next defensive half.
    needs_pitcher: [bool; 2],
    starters: [PlayerId; 2],
    /// Every pitcher used, in order of appearance.
    pitcher_order: Vec<(TeamSide, PlayerId)>,
    plate_appearances_by: BTreeMap<PlayerId, u32>,
    warnings: Vec<GameWarning>,
    box_score: BoxScore,
    sequence: u32,
    truncated: bool,
}

impl<'a> GameEngine<'a> {
    /// Build both lineups and set up the first pitch.
    ///
    /// Fails when either roster cannot produce a legal lineup.
    pub fn new(ctx: GameContext<'a>, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let builder = LineupBuilder::new(ctx.config);
        let norms = &ctx.season.norms;
        let year = ctx.year();

        let away = builder.build(
            &LineupRequest {
                roster: ctx.away,
                norms,
                year,
                dh_in_effect: ctx.dh_in_effect,
                usage: ctx.usage,
                opposing_hand: None,
            },
            &mut rng,
        )?;
        let away_throws = ctx.away.player(&away.lineup.current_pitcher).map(|p| p.throws.throwing_hand());
        let home = builder.build(
            &LineupRequest {
                roster: ctx.home,
                norms,
                year,
                dh_in_effect: ctx.dh_in_effect,
                usage: ctx.usage,
                opposing_hand: away_throws,
            },
            &mut rng,
        )?;

        let starters = [away.lineup.current_pitcher.clone(), home.lineup.current_pitcher.clone()];
        let box_score = BoxScore {
            away: TeamBox { team_id: ctx.away.team_id.clone(), ..TeamBox::default() },
            home: TeamBox { team_id: ctx.home.team_id.clone(), ..TeamBox::default() },
            pitchers: Vec::new(),
        };
        let overused = [(TeamSide::Away, away.overused.clone()), (TeamSide::Home, home.overused.clone())];

        let mut engine = Self {
            ctx,
            model: RateModel::new(ctx.config.rates.clone()),
            era: EraOptions::for_season(norms, &ctx.config.manager),
            seed,
            rng,
            state: GameState::new(away.lineup, home.lineup),
            bullpens: [away.bullpen, home.bullpen],
            bench: [away.bench, home.bench],
            removed: BTreeSet::new(),
            used_pinch_hitters: BTreeSet::new(),
            mid_game_relievers: BTreeSet::new(),
            reached_on_error: BTreeSet::new(),
            needs_pitcher: [false; 2],
            pitcher_order: vec![(TeamSide::Away, starters[0].clone()), (TeamSide::Home, starters[1].clone())],
            starters,
            plate_appearances_by: BTreeMap::new(),
            warnings: Vec::new(),
            box_score,
            sequence: 0,
            truncated: false,
        };

        for (side, ids) in overused {
            for id in ids {
                let name = ctx.roster(side).name_of(&id);
                engine.warn(WarningKind::UsageHardCap, format!("{name} starts past the usage hard cap"));
            }
        }
        for side in [TeamSide::Away, TeamSide::Home] {
            let description = engine.lineup_card(side);
            engine.push_marker(description, EventFlags { lineup: true, ..EventFlags::default() }, None);
        }

        tracing::info!(
            away = %ctx.away.team_id,
            home = %ctx.home.team_id,
            year,
            seed,
            dh = ctx.dh_in_effect,
            "game start"
        );
        Ok(engine)
    }

    // ========== Accessors ==========

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_complete(&self) -> bool {
        self.state.complete
    }

    pub fn warnings(&self) -> &[GameWarning] {
        &self.warnings
    }

    pub fn bullpen(&self, side: TeamSide) -> &BullpenState {
        &self.bullpens[side.index()]
    }

    pub fn removed_players(&self) -> &BTreeSet<PlayerId> {
        &self.removed
    }

    pub fn used_pinch_hitters(&self) -> &BTreeSet<PlayerId> {
        &self.used_pinch_hitters
    }

    pub fn mid_game_relievers(&self) -> &BTreeSet<PlayerId> {
        &self.mid_game_relievers
    }

    // ========== Game loop ==========

    /// Play until the game is complete.
    pub fn simulate(&mut self) -> Result<GameResult> {
        while !self.state.complete {
            self.step()?;
        }
        Ok(self.result())
    }

    /// Resolve one plate appearance, including the managerial checks before it
    /// and the half-inning bookkeeping after it.
    pub fn step(&mut self) -> Result<()> {
        if self.state.complete {
            return Ok(());
        }
        let cap = self.ctx.config.game.max_plate_appearances;
        if self.state.plate_appearances >= cap {
            self.warn(WarningKind::PlateAppearanceCap, format!("game stopped after {cap} plate appearances"));
            self.truncated = true;
            self.finish();
            return Ok(());
        }

        let batting = self.state.batting_side();
        let fielding = batting.opponent();
        if self.needs_pitcher[fielding.index()] {
            self.bring_in_pending_pitcher(fielding);
        }
        self.manage_pitcher(fielding);
        self.manage_pinch_hit(batting);

        let outcome = self.sample_outcome(batting, fielding)?;
        self.resolve_plate_appearance(outcome)
    }

    fn sample_outcome(&mut self, batting: TeamSide, fielding: TeamSide) -> Result<Outcome> {
        let batter_id = self.state.lineup(batting).current_slot().player_id.clone();
        let pitcher_id = self.state.lineup(fielding).current_pitcher.clone();
        let batter = self
            .ctx
            .roster(batting)
            .player(&batter_id)
            .ok_or_else(|| SimError::UnknownPlayer(batter_id.clone()))?;
        let pitcher = self
            .ctx
            .roster(fielding)
            .player(&pitcher_id)
            .ok_or_else(|| SimError::UnknownPlayer(pitcher_id.clone()))?;

        let fallback;
        let batter_rates = match batter.batting_rates() {
            Some(rates) => rates,
            None => {
                fallback = SplitRates::uniform(*self.ctx.season.norms.pitcher_batting());
                &fallback
            }
        };
        let pitcher_rates = pitcher
            .pitching_rates()
            .ok_or_else(|| SimError::InvalidData(format!("{pitcher_id} has no pitching record")))?;

        let matchup = Matchup {
            batter: MatchupSide { id: &batter_id, rates: batter_rates, hand: batter.bats },
            pitcher: MatchupSide { id: &pitcher_id, rates: pitcher_rates, hand: pitcher.throws },
            league: &self.ctx.season.norms.league_rates,
            year: self.ctx.year(),
        };
        let distribution = self.model.predict(&matchup)?;
        let distribution = RateModel::situational(&distribution, &self.state.bases)?;
        Ok(RateModel::sample(&distribution, &mut self.rng))
    }

    /// Apply a sampled outcome for the current batter and pitcher.
    pub(crate) fn resolve_plate_appearance(&mut self, outcome: Outcome) -> Result<()> {
        let batting = self.state.batting_side();
        let fielding = batting.opponent();
        let batter_id = self.state.lineup(batting).current_slot().player_id.clone();
        let pitcher_id = self.state.lineup(fielding).current_pitcher.clone();
        let regulation = self.ctx.regulation_innings();

        let bases_before = self.state.bases.clone();
        let transition = baserunning::transition(&bases_before, outcome, &batter_id);
        let walk_off = walkoff::truncate(
            self.state.inning,
            self.state.half,
            regulation,
            self.state.lead_for(TeamSide::Home),
            outcome,
            &batter_id,
            &transition,
        );
        let (credited, scorers, bases_after) = match &walk_off {
            Some(w) => (w.outcome, w.scorer_ids.clone(), w.bases_after.clone()),
            None => (outcome, transition.scorer_ids.clone(), transition.next.clone()),
        };

        let unearned_play = matches!(outcome, Outcome::ReachedOnError | Outcome::CatcherInterference);
        let unearned =
            scorers.iter().filter(|id| unearned_play || self.reached_on_error.contains(*id)).count() as u8;
        let runs = RunsScored { earned: scorers.len() as u8 - unearned, unearned };
        if outcome == Outcome::ReachedOnError && bases_after.contains(&batter_id) {
            self.reached_on_error.insert(batter_id.clone());
        }

        // Score and box score
        self.state.add_runs(batting, runs.total() as u16);
        self.state.bases = bases_after.clone();
        self.state.plate_appearances += 1;
        *self.plate_appearances_by.entry(batter_id.clone()).or_default() += 1;
        self.credit_runs(batting, runs.total() as u16);
        if credited.is_hit() {
            self.team_box_mut(batting).hits += 1;
        }
        if outcome == Outcome::ReachedOnError {
            self.team_box_mut(fielding).errors += 1;
        }
        if transition.inning_over {
            let stranded = bases_before.occupied_count() - usize::from(transition.out_runner_id.is_some());
            self.team_box_mut(batting).left_on_base += stranded as u16;
        }
        self.charge_pitcher(fielding, &pitcher_id, credited, transition.outs_recorded, runs);

        let batting_roster = self.ctx.roster(batting);
        let batter_name = batting_roster.name_of(&batter_id);
        let mut description = format!("{} {}", batter_name, credited.label());
        match runs.total() {
            0 => {}
            1 => description.push_str(", 1 run scores"),
            n => description.push_str(&format!(", {n} runs score")),
        }
        if walk_off.is_some() {
            description.push_str(" (walk-off)");
        }

        tracing::debug!(
            inning = self.state.inning,
            half = ?self.state.half,
            batter = %batter_id,
            pitcher = %pitcher_id,
            outcome = %credited,
            runs = runs.total(),
            "plate appearance"
        );
        self.push_event(PlayEvent {
            sequence: 0,
            inning: self.state.inning,
            half: self.state.half,
            outs_before: bases_before.outs,
            outcome: Some(credited),
            batter_id: Some(batter_id.clone()),
            batter_name: Some(batter_name),
            pitcher_id: Some(pitcher_id.clone()),
            pitcher_name: Some(self.ctx.roster(fielding).name_of(&pitcher_id)),
            runs,
            scorer_ids: scorers,
            bases_before,
            bases_after,
            away_score: self.state.away_score,
            home_score: self.state.home_score,
            description,
            flags: EventFlags { walk_off: walk_off.is_some(), ..EventFlags::default() },
        });
        self.state.lineup_mut(batting).advance_batter();

        if walk_off.is_some() || game_over(&self.state, regulation, false) {
            self.finish();
        } else if transition.inning_over {
            self.end_half_inning();
        }
        Ok(())
    }

    fn end_half_inning(&mut self) {
        let batting = self.state.batting_side();
        self.credit_runs(batting, 0);
        if self.state.half == Half::Bottom {
            self.state.home_batted_this_inning = true;
        }
        let description = format!(
            "End of the {} of the {}: {} {}, {} {}",
            half_label(self.state.half),
            self.state.inning,
            self.ctx.away.team_id,
            self.state.away_score,
            self.ctx.home.team_id,
            self.state.home_score,
        );
        self.push_marker(description, EventFlags { summary: true, ..EventFlags::default() }, None);

        self.state.bases = BaserunningState::empty();
        self.reached_on_error.clear();
        if game_over(&self.state, self.ctx.regulation_innings(), true) {
            self.finish();
            return;
        }

        match self.state.half {
            Half::Top => self.state.half = Half::Bottom,
            Half::Bottom => {
                self.state.half = Half::Top;
                self.state.inning += 1;
                self.state.home_batted_this_inning = false;
            }
        }

        let fielding = self.state.fielding_side();
        if self.needs_pitcher[fielding.index()] {
            self.bring_in_pending_pitcher(fielding);
        }
        self.run_audit(fielding);
    }

    fn finish(&mut self) {
        if self.state.complete {
            return;
        }
        self.state.complete = true;
        self.box_score.pitchers = self.pitcher_lines();
        tracing::info!(
            away = %self.ctx.away.team_id,
            home = %self.ctx.home.team_id,
            away_score = self.state.away_score,
            home_score = self.state.home_score,
            innings = self.state.inning,
            plate_appearances = self.state.plate_appearances,
            truncated = self.truncated,
            "game complete"
        );
    }

    // ========== Managerial actions ==========

    fn manage_pitcher(&mut self, side: TeamSide) {
        let situation = Situation::from_state(&self.state, side, self.ctx.regulation_innings());
        let bullpen = &self.bullpens[side.index()];
        let current = &self.state.lineup(side).current_pitcher;
        let Some(role) = bullpen.get(current) else {
            return;
        };
        let decision =
            manager::should_pull_pitcher(&situation, role, bullpen, &mut self.rng, &self.era, &self.ctx.config.manager);
        if let PullDecision::Pull(reason) = decision {
            self.change_pitcher(side, &situation, Some(reason));
        }
    }

    fn bring_in_pending_pitcher(&mut self, side: TeamSide) {
        let situation = Situation::from_state(&self.state, side, self.ctx.regulation_innings());
        self.change_pitcher(side, &situation, None);
        self.needs_pitcher[side.index()] = false;
    }

    /// Replace the current pitcher. `reason` is `None` when the previous
    /// pitcher already left for a pinch-hitter.
    fn change_pitcher(&mut self, side: TeamSide, situation: &Situation, reason: Option<PullReason>) {
        let i = side.index();
        let roster = self.ctx.roster(side);
        let outgoing = self.state.lineup(side).current_pitcher.clone();
        let Some(incoming) = manager::select_reliever(
            situation,
            &self.bullpens[i],
            &outgoing,
            &self.removed,
            &self.ctx.config.manager,
        ) else {
            self.warn(
                WarningKind::NoRelieverAvailable,
                format!("{} has no reliever left to replace {}", roster.team_id, roster.name_of(&outgoing)),
            );
            return;
        };
        if incoming == outgoing || self.removed.contains(&incoming) {
            self.warn(
                WarningKind::SkippedIllegalSubstitution,
                format!("refused to bring {incoming} back into the game"),
            );
            return;
        }
        if self.state.lineup(side).contains(&incoming) {
            self.warn(
                WarningKind::SkippedIllegalSubstitution,
                format!("refused to move {incoming} from the batting order to the mound"),
            );
            return;
        }

        if self.bullpens[i].get(&outgoing).is_some_and(|p| p.is_active()) {
            if let Err(e) = self.bullpens[i].remove(&outgoing) {
                self.warn(WarningKind::SkippedIllegalSubstitution, e.to_string());
                return;
            }
        }
        if let Err(e) = self.bullpens[i].enter(&incoming, self.state.inning, true) {
            self.warn(WarningKind::SkippedIllegalSubstitution, e.to_string());
            return;
        }
        self.removed.insert(outgoing.clone());
        self.mid_game_relievers.insert(incoming.clone());
        self.pitcher_order.push((side, incoming.clone()));

        let lineup = self.state.lineup_mut(side);
        lineup.current_pitcher = incoming.clone();
        if !lineup.dh_in_effect {
            if let Some(slot) = lineup.slot_of(&outgoing) {
                if lineup.slots[slot].position == Position::Pitcher {
                    lineup.slots[slot].player_id = incoming.clone();
                }
            }
        }

        let mut description =
            format!("Pitching change: {} replaces {}", roster.name_of(&incoming), roster.name_of(&outgoing));
        if let Some(reason) = reason {
            description.push_str(&format!(" ({reason:?})"));
        }
        tracing::debug!(team = %roster.team_id, %incoming, %outgoing, ?reason, "pitching change");
        self.push_marker(
            description,
            EventFlags { pitching_change: true, ..EventFlags::default() },
            Some((side, incoming)),
        );
    }

    fn manage_pinch_hit(&mut self, side: TeamSide) {
        let i = side.index();
        let opposing_pitcher = &self.state.lineup(side.opponent()).current_pitcher;
        let throws = self
            .ctx
            .roster(side.opponent())
            .player(opposing_pitcher)
            .map_or(Handedness::Right, |p| p.throws.throwing_hand());
        let req = PinchHitRequest {
            lineup: self.state.lineup(side),
            roster: self.ctx.roster(side),
            bench: &self.bench[i],
            bullpen: &self.bullpens[i],
            mid_game_relievers: &self.mid_game_relievers,
            opposing_pitcher_throws: throws,
            pitcher_batting: self.ctx.season.norms.pitcher_batting(),
            situation: Situation::from_state(&self.state, side, self.ctx.regulation_innings()),
            pinch_hits_per_game: self.ctx.season.norms.pinch_hits_per_game,
        };
        let required = manager::pinch_hit_required(&req);
        let decision = manager::consider_pinch_hit(&req, &self.ctx.config.manager, &mut self.rng);

        match decision {
            Some(d) => self.apply_pinch_hit(side, d),
            None if required => {
                let team = self.ctx.roster(side).team_id.clone();
                self.warn(WarningKind::EmptyPinchHitPool, format!("{team} has no bench bat for the pitcher's spot"));
            }
            None => {}
        }
    }

    fn apply_pinch_hit(&mut self, side: TeamSide, decision: PinchHitDecision) {
        let i = side.index();
        let PinchHitDecision { slot, replaced, pinch_hitter, reason, .. } = decision;
        if pinch_hitter == replaced
            || self.removed.contains(&pinch_hitter)
            || self.state.lineup(side).contains(&pinch_hitter)
        {
            self.warn(
                WarningKind::SkippedIllegalSubstitution,
                format!("refused pinch-hitter {pinch_hitter} for {replaced}"),
            );
            return;
        }

        let lineup = self.state.lineup_mut(side);
        let placeholder = manager::pinch_hit_slot(&lineup.slots[slot], pinch_hitter.clone());
        lineup.slots[slot] = placeholder;
        let was_pitcher = !lineup.dh_in_effect && replaced == lineup.current_pitcher;

        self.removed.insert(replaced.clone());
        self.used_pinch_hitters.insert(pinch_hitter.clone());
        self.bench[i].retain(|id| id != &pinch_hitter);
        if was_pitcher {
            if let Err(e) = self.bullpens[i].remove(&replaced) {
                self.warn(WarningKind::SkippedIllegalSubstitution, e.to_string());
            }
            self.needs_pitcher[i] = true;
        }

        let roster = self.ctx.roster(side);
        let mut description =
            format!("Pinch-hitter {} bats for {}", roster.name_of(&pinch_hitter), roster.name_of(&replaced));
        if reason == PinchHitReason::ReliefPitcherDue {
            description.push_str(" (pitcher's spot)");
        }
        tracing::debug!(team = %roster.team_id, %pinch_hitter, %replaced, ?reason, "pinch hit");
        self.push_marker(description, EventFlags { pinch_hit: true, ..EventFlags::default() }, None);
    }

    fn run_audit(&mut self, side: TeamSide) {
        let i = side.index();
        let roster = self.ctx.roster(side);
        let bench: Vec<PlayerId> = self.bench[i].iter().filter(|id| !self.removed.contains(*id)).cloned().collect();
        let outcome = manager::audit_lineup(
            self.state.lineup_mut(side),
            roster,
            &bench,
            &self.ctx.config.manager,
            &mut self.rng,
        );
        if !outcome.changed() {
            return;
        }

        self.removed.extend(outcome.removed.iter().cloned());
        self.bench[i].retain(|id| !outcome.entered.contains(id) && !outcome.removed.contains(id));
        let description = outcome
            .resolutions
            .iter()
            .map(|r| describe_resolution(roster, r))
            .collect::<Vec<_>>()
            .join("; ");
        tracing::debug!(team = %roster.team_id, changes = outcome.resolutions.len(), "lineup audit");
        self.push_marker(description, EventFlags { lineup: true, ..EventFlags::default() }, None);

        if !outcome.violations.is_empty() {
            let list = outcome.violations.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
            self.warn(WarningKind::LineupRepairFailed, format!("{} lineup kept with: {list}", roster.team_id));
        }
    }

    // ========== Bookkeeping ==========

    fn charge_pitcher(&mut self, side: TeamSide, pitcher: &PlayerId, outcome: Outcome, outs: u8, runs: RunsScored) {
        let bullpen = &mut self.bullpens[side.index()];
        let Some(role) = bullpen.get(pitcher) else {
            return;
        };
        let fatigue_bfp = match role.role {
            PitcherRoleKind::Starter => self.era.thresholds.likely_bfp as f64,
            _ => manager::pitching::typical_relief_bfp(role, &self.era, &self.ctx.config.manager),
        };
        if let Some(role) = bullpen.get_mut(pitcher) {
            role.record_plate_appearance(outcome, outs, runs.total(), runs.earned, fatigue_bfp);
        }
    }

    fn team_box_mut(&mut self, side: TeamSide) -> &mut TeamBox {
        match side {
            TeamSide::Away => &mut self.box_score.away,
            TeamSide::Home => &mut self.box_score.home,
        }
    }

    fn credit_runs(&mut self, side: TeamSide, runs: u16) {
        let inning = self.state.inning as usize;
        let team = self.team_box_mut(side);
        if team.runs_by_inning.len() < inning {
            team.runs_by_inning.resize(inning, 0);
        }
        team.runs_by_inning[inning - 1] += runs;
        team.runs += runs;
    }

    fn pitcher_lines(&self) -> Vec<PitcherLine> {
        self.pitcher_order
            .iter()
            .filter_map(|(side, id)| {
                let role = self.bullpens[side.index()].get(id)?;
                Some(PitcherLine {
                    team_id: self.ctx.roster(*side).team_id.clone(),
                    pitcher_id: id.clone(),
                    name: role.name.clone(),
                    outs_recorded: role.outs_recorded,
                    batters_faced: role.batters_faced,
                    hits: role.hits_allowed,
                    walks: role.walks_allowed,
                    runs: role.runs_allowed,
                    earned_runs: role.earned_runs_allowed,
                })
            })
            .collect()
    }

    fn warn(&mut self, kind: WarningKind, message: String) {
        tracing::warn!(inning = self.state.inning, half = ?self.state.half, ?kind, "{message}");
        self.warnings.push(GameWarning { kind, inning: self.state.inning, half: self.state.half, message });
    }

    fn push_event(&mut self, mut event: PlayEvent) {
        event.sequence = self.sequence;
        self.sequence += 1;
        self.state.push_play(event);
    }

    /// Non plate-appearance entry (lineup, substitution, summary).
    fn push_marker(&mut self, description: String, flags: EventFlags, pitcher: Option<(TeamSide, PlayerId)>) {
        let (pitcher_id, pitcher_name) = match pitcher {
            Some((side, id)) => {
                let name = self.ctx.roster(side).name_of(&id);
                (Some(id), Some(name))
            }
            None => (None, None),
        };
        self.push_event(PlayEvent {
            sequence: 0,
            inning: self.state.inning,
            half: self.state.half,
            outs_before: self.state.bases.outs,
            outcome: None,
            batter_id: None,
            batter_name: None,
            pitcher_id,
            pitcher_name,
            runs: RunsScored::default(),
            scorer_ids: Vec::new(),
            bases_before: self.state.bases.clone(),
            bases_after: self.state.bases.clone(),
            away_score: self.state.away_score,
            home_score: self.state.home_score,
            description,
            flags,
        });
    }

    fn lineup_card(&self, side: TeamSide) -> String {
        let roster = self.ctx.roster(side);
        let lineup = self.state.lineup(side);
        let order = lineup
            .slots
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {} {}", i + 1, roster.name_of(&s.player_id), s.position))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} lineup: {order}; SP {}", roster.team_id, roster.name_of(&lineup.current_pitcher))
    }

    // ========== Outputs ==========

    pub fn result(&self) -> GameResult {
        let mut box_score = self.box_score.clone();
        if box_score.pitchers.is_empty() {
            box_score.pitchers = self.pitcher_lines();
        }
        GameResult {
            away_team: self.ctx.away.team_id.clone(),
            home_team: self.ctx.home.team_id.clone(),
            plays: self.state.plays_chronological().cloned().collect(),
            box_score,
            final_score: FinalScore { away: self.state.away_score, home: self.state.home_score },
            innings: self.state.inning,
            warnings: self.warnings.clone(),
            plate_appearances: self.state.plate_appearances,
            truncated: self.truncated,
        }
    }

    /// Season usage produced by this game, for the usage tracker.
    pub fn usage(&self) -> GameUsage {
        let mut players: BTreeMap<PlayerId, UsageRecord> = BTreeMap::new();
        for (id, &pa) in &self.plate_appearances_by {
            players.entry(id.clone()).or_default().plate_appearances += pa;
        }
        for starter in &self.starters {
            players.entry(starter.clone()).or_default().games_started += 1;
        }
        for bullpen in &self.bullpens {
            for role in bullpen.all().filter(|r| r.batters_faced > 0) {
                players.entry(role.pitcher_id.clone()).or_default().batters_faced += role.batters_faced;
            }
        }
        GameUsage { away_team: self.ctx.away.team_id.clone(), home_team: self.ctx.home.team_id.clone(), players }
    }
}

fn describe_resolution(roster: &TeamRoster, resolution: &AuditResolution) -> String {
    match resolution {
        AuditResolution::StaysIn { player, position } => {
            format!("{} stays in at {position}", roster.name_of(player))
        }
        AuditResolution::Realigned { player, position, partner, partner_position } => format!(
            "{} to {position}, {} moves to {partner_position}",
            roster.name_of(player),
            roster.name_of(partner)
        ),
        AuditResolution::DefensiveReplacement { pinch_hitter, replacement, position } => format!(
            "{} replaces {} at {position}",
            roster.name_of(replacement),
            roster.name_of(pinch_hitter)
        ),
        AuditResolution::PitcherTakesSlot { pinch_hitter, pitcher } => format!(
            "{} takes the batting spot of {}",
            roster.name_of(pitcher),
            roster.name_of(pinch_hitter)
        ),
        AuditResolution::DoubleSwitch { pinch_hitter, position, pitcher, pitcher_slot, replaced } => format!(
            "Double switch: {} to {position}, {} bats {} replacing {}",
            roster.name_of(pinch_hitter),
            roster.name_of(pitcher),
            pitcher_slot + 1,
            roster.name_of(replaced)
        ),
        AuditResolution::PitcherSlotRepaired { previous, pitcher } => format!(
            "{} takes the pitcher's spot from {}",
            roster.name_of(pitcher),
            roster.name_of(previous)
        ),
        AuditResolution::Unresolved { player, position } => {
            format!("{} stays in out of position at {position}", roster.name_of(player))
        }
    }
}
