//! Plain data types shared by every engine layer.

pub mod bases;
pub mod bullpen;
pub mod events;
pub mod game_state;
pub mod lineup;
pub mod outcome;
pub mod player;

pub use bases::{Base, BaserunningState};
pub use bullpen::{BullpenState, PitcherRole, PitcherRoleKind, PitcherStatus, ReliefSpecialty};
pub use events::{
    play_event_schema, BoxScore, EventFlags, GameWarning, PitcherLine, PlayEvent, RunsScored,
    TeamBox, WarningKind,
};
pub use game_state::{GameState, GameStatus, Half, TeamSide};
pub use lineup::{LineupSlot, LineupState, LineupViolation, PinchFor, LINEUP_SIZE};
pub use outcome::{EventRates, Outcome, OutcomeTable, ProbabilityDistribution, OUTCOME_COUNT};
pub use player::{
    BattingProfile, Handedness, PitchingProfile, PlayerId, Position, RosterPlayer, SplitRates,
};
