use thiserror::Error;

use crate::models::lineup::LineupViolation;
use crate::models::PlayerId;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Rates for {owner} ({split}) sum to {sum:.4}, outside tolerance {tolerance}")]
    InvalidRates { owner: String, split: String, sum: f64, tolerance: f64 },

    #[error("Invalid probability {value} for {outcome} in {owner}")]
    InvalidProbability { owner: String, outcome: String, value: f64 },

    #[error("Distribution has no probability mass left to normalize")]
    EmptyDistribution,

    #[error("Roster for team {team} cannot field a lineup: {reason}")]
    InsufficientRoster { team: String, reason: String },

    #[error("Invalid lineup for team {team}: {violations:?}")]
    InvalidLineup { team: String, violations: Vec<LineupViolation> },

    #[error("No starting pitcher available for team {team}")]
    NoStartingPitcher { team: String },

    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("Unknown team {0}")]
    UnknownTeam(String),

    #[error("Invalid pitcher transition for {pitcher}: {reason}")]
    PitcherLifecycle { pitcher: PlayerId, reason: String },

    #[error("Invalid season data: {0}")]
    InvalidData(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Snapshot checksum mismatch")]
    ChecksumMismatch,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SimError {
    /// Whether the error must abort the enclosing game.
    ///
    /// Recoverable conditions (no reliever, empty pinch-hit pool) never reach
    /// this type; they are recorded as game warnings instead.
    pub fn is_fatal_to_game(&self) -> bool {
        match self {
            SimError::InvalidRates { .. }
            | SimError::InvalidProbability { .. }
            | SimError::EmptyDistribution
            | SimError::InsufficientRoster { .. }
            | SimError::InvalidLineup { .. }
            | SimError::NoStartingPitcher { .. }
            | SimError::UnknownPlayer(_)
            | SimError::UnknownTeam(_)
            | SimError::InvalidData(_) => true,
            SimError::PitcherLifecycle { .. } => false,
            SimError::Config(_)
            | SimError::Snapshot(_)
            | SimError::ChecksumMismatch
            | SimError::Json(_)
            | SimError::Yaml(_) => true,
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(SimError::EmptyDistribution.is_fatal_to_game());
        assert!(SimError::InsufficientRoster { team: "BOS".into(), reason: "no catcher".into() }
            .is_fatal_to_game());
        assert!(!SimError::PitcherLifecycle {
            pitcher: PlayerId::from("smitj001"),
            reason: "already removed".into()
        }
        .is_fatal_to_game());
    }

    #[test]
    fn test_display_includes_context() {
        let err = SimError::InvalidRates {
            owner: "ruthb101".into(),
            split: "vs RHP".into(),
            sum: 1.6,
            tolerance: 0.25,
        };
        let msg = err.to_string();
        assert!(msg.contains("ruthb101"));
        assert!(msg.contains("1.6000"));
    }
}
