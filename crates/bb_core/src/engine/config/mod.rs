//! # Simulation Configuration
//!
//! Every tuning constant the engine consults, grouped by concern.
//!
//! ```rust
//! use bb_core::engine::config::SimConfig;
//!
//! let config = SimConfig::default();
//! let test = SimConfig::deterministic_test();
//! assert!(config.validate().is_ok());
//! assert!(test.validate().is_ok());
//! ```
//!
//! The engine does no file or environment access; callers read a JSON or
//! YAML document themselves and hand the text to [`SimConfig::from_json`] or
//! [`SimConfig::from_yaml`].

mod lineup_config;
mod manager_config;
mod rate_config;
mod usage_config;

pub use lineup_config::LineupConfig;
pub use manager_config::{EraPullThresholds, ManagerConfig};
pub use rate_config::{BlendFormula, RateConfig};
pub use usage_config::UsageConfig;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Plate appearances after which a game is force-completed (default: 500)
    pub max_plate_appearances: u32,
    /// Innings before extra innings (default: 9)
    pub regulation_innings: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { max_plate_appearances: 500, regulation_innings: 9 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimConfig {
    #[serde(default)]
    pub rates: RateConfig,
    #[serde(default)]
    pub usage: UsageConfig,
    #[serde(default)]
    pub lineup: LineupConfig,
    #[serde(default)]
    pub manager: ManagerConfig,
    #[serde(default)]
    pub game: GameConfig,
}

impl SimConfig {
    /// Fewer random lineup attempts and no double switches, so tests hit the
    /// deterministic paths quickly.
    pub fn deterministic_test() -> Self {
        let mut cfg = Self::default();
        cfg.lineup.max_attempts = 5;
        cfg.manager.double_switch_rate = 0.0;
        cfg
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        let bad = |msg: &str| Err(SimError::Config(msg.to_string()));

        if !(self.rates.sum_tolerance > 0.0 && self.rates.sum_tolerance < 1.0) {
            return bad("rates.sum_tolerance must be in (0, 1)");
        }
        if !(self.rates.epsilon > 0.0 && self.rates.epsilon < 0.01) {
            return bad("rates.epsilon must be in (0, 0.01)");
        }

        let u = &self.usage;
        if !(u.soft_threshold <= u.steep_threshold && u.steep_threshold < u.hard_cap) {
            return bad("usage thresholds must satisfy soft <= steep < hard_cap");
        }
        if !(0.0 < u.hard_cap_floor && u.hard_cap_floor <= u.steep_floor && u.steep_floor <= 1.0) {
            return bad("usage floors must satisfy 0 < hard_cap_floor <= steep_floor <= 1");
        }
        if !(u.underuse_threshold > 0.0 && u.underuse_threshold <= 1.0) || u.underuse_max_boost < 1.0 {
            return bad("usage underuse settings out of range");
        }

        if self.lineup.max_attempts == 0 {
            return bad("lineup.max_attempts must be positive");
        }
        if !(0.0..=1.0).contains(&self.lineup.starter_gs_rate_floor) {
            return bad("lineup.starter_gs_rate_floor must be in [0, 1]");
        }

        let m = &self.manager;
        if m.era_pull_thresholds.is_empty() {
            return bad("manager.era_pull_thresholds must not be empty");
        }
        if m.era_pull_thresholds.iter().any(|e| !e.thresholds.is_ordered()) {
            return bad("manager.era_pull_thresholds entries must be ordered consider < likely <= hard");
        }
        if !m.era_pull_thresholds.windows(2).all(|w| w[0].from_year < w[1].from_year) {
            return bad("manager.era_pull_thresholds must be sorted by from_year");
        }
        if !(0.0..=1.0).contains(&m.double_switch_rate) {
            return bad("manager.double_switch_rate must be in [0, 1]");
        }
        if !(0.0..1.0).contains(&m.reliever_band_fraction) {
            return bad("manager.reliever_band_fraction must be in [0, 1)");
        }
        if m.team_pa_per_game <= 0.0 || m.reliever_norm_cap_factor < 1.0 {
            return bad("manager per-game norms out of range");
        }

        if self.game.max_plate_appearances < 54 {
            return bad("game.max_plate_appearances must allow a full game");
        }
        if self.game.regulation_innings == 0 {
            return bad("game.regulation_innings must be positive");
        }
        Ok(())
    }
}

// ========== Tests ==========

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = SimConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.game.max_plate_appearances, 500);
        assert_eq!(cfg.rates.blend, BlendFormula::OddsRatio);
        assert!((cfg.usage.hard_cap - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_preset() {
        let cfg = SimConfig::deterministic_test();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.manager.double_switch_rate, 0.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg = SimConfig::from_json(r#"{"rates": {"sum_tolerance": 0.1, "epsilon": 0.0001, "blend": "log5"}}"#)
            .unwrap();
        assert_eq!(cfg.rates.blend, BlendFormula::Log5);
        assert_eq!(cfg.lineup.max_attempts, 25);
    }

    #[test]
    fn test_validate_rejects_unordered_usage() {
        let mut cfg = SimConfig::default();
        cfg.usage.steep_threshold = 2.0;
        assert!(matches!(cfg.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let cfg = SimConfig::from_yaml("game:\n  max_plate_appearances: 300\n  regulation_innings: 7\n").unwrap();
        assert_eq!(cfg.game.regulation_innings, 7);
        assert_eq!(cfg.game.max_plate_appearances, 300);
        assert_eq!(cfg.rates.blend, BlendFormula::OddsRatio);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_malformed_yaml_is_a_config_error() {
        assert!(SimConfig::from_yaml("game: [not, a, map]").is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let cfg = SimConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let parsed = SimConfig::from_json(&json).unwrap();
        assert_eq!(parsed.manager.era_pull_thresholds, cfg.manager.era_pull_thresholds);
    }
}
