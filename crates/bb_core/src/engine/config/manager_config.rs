//! Managerial decision tuning

use serde::{Deserialize, Serialize};

use crate::data::PullThresholds;

/// Starter pull thresholds in effect from `from_year` on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraPullThresholds {
    pub from_year: u16,
    pub thresholds: PullThresholds,
}

const fn era(from_year: u16, consider: u32, likely: u32, hard: u32) -> EraPullThresholds {
    EraPullThresholds {
        from_year,
        thresholds: PullThresholds { consider_bfp: consider, likely_bfp: likely, hard_limit_bfp: hard },
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Sorted by `from_year` ascending.
    pub era_pull_thresholds: Vec<EraPullThresholds>,

    // === Starters ===
    /// Complete-game rate that marks a workhorse (default: 0.20)
    pub workhorse_cg_rate: f64,
    /// Extra batters a workhorse may face before each threshold (default: 4)
    pub workhorse_bonus_bfp: u32,
    /// Baserunners per BF considered a rough outing (default: 0.45)
    pub struggling_baserunner_rate: f64,
    /// Baserunners per BF considered a dominant outing (default: 0.22)
    pub cruising_baserunner_rate: f64,

    // === Relievers ===
    /// Cap on a reliever's typical BF, as a multiple of the season norm (default: 1.5)
    pub reliever_norm_cap_factor: f64,
    /// Half-width of the variance band, as a fraction of typical BF (default: 0.3)
    pub reliever_band_fraction: f64,

    // === Reliever selection ===
    /// Run margin that makes a game a blowout (default: 5)
    pub blowout_margin: i32,
    /// Largest lead that is still a save situation (default: 3)
    pub save_max_lead: i32,

    // === Pinch hitting ===
    /// Team plate appearances per game, spreads the season pinch-hit norm per PA (default: 38)
    pub team_pa_per_game: f64,
    /// OPS edge a bench bat needs over the scheduled batter (default: 0.05)
    pub pinch_hit_quality_margin: f64,
    /// Chance a pitcher-slot pinch-hitter stays in the game via double switch (default: 0.35)
    pub double_switch_rate: f64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            era_pull_thresholds: vec![
                era(1871, 34, 40, 48),
                era(1920, 31, 37, 44),
                era(1950, 29, 34, 41),
                era(1970, 28, 33, 39),
                era(1990, 25, 29, 34),
                era(2005, 23, 27, 31),
                era(2015, 20, 24, 28),
            ],
            workhorse_cg_rate: 0.20,
            workhorse_bonus_bfp: 4,
            struggling_baserunner_rate: 0.45,
            cruising_baserunner_rate: 0.22,
            reliever_norm_cap_factor: 1.5,
            reliever_band_fraction: 0.3,
            blowout_margin: 5,
            save_max_lead: 3,
            team_pa_per_game: 38.0,
            pinch_hit_quality_margin: 0.05,
            double_switch_rate: 0.35,
        }
    }
}

impl ManagerConfig {
    /// Thresholds for a season: the latest era starting at or before `year`.
    pub fn pull_thresholds_for(&self, year: u16) -> PullThresholds {
        self.era_pull_thresholds
            .iter()
            .filter(|e| e.from_year <= year)
            .max_by_key(|e| e.from_year)
            .or_else(|| self.era_pull_thresholds.first())
            .map(|e| e.thresholds)
            .unwrap_or(PullThresholds { consider_bfp: 25, likely_bfp: 29, hard_limit_bfp: 34 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_era_lookup() {
        let cfg = ManagerConfig::default();
        assert_eq!(cfg.pull_thresholds_for(1927).consider_bfp, 31);
        assert_eq!(cfg.pull_thresholds_for(1990).consider_bfp, 25);
        assert_eq!(cfg.pull_thresholds_for(2023).hard_limit_bfp, 28);
        // Before the first era: fall back to the oldest entry
        assert_eq!(cfg.pull_thresholds_for(1850).consider_bfp, 34);
    }

    #[test]
    fn test_default_eras_are_ordered() {
        let cfg = ManagerConfig::default();
        assert!(cfg.era_pull_thresholds.iter().all(|e| e.thresholds.is_ordered()));
        assert!(cfg.era_pull_thresholds.windows(2).all(|w| w[0].from_year < w[1].from_year));
    }
}
