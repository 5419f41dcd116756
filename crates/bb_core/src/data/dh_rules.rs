//! Designated-hitter availability by league and season.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhRule {
    pub league: String,
    pub from_year: u16,
    #[serde(default)]
    pub to_year: Option<u16>,
}

impl DhRule {
    fn covers(&self, league: &str, year: u16) -> bool {
        self.league.eq_ignore_ascii_case(league)
            && year >= self.from_year
            && self.to_year.map_or(true, |to| year <= to)
    }
}

/// League + year lookup table deciding whether the DH is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhRules {
    pub rules: Vec<DhRule>,
}

impl Default for DhRules {
    /// AL since 1973, NL in the shortened 2020 season and universally from 2022.
    fn default() -> Self {
        Self {
            rules: vec![
                DhRule { league: "AL".to_string(), from_year: 1973, to_year: None },
                DhRule { league: "NL".to_string(), from_year: 2020, to_year: Some(2020) },
                DhRule { league: "NL".to_string(), from_year: 2022, to_year: None },
            ],
        }
    }
}

impl DhRules {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The home team's league rule applies to the whole game.
    pub fn in_effect(&self, home_league: &str, year: u16) -> bool {
        self.rules.iter().any(|r| r.covers(home_league, year))
    }
}
