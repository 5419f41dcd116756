//! Base/out state for one half-inning.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::player::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Base {
    First,
    Second,
    Third,
}

impl Base {
    /// Lead runner first.
    pub const LEAD_FIRST: [Base; 3] = [Base::Third, Base::Second, Base::First];

    pub fn next(self) -> Option<Base> {
        match self {
            Base::First => Some(Base::Second),
            Base::Second => Some(Base::Third),
            Base::Third => None,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Base::First => 0,
            Base::Second => 1,
            Base::Third => 2,
        }
    }
}

/// Outs in the current half-inning plus the runner (if any) on each base.
///
/// Invariants: `outs <= 2` between plays and no player occupies two bases.
/// Outs only return to zero at a half-inning boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct BaserunningState {
    pub outs: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third: Option<PlayerId>,
}

impl BaserunningState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_outs(outs: u8) -> Self {
        Self { outs, ..Self::default() }
    }

    pub fn runner(&self, base: Base) -> Option<&PlayerId> {
        match base {
            Base::First => self.first.as_ref(),
            Base::Second => self.second.as_ref(),
            Base::Third => self.third.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, base: Base) -> &mut Option<PlayerId> {
        match base {
            Base::First => &mut self.first,
            Base::Second => &mut self.second,
            Base::Third => &mut self.third,
        }
    }

    #[inline]
    pub fn is_occupied(&self, base: Base) -> bool {
        self.runner(base).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_none() && self.second.is_none() && self.third.is_none()
    }

    pub fn occupied_count(&self) -> usize {
        [&self.first, &self.second, &self.third].iter().filter(|r| r.is_some()).count()
    }

    pub fn bases_loaded(&self) -> bool {
        self.occupied_count() == 3
    }

    /// Runners in lead-first order with their base.
    pub fn runners(&self) -> Vec<(Base, &PlayerId)> {
        Base::LEAD_FIRST
            .iter()
            .filter_map(|&b| self.runner(b).map(|id| (b, id)))
            .collect()
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        [&self.first, &self.second, &self.third].iter().any(|r| r.as_ref() == Some(id))
    }

    /// Replace a runner id in place (pinch runners, restored lineups).
    pub fn replace_runner(&mut self, old: &PlayerId, new: PlayerId) -> bool {
        for base in Base::LEAD_FIRST {
            let slot = self.slot_mut(base);
            if slot.as_ref() == Some(old) {
                *slot = Some(new);
                return true;
            }
        }
        false
    }

    /// Check the structural invariants.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.outs > 2 {
            return Err(format!("outs out of range: {}", self.outs));
        }
        let ids: Vec<&PlayerId> =
            [&self.first, &self.second, &self.third].iter().filter_map(|r| r.as_ref()).collect();
        for (i, a) in ids.iter().enumerate() {
            if ids[i + 1..].contains(a) {
                return Err(format!("runner {} occupies more than one base", a));
            }
        }
        Ok(())
    }

    /// Compact occupancy string for descriptions: `"1-3"`, `"empty"`, `"loaded"`.
    pub fn occupancy_label(&self) -> String {
        if self.is_empty() {
            return "empty".to_string();
        }
        if self.bases_loaded() {
            return "loaded".to_string();
        }
        let mut parts = Vec::new();
        if self.first.is_some() {
            parts.push("1");
        }
        if self.second.is_some() {
            parts.push("2");
        }
        if self.third.is_some() {
            parts.push("3");
        }
        parts.join("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PlayerId {
        PlayerId::from(s)
    }

    #[test]
    fn test_runners_lead_first() {
        let state = BaserunningState {
            outs: 1,
            first: Some(id("a")),
            second: None,
            third: Some(id("c")),
        };
        let runners = state.runners();
        assert_eq!(runners[0], (Base::Third, &id("c")));
        assert_eq!(runners[1], (Base::First, &id("a")));
        assert_eq!(state.occupancy_label(), "1-3");
    }

    #[test]
    fn test_duplicate_runner_rejected() {
        let state = BaserunningState {
            outs: 0,
            first: Some(id("a")),
            second: Some(id("a")),
            third: None,
        };
        assert!(state.check_invariants().is_err());
        assert!(BaserunningState::with_outs(3).check_invariants().is_err());
        assert!(BaserunningState::with_outs(2).check_invariants().is_ok());
    }

    #[test]
    fn test_replace_runner() {
        let mut state = BaserunningState { outs: 0, first: None, second: Some(id("slow")), third: None };
        assert!(state.replace_runner(&id("slow"), id("fast")));
        assert_eq!(state.second, Some(id("fast")));
        assert!(!state.replace_runner(&id("nobody"), id("x")));
    }
}
