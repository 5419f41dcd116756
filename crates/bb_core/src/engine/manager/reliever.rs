//! Reliever selection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::Situation;
use crate::engine::config::ManagerConfig;
use crate::models::{BullpenState, PitcherRole, PitcherRoleKind, PlayerId, ReliefSpecialty};

/// Bullpen tiers in preference order for a situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliefTier {
    Closer,
    Setup,
    Long,
    Middle,
    /// Anyone still unused, starters included.
    Any,
}

impl ReliefTier {
    fn matches(self, role: &PitcherRole) -> bool {
        match self {
            ReliefTier::Closer => role.role == PitcherRoleKind::Closer,
            ReliefTier::Setup => role.specialty == Some(ReliefSpecialty::Setup),
            ReliefTier::Long => role.specialty == Some(ReliefSpecialty::Long),
            ReliefTier::Middle => {
                role.role == PitcherRoleKind::Reliever
                    && !matches!(role.specialty, Some(ReliefSpecialty::Setup) | Some(ReliefSpecialty::Long))
            }
            ReliefTier::Any => true,
        }
    }
}

/// Tier order for a situation.
pub fn preference(situation: &Situation, config: &ManagerConfig) -> Vec<ReliefTier> {
    use ReliefTier::*;
    if situation.is_blowout(config.blowout_margin) {
        // Closer and setup men are conserved
        vec![Long, Middle, Setup, Closer, Any]
    } else if situation.is_save_situation(config.save_max_lead) {
        vec![Closer, Setup, Middle, Long, Any]
    } else if situation.is_extra_innings() {
        vec![Closer, Setup, Middle, Long, Any]
    } else if situation.is_high_leverage(config.save_max_lead) {
        vec![Setup, Middle, Long, Closer, Any]
    } else {
        vec![Long, Middle, Setup, Closer, Any]
    }
}

/// Pick the next pitcher, or `None` when nobody eligible is left.
///
/// Only pitchers that have never appeared are candidates: the active pitcher,
/// `exclude`, and anyone in `removed` are skipped whatever their bullpen
/// status says. Within a tier the lowest season baserunner rate wins.
pub fn select_reliever(
    situation: &Situation,
    bullpen: &BullpenState,
    exclude: &PlayerId,
    removed: &BTreeSet<PlayerId>,
    config: &ManagerConfig,
) -> Option<PlayerId> {
    let candidates: Vec<&PitcherRole> = bullpen
        .available()
        .filter(|p| &p.pitcher_id != exclude && !removed.contains(&p.pitcher_id))
        .collect();

    for tier in preference(situation, config) {
        let best = candidates
            .iter()
            .filter(|p| tier.matches(p))
            .min_by(|a, b| {
                a.season_baserunner_rate
                    .total_cmp(&b.season_baserunner_rate)
                    .then_with(|| a.pitcher_id.cmp(&b.pitcher_id))
            });
        if let Some(role) = best {
            return Some(role.pitcher_id.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Half;

    fn situation(inning: u8, lead: i32) -> Situation {
        Situation { inning, half: Half::Bottom, outs: 0, bases_empty: true, lead, regulation_innings: 9 }
    }

    fn arm(id: &str, kind: PitcherRoleKind, specialty: Option<ReliefSpecialty>, br: f64) -> PitcherRole {
        let mut role = PitcherRole::new(PlayerId::from(id), id, kind);
        role.specialty = specialty;
        role.season_baserunner_rate = br;
        role
    }

    fn bullpen() -> BullpenState {
        let mut pen = BullpenState::new();
        let mut sp = arm("sp", PitcherRoleKind::Starter, None, 0.30);
        sp.activate(1, false).unwrap();
        pen.insert(sp);
        pen.insert(arm("cl", PitcherRoleKind::Closer, None, 0.26));
        pen.insert(arm("su", PitcherRoleKind::Reliever, Some(ReliefSpecialty::Setup), 0.28));
        pen.insert(arm("lr", PitcherRoleKind::Reliever, Some(ReliefSpecialty::Long), 0.33));
        pen.insert(arm("mr1", PitcherRoleKind::Reliever, Some(ReliefSpecialty::Middle), 0.31));
        pen.insert(arm("mr2", PitcherRoleKind::Reliever, Some(ReliefSpecialty::Middle), 0.29));
        pen
    }

    fn pick(s: Situation, pen: &BullpenState, removed: &BTreeSet<PlayerId>) -> Option<String> {
        select_reliever(&s, pen, &PlayerId::from("sp"), removed, &ManagerConfig::default())
            .map(|id| id.as_str().to_string())
    }

    #[test]
    fn test_tier_preferences() {
        let pen = bullpen();
        let none = BTreeSet::new();
        assert_eq!(pick(situation(9, 2), &pen, &none).as_deref(), Some("cl"));
        assert_eq!(pick(situation(8, -1), &pen, &none).as_deref(), Some("su"));
        assert_eq!(pick(situation(4, 0), &pen, &none).as_deref(), Some("lr"));
        assert_eq!(pick(situation(8, 7), &pen, &none).as_deref(), Some("lr"));
        assert_eq!(pick(situation(6, -1), &pen, &none).as_deref(), Some("lr"));
    }

    #[test]
    fn test_save_situation_falls_through_tiers() {
        let mut pen = bullpen();
        pen.enter(&PlayerId::from("cl"), 8, true).unwrap();
        pen.remove(&PlayerId::from("cl")).unwrap();
        let none = BTreeSet::new();
        assert_eq!(pick(situation(9, 1), &pen, &none).as_deref(), Some("su"));
    }

    #[test]
    fn test_removed_and_active_never_selected() {
        let mut pen = bullpen();
        let mut removed = BTreeSet::new();
        for _ in 0..5 {
            let Some(next) = pick(situation(9, 1), &pen, &removed) else {
                break;
            };
            let id = PlayerId::new(next.clone());
            assert!(!removed.contains(&id));
            assert_ne!(next, "sp");
            pen.enter(&id, 9, true).unwrap();
            pen.remove(&id).unwrap();
            removed.insert(id);
        }
        assert_eq!(pick(situation(9, 1), &pen, &removed), None);
    }

    #[test]
    fn test_removed_set_guards_even_if_status_is_stale() {
        let pen = bullpen();
        let removed = BTreeSet::from([PlayerId::from("cl")]);
        assert_eq!(pick(situation(9, 2), &pen, &removed).as_deref(), Some("su"));
    }
}
