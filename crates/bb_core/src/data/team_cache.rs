//! Explicitly owned team metadata cache.
//!
//! Callers create one per season (or share one across a season loop) and
//! clear it when switching datasets. There is no process-wide instance.

use std::collections::HashMap;

use super::TeamMeta;

#[derive(Debug, Clone, Default)]
pub struct TeamCache {
    entries: HashMap<(String, u16), TeamMeta>,
    initialized: bool,
}

impl TeamCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache contents.
    pub fn init<I>(&mut self, metas: I)
    where
        I: IntoIterator<Item = TeamMeta>,
    {
        self.entries.clear();
        for meta in metas {
            self.entries.insert((meta.team_id.clone(), meta.year), meta);
        }
        self.initialized = true;
    }

    pub fn insert(&mut self, meta: TeamMeta) {
        self.entries.insert((meta.team_id.clone(), meta.year), meta);
    }

    pub fn get(&self, team_id: &str, year: u16) -> Option<&TeamMeta> {
        self.entries.get(&(team_id.to_string(), year))
    }

    /// Display name, falling back to the team id.
    pub fn display_name(&self, team_id: &str, year: u16) -> String {
        self.get(team_id, year).map_or_else(|| team_id.to_string(), |m| m.name.clone())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.initialized = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
