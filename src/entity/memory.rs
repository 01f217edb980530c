//! Per-agent episodic memory store
//!
//! A bounded list of significance-scored recollections. When full, the least
//! significant entries are evicted first. Significance decays with age but
//! never drops below [`SIGNIFICANCE_FLOOR`].

use serde::{Deserialize, Serialize};

use crate::core::types::{Tick, Vec2};

pub const MAX_MEMORIES: usize = 100;
pub const DEFAULT_SIGNIFICANCE: f32 = 1.0;
pub const SIGNIFICANCE_FLOOR: f32 = 0.01;
/// Fraction of significance lost per tick of age
pub const DECAY_RATE: f32 = 0.001;
/// Default result count for recall queries
pub const DEFAULT_RECALL: usize = 5;

/// A single recollection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// What was remembered: "food", "shelter", "npc", "danger", ...
    pub category: String,
    pub location: Vec2,
    pub timestamp: Tick,
    /// Retention priority, always >= SIGNIFICANCE_FLOOR
    pub significance: f32,
}

impl MemoryEntry {
    pub fn new(category: impl Into<String>, location: Vec2, timestamp: Tick, significance: f32) -> Self {
        Self {
            category: category.into(),
            location,
            timestamp,
            significance: significance.max(SIGNIFICANCE_FLOOR),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    entries: Vec<MemoryEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a memory, evicting the least significant when over capacity
    pub fn add_memory(&mut self, category: &str, location: Vec2, tick: Tick, significance: f32) {
        self.entries.push(MemoryEntry::new(category, location, tick, significance));

        if self.entries.len() > MAX_MEMORIES {
            // Stable sort: among equal significance the older entry survives
            self.entries
                .sort_by(|a, b| b.significance.total_cmp(&a.significance));
            self.entries.truncate(MAX_MEMORIES);
        }
    }

    /// Entries of one category, most significant first
    pub fn recall(&self, category: &str, max_results: usize) -> Vec<MemoryEntry> {
        let mut matches: Vec<MemoryEntry> = self
            .entries
            .iter()
            .filter(|m| m.category == category)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.significance.total_cmp(&a.significance));
        matches.truncate(max_results);
        matches
    }

    /// Entries within `radius` of `position`, nearest first
    pub fn recall_nearby(&self, position: Vec2, radius: f32, max_results: usize) -> Vec<MemoryEntry> {
        let mut matches: Vec<(f32, &MemoryEntry)> = self
            .entries
            .iter()
            .map(|m| (m.location.distance(&position), m))
            .filter(|(dist, _)| *dist <= radius)
            .collect();
        matches.sort_by(|a, b| a.0.total_cmp(&b.0));
        matches
            .into_iter()
            .take(max_results)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Age-scaled decay: `significance *= max(0, 1 - rate * age)`, floored
    pub fn decay(&mut self, current_tick: Tick) {
        for entry in &mut self.entries {
            let age = current_tick.saturating_sub(entry.timestamp) as f32;
            let factor = (1.0 - DECAY_RATE * age).max(0.0);
            entry.significance = (entry.significance * factor).max(SIGNIFICANCE_FLOOR);
        }
    }

    /// Drop every entry of a category at a location (e.g. a depleted food source)
    pub fn forget(&mut self, category: &str, location: Vec2) {
        self.entries
            .retain(|m| !(m.category == category && m.location.distance(&location) < 0.5));
    }

    /// Categories of memories still significant enough to surface in perception
    pub fn salient_categories(&self, threshold: f32) -> Vec<String> {
        let mut categories: Vec<String> = self
            .entries
            .iter()
            .filter(|m| m.significance > threshold)
            .map(|m| m.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    pub fn all(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
