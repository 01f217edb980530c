//! Embedded episodic buffer with attention
//!
//! Separate from the agent's memory store: every entry carries a fixed-size
//! embedding, and attention against the current perception decides which
//! old memories resurface.

use serde::{Deserialize, Serialize};

use crate::core::types::{Tick, Vec2};
use crate::entity::memory::{MemoryEntry, SIGNIFICANCE_FLOOR};

pub const EMBEDDING_DIM: usize = 32;
pub const MAX_BUFFER: usize = 50;
/// Flattened, zero-padded context fed to the scorer
pub const MEMORY_CONTEXT_DIM: usize = MAX_BUFFER * EMBEDDING_DIM;

/// Attention above which a faded memory resurfaces
pub const RESURFACE_ATTENTION: f32 = 0.3;
/// Only memories weaker than this can resurface
pub const RESURFACE_SIGNIFICANCE: f32 = 0.3;
pub const RESURFACE_BOOST: f32 = 0.5;
/// Ticks over which buffered memories fade to their minimum factor
pub const DECAY_HORIZON: f32 = 10_000.0;
pub const MIN_DECAY_FACTOR: f32 = 0.1;

// Embedding layout
const POS_X: usize = 0;
const POS_Y: usize = 1;
const SIGNIFICANCE: usize = 2;
const ATTENTION: usize = 3;

fn category_slot(category: &str) -> Option<usize> {
    match category {
        "food" => Some(4),
        "danger" => Some(5),
        "npc" => Some(6),
        "shelter" => Some(7),
        _ => None,
    }
}

/// Fixed embedding: normalized position, significance, category one-hot
pub fn embed(category: &str, location: Vec2, significance: f32, world_size: (f32, f32)) -> Vec<f32> {
    let mut embedding = vec![0.0; EMBEDDING_DIM];
    embedding[POS_X] = location.x / world_size.0.max(1.0);
    embedding[POS_Y] = location.y / world_size.1.max(1.0);
    embedding[SIGNIFICANCE] = significance;
    if let Some(slot) = category_slot(category) {
        embedding[slot] = 1.0;
    }
    embedding
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicMemory {
    pub memory: MemoryEntry,
    pub embedding: Vec<f32>,
    /// Last attention weight, recomputed on every query
    #[serde(default)]
    pub attention: f32,
}

#[derive(Debug, Clone, Default)]
pub struct EpisodicBuffer {
    entries: Vec<EpisodicMemory>,
}

impl EpisodicBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a memory
    ///
    /// A second sighting of the same category at the same cell refreshes the
    /// existing entry instead of duplicating it.
    pub fn add(&mut self, memory: MemoryEntry, embedding: Vec<f32>) {
        if let Some(existing) = self.entries.iter_mut().find(|e| {
            e.memory.category == memory.category && e.memory.location.cell() == memory.location.cell()
        }) {
            existing.memory.significance = existing.memory.significance.max(memory.significance);
            existing.memory.timestamp = existing.memory.timestamp.max(memory.timestamp);
            return;
        }

        self.entries.push(EpisodicMemory {
            memory,
            embedding,
            attention: 0.0,
        });

        if self.entries.len() > MAX_BUFFER {
            self.entries
                .sort_by(|a, b| b.memory.significance.total_cmp(&a.memory.significance));
            self.entries.truncate(MAX_BUFFER);
        }
    }

    /// Dot-product attention against `query`, softmax-normalized
    pub fn compute_attention(&mut self, query: &[f32]) {
        if self.entries.is_empty() {
            return;
        }

        for entry in &mut self.entries {
            let similarity: f32 = entry.embedding.iter().zip(query.iter()).map(|(e, q)| e * q).sum();
            entry.attention = similarity.max(0.0);
        }

        let max = self
            .entries
            .iter()
            .map(|e| e.attention)
            .fold(f32::NEG_INFINITY, f32::max);
        let mut sum = 0.0;
        for entry in &mut self.entries {
            entry.attention = (entry.attention - max).exp();
            sum += entry.attention;
        }
        if sum > 0.0 {
            for entry in &mut self.entries {
                entry.attention /= sum;
            }
        }
    }

    /// Boost faded memories that drew strong attention; returns how many resurfaced
    pub fn resurface(&mut self) -> usize {
        let mut count = 0;
        for entry in &mut self.entries {
            if entry.attention > RESURFACE_ATTENTION && entry.memory.significance < RESURFACE_SIGNIFICANCE {
                entry.memory.significance = (entry.memory.significance + RESURFACE_BOOST).min(1.0);
                count += 1;
            }
        }
        count
    }

    /// `significance *= max(0.1, 1 - age / 10000)`
    pub fn decay(&mut self, current_tick: Tick) {
        for entry in &mut self.entries {
            let age = current_tick.saturating_sub(entry.memory.timestamp) as f32;
            let factor = (1.0 - age / DECAY_HORIZON).max(MIN_DECAY_FACTOR);
            entry.memory.significance = (entry.memory.significance * factor).max(SIGNIFICANCE_FLOOR);
        }
    }

    /// Flattened embeddings with live significance and attention, zero-padded
    pub fn context(&self) -> Vec<f32> {
        let mut context = Vec::with_capacity(MEMORY_CONTEXT_DIM);
        for entry in self.entries.iter().take(MAX_BUFFER) {
            let mut embedding = entry.embedding.clone();
            embedding.resize(EMBEDDING_DIM, 0.0);
            embedding[SIGNIFICANCE] = entry.memory.significance;
            embedding[ATTENTION] = entry.attention;
            context.extend_from_slice(&embedding);
        }
        context.resize(MEMORY_CONTEXT_DIM, 0.0);
        context
    }

    /// Restore a persisted entry, bypassing dedup but honoring capacity
    pub fn restore(&mut self, entry: EpisodicMemory) {
        if self.entries.len() < MAX_BUFFER {
            self.entries.push(entry);
        }
    }

    pub fn entries(&self) -> &[EpisodicMemory] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
