//! Learned-brain state documents
//!
//! One human-readable JSON document per agent:
//!
//! ```json
//! {
//!   "owner": 3,
//!   "emotional_state": { "valence": 0.1, "arousal": -0.2, "dominance": 0.0 },
//!   "memory_buffer": [ { "memory": { ... }, "embedding": [ ... ], "attention": 0.02 } ],
//!   "relationships": [ { "peer": 5, "embedding": [ ... ], "trust": 0.1, ... } ],
//!   "replay_buffer_size": 42
//! }
//! ```
//!
//! Loading is a best-effort merge: every section (and every list element) is
//! parsed on its own, so a damaged document still restores whatever is
//! readable. The [`LoadReport`] says what made it through.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::{Result, SimError};
use crate::core::types::EntityId;
use crate::decision::learned::episodic::EpisodicMemory;
use crate::entity::emotion::EmotionalState;
use crate::entity::relationships::RelationshipVector;

/// Borrowed view written by `save`
#[derive(Debug, Serialize)]
pub struct StateDocument<'a> {
    pub owner: EntityId,
    pub emotional_state: EmotionalState,
    pub memory_buffer: &'a [EpisodicMemory],
    pub relationships: Vec<&'a RelationshipVector>,
    pub replay_buffer_size: usize,
}

/// Whatever could be read back from a document
#[derive(Debug, Clone, Default)]
pub struct PartialState {
    pub owner: Option<EntityId>,
    /// Axes that were present; missing axes stay as they are in memory
    pub valence: Option<f32>,
    pub arousal: Option<f32>,
    pub dominance: Option<f32>,
    pub memories: Vec<EpisodicMemory>,
    pub relationships: Vec<RelationshipVector>,
    pub replay_buffer_size: Option<usize>,
    pub report: LoadReport,
}

/// Which sections a load restored
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub owner: Option<EntityId>,
    pub emotional_state: bool,
    pub memories: usize,
    pub memories_skipped: usize,
    pub relationships: usize,
    pub relationships_skipped: usize,
    pub replay_buffer_size: Option<usize>,
}

impl LoadReport {
    pub fn restored_anything(&self) -> bool {
        self.emotional_state || self.memories > 0 || self.relationships > 0
    }

    /// Every section present and nothing skipped
    pub fn is_complete(&self) -> bool {
        self.owner.is_some()
            && self.emotional_state
            && self.replay_buffer_size.is_some()
            && self.memories_skipped == 0
            && self.relationships_skipped == 0
    }
}

pub fn save(path: &Path, document: &StateDocument<'_>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a document section by section
///
/// Errors only when the file cannot be read or is not JSON at all.
pub fn load(path: &Path) -> Result<PartialState> {
    let content = std::fs::read_to_string(path)?;
    let root: Value = serde_json::from_str(&content)?;
    let Value::Object(root) = root else {
        return Err(SimError::Persistence(format!(
            "{} is not a JSON object",
            path.display()
        )));
    };

    let mut state = PartialState::default();

    state.owner = root
        .get("owner")
        .and_then(|v| serde_json::from_value::<EntityId>(v.clone()).ok());
    state.report.owner = state.owner;

    if let Some(Value::Object(emotion)) = root.get("emotional_state") {
        let axis = |name: &str| emotion.get(name).and_then(Value::as_f64).map(|v| v as f32);
        state.valence = axis("valence");
        state.arousal = axis("arousal");
        state.dominance = axis("dominance");
        state.report.emotional_state =
            state.valence.is_some() || state.arousal.is_some() || state.dominance.is_some();
    }

    if let Some(Value::Array(items)) = root.get("memory_buffer") {
        for item in items {
            match serde_json::from_value::<EpisodicMemory>(item.clone()) {
                Ok(memory) => state.memories.push(memory),
                Err(_) => state.report.memories_skipped += 1,
            }
        }
        state.report.memories = state.memories.len();
    }

    if let Some(Value::Array(items)) = root.get("relationships") {
        for item in items {
            match serde_json::from_value::<RelationshipVector>(item.clone()) {
                Ok(rel) => state.relationships.push(rel),
                Err(_) => state.report.relationships_skipped += 1,
            }
        }
        state.report.relationships = state.relationships.len();
    }

    state.replay_buffer_size = root
        .get("replay_buffer_size")
        .and_then(Value::as_u64)
        .map(|v| v as usize);
    state.report.replay_buffer_size = state.replay_buffer_size;

    Ok(state)
}
