//! Decision engines
//!
//! Two interchangeable strategies sit behind [`Brain`]: a rule-based need
//! prioritizer and a learned-scoring engine with an emotional feedback loop.
//! Debug views go through [`Brain::introspect`] instead of asking which
//! concrete type is behind the trait object.

pub mod learned;
pub mod rule_based;

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::actions::{Action, Interaction, Outcome};
use crate::core::error::Result;
use crate::core::random::SimRng;
use crate::core::types::{Tick, Vec2};
use crate::entity::emotion::EmotionalState;
use crate::entity::memory::MemoryStore;
use crate::simulation::perception::Perception;
use crate::world::SpatialQuery;

pub use learned::LearnedBrain;
pub use rule_based::RuleBasedBrain;

/// What a brain may consult while deciding
pub struct DecisionContext<'a> {
    pub world: &'a dyn SpatialQuery,
    /// The owning agent's memory store
    pub memory: &'a mut MemoryStore,
    pub tick: Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrainKind {
    RuleBased,
    Learned,
}

impl BrainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrainKind::RuleBased => "rule_based",
            BrainKind::Learned => "learned",
        }
    }
}

/// Debug view of a brain's internals
///
/// Rule-based brains fill only `kind`; the optional fields stay empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrainSnapshot {
    pub kind: BrainKind,
    pub emotion: Option<EmotionalState>,
    pub action_probs: Option<Vec<f32>>,
    pub buffered_memories: usize,
    pub replay_len: usize,
    /// Average reward over the replay buffer
    pub mean_reward: Option<f32>,
    pub scorer_loaded: bool,
}

impl BrainSnapshot {
    pub fn neutral(kind: BrainKind) -> Self {
        Self {
            kind,
            emotion: None,
            action_probs: None,
            buffered_memories: 0,
            replay_len: 0,
            mean_reward: None,
            scorer_loaded: false,
        }
    }
}

/// Decision-making contract shared by every strategy
pub trait Brain {
    fn kind(&self) -> BrainKind;

    /// Choose the next action. Never fails; nothing-found cases degrade to Explore.
    fn decide(&mut self, perception: &Perception, ctx: &mut DecisionContext<'_>) -> Action;

    /// Feedback after the chosen action was executed
    fn on_outcome(&mut self, outcome: &Outcome, tick: Tick);

    /// Social signal that did not come from the brain's own action (e.g. a meeting)
    fn observe_interaction(&mut self, _interaction: &Interaction, _tick: Tick) {}

    /// Periodic housekeeping such as memory decay
    fn maintain(&mut self, _tick: Tick) {}

    fn introspect(&self) -> BrainSnapshot;

    /// Persist internal state; stateless brains have nothing to write
    fn save_state(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Attempts at finding a walkable exploration target
pub const EXPLORE_ATTEMPTS: usize = 10;

/// Random walkable point in the annulus `[radius/2, radius]` around `origin`
///
/// Falls back to `origin` itself when every attempt lands on blocked terrain.
pub fn random_walkable_target(
    rng: &mut SimRng,
    world: &dyn SpatialQuery,
    origin: Vec2,
    radius: f32,
) -> Vec2 {
    for _ in 0..EXPLORE_ATTEMPTS {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let r = rng.gen_range(radius * 0.5..=radius);
        let target = Vec2::new(origin.x + angle.cos() * r, origin.y + angle.sin() * r);
        // Negative coordinates truncate toward zero, so reject them explicitly
        if target.x >= 0.0 && target.y >= 0.0 && world.is_walkable(target.cell()) {
            return target;
        }
    }
    origin
}
