//! Action definitions and outcomes

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Vec2};

/// Fixed action vocabulary; the discriminant is the scorer's output index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    #[default]
    Idle,
    Move,
    Forage,
    Eat,
    Rest,
    Explore,
    Socialize,
    BuildShelter,
    SeekShelter,
}

impl ActionKind {
    pub const COUNT: usize = 9;

    pub const ALL: [ActionKind; Self::COUNT] = [
        ActionKind::Idle,
        ActionKind::Move,
        ActionKind::Forage,
        ActionKind::Eat,
        ActionKind::Rest,
        ActionKind::Explore,
        ActionKind::Socialize,
        ActionKind::BuildShelter,
        ActionKind::SeekShelter,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Idle => "idle",
            ActionKind::Move => "move",
            ActionKind::Forage => "forage",
            ActionKind::Eat => "eat",
            ActionKind::Rest => "rest",
            ActionKind::Explore => "explore",
            ActionKind::Socialize => "socialize",
            ActionKind::BuildShelter => "build_shelter",
            ActionKind::SeekShelter => "seek_shelter",
        }
    }

    /// Actions that travel toward `target_position`
    pub fn is_movement(&self) -> bool {
        matches!(
            self,
            ActionKind::Move | ActionKind::Explore | ActionKind::SeekShelter | ActionKind::Forage
        )
    }
}

/// A decided action with optional targets
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub target_position: Option<Vec2>,
    pub target_entity: Option<EntityId>,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            target_position: None,
            target_entity: None,
        }
    }

    pub fn idle() -> Self {
        Self::new(ActionKind::Idle)
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.target_position = Some(pos);
        self
    }

    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.target_entity = Some(entity);
        self
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind.as_str())?;
        if let Some(pos) = self.target_position {
            write!(f, " -> ({:.1}, {:.1})", pos.x, pos.y)?;
        }
        if let Some(entity) = self.target_entity {
            write!(f, " @{}", entity)?;
        }
        Ok(())
    }
}

/// Social signal carried by an outcome, mirrored into relationship models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub peer: EntityId,
    pub category: String,
    pub valence: f32,
}

/// Result of executing an action
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Outcome {
    /// Signed change per need name; negative means the need was relieved
    pub needs_deltas: BTreeMap<String, f32>,
    /// Free-form tag such as `food_eaten` or `danger_storm`
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<Interaction>,
}

impl Outcome {
    pub fn with_event(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            ..Self::default()
        }
    }

    pub fn delta(&self, need: &str) -> f32 {
        self.needs_deltas.get(need).copied().unwrap_or(0.0)
    }
}
