//! Events emitted by the simulation tick
//!
//! Everything here is `Serialize` so the binary (or external training tooling)
//! can write one JSON line per event.

use serde::{Deserialize, Serialize};

use crate::actions::{Action, Outcome};
use crate::core::types::{EntityId, Tick, Vec2};
use crate::decision::BrainKind;
use crate::simulation::perception::Perception;
use crate::world::Weather;

/// One agent's decision and what came of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub tick: Tick,
    pub agent: EntityId,
    pub brain: BrainKind,
    pub perception: Perception,
    pub action: Action,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorldEvent {
    /// Two agents came within meeting distance
    AgentsMet {
        tick: Tick,
        a: EntityId,
        b: EntityId,
        position: Vec2,
    },
    WeatherChanged {
        tick: Tick,
        from: Weather,
        to: Weather,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationEvent {
    Decision(DecisionRecord),
    World(WorldEvent),
}

impl SimulationEvent {
    pub fn tick(&self) -> Tick {
        match self {
            SimulationEvent::Decision(record) => record.tick,
            SimulationEvent::World(WorldEvent::AgentsMet { tick, .. })
            | SimulationEvent::World(WorldEvent::WeatherChanged { tick, .. }) => *tick,
        }
    }

    /// Short human-readable line for logs and the TUI
    pub fn summary(&self) -> String {
        match self {
            SimulationEvent::Decision(record) => format!(
                "[{}] {} {} -> {}",
                record.tick, record.agent, record.action, record.outcome.event
            ),
            SimulationEvent::World(WorldEvent::AgentsMet { tick, a, b, .. }) => {
                format!("[{tick}] {a} met {b}")
            }
            SimulationEvent::World(WorldEvent::WeatherChanged { tick, from, to }) => {
                format!("[{tick}] weather {} -> {}", from.as_str(), to.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_event_json_shape() {
        let event = SimulationEvent::World(WorldEvent::AgentsMet {
            tick: 3,
            a: EntityId(1),
            b: EntityId(2),
            position: Vec2::new(1.0, 1.0),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["world"]["kind"], "agents_met");
        assert_eq!(json["world"]["a"], 1);
        assert_eq!(event.tick(), 3);
        assert!(event.summary().contains("met"));
    }
}
