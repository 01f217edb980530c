//! Agent - needs, memory, relationships and a brain behind one position
//!
//! Each tick the simulation drives an agent through
//! `update_needs -> perceive -> decide -> execute -> on_outcome`.

use std::collections::VecDeque;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::actions::{Action, ActionKind, Interaction, Outcome};
use crate::core::error::Result;
use crate::core::types::{Cell, EntityId, Tick, Vec2};
use crate::decision::{Brain, BrainKind, BrainSnapshot, DecisionContext};
use crate::entity::memory::MemoryStore;
use crate::entity::needs::{NeedType, Needs};
use crate::entity::relationships::RelationshipModel;
use crate::simulation::perception::{gather_perception, Perception, PerceptionRanges};
use crate::spatial::pathfinding::{find_path, Heuristic, DEFAULT_MAX_EXPANSIONS};
use crate::world::{Environment, ResourceAccess, SpatialQuery, Weather};

/// Hunger relieved by one successful Eat
pub const EAT_RELIEF: f32 = 0.3;
/// Energy relieved per second of rest
pub const REST_RATE: f32 = 0.2;
/// Social need relieved per second of socializing
pub const SOCIAL_RATE: f32 = 0.1;
/// Eat reaches a target tile closer than this
pub const EAT_REACH: f32 = 1.5;
/// Socialize reaches a peer closer than this
pub const SOCIAL_REACH: f32 = 3.0;
/// A failed Eat with someone this close counts as competition
pub const CONTEST_DISTANCE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mood {
    Happy,
    #[default]
    Neutral,
    Anxious,
    Sad,
    Excited,
}

impl Mood {
    pub fn from_needs(needs: &Needs) -> Self {
        if needs.curiosity > 0.7 {
            return Mood::Excited;
        }
        let avg = (needs.hunger + needs.energy + needs.social) / 3.0;
        if avg < 0.3 {
            Mood::Happy
        } else if avg < 0.5 {
            Mood::Neutral
        } else if avg < 0.7 {
            Mood::Anxious
        } else {
            Mood::Sad
        }
    }

    pub fn speed_multiplier(&self) -> f32 {
        match self {
            Mood::Happy | Mood::Excited => 1.2,
            Mood::Sad | Mood::Anxious => 0.8,
            Mood::Neutral => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Neutral => "neutral",
            Mood::Anxious => "anxious",
            Mood::Sad => "sad",
            Mood::Excited => "excited",
        }
    }
}

/// Movement and routing parameters
#[derive(Debug, Clone, Copy)]
pub struct AgentParams {
    /// Tiles per second before mood modifiers
    pub speed: f32,
    pub max_path_expansions: usize,
    pub heuristic: Heuristic,
    pub ranges: PerceptionRanges,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            speed: 10.0,
            max_path_expansions: DEFAULT_MAX_EXPANSIONS,
            heuristic: Heuristic::Octile,
            ranges: PerceptionRanges::default(),
        }
    }
}

/// Cached A* route toward one goal cell
#[derive(Debug, Clone, Default)]
struct Route {
    goal: Option<Cell>,
    waypoints: VecDeque<Cell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Travel {
    Moving,
    Arrived,
    Blocked,
}

pub struct Agent {
    pub id: EntityId,
    pub position: Vec2,
    pub needs: Needs,
    pub mood: Mood,
    pub memory: MemoryStore,
    pub relationships: RelationshipModel,
    pub current_action: Action,
    params: AgentParams,
    brain: Box<dyn Brain>,
    route: Route,
}

impl Agent {
    pub fn new(id: EntityId, position: Vec2, brain: Box<dyn Brain>, relationship_seed: u64) -> Self {
        Self {
            id,
            position,
            needs: Needs::default(),
            mood: Mood::default(),
            memory: MemoryStore::new(),
            relationships: RelationshipModel::new(relationship_seed),
            current_action: Action::idle(),
            params: AgentParams::default(),
            brain,
            route: Route::default(),
        }
    }

    pub fn with_params(mut self, params: AgentParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_needs(mut self, needs: Needs) -> Self {
        self.needs = needs;
        self
    }

    pub fn brain_kind(&self) -> BrainKind {
        self.brain.kind()
    }

    pub fn introspect(&self) -> BrainSnapshot {
        self.brain.introspect()
    }

    pub fn save_brain_state(&self, path: &Path) -> Result<()> {
        self.brain.save_state(path)
    }

    pub fn update_needs(&mut self, dt: f32) {
        self.needs.update(dt);
        self.mood = Mood::from_needs(&self.needs);
    }

    pub fn perceive(
        &self,
        world: &dyn SpatialQuery,
        environment: Environment,
        peers: &[(EntityId, Vec2)],
        tick: Tick,
    ) -> Perception {
        gather_perception(
            self.id,
            self.position,
            self.needs,
            world,
            environment,
            peers,
            &self.memory,
            self.params.ranges,
            tick,
        )
    }

    pub fn decide(&mut self, perception: &Perception, world: &dyn SpatialQuery, tick: Tick) -> Action {
        let mut ctx = DecisionContext {
            world,
            memory: &mut self.memory,
            tick,
        };
        let action = self.brain.decide(perception, &mut ctx);
        self.current_action = action;
        action
    }

    /// Carry out an action and report what changed
    ///
    /// Only changes caused by the action show up in the outcome; passive need
    /// growth happens in `update_needs`.
    pub fn execute<W: ResourceAccess>(
        &mut self,
        action: &Action,
        world: &mut W,
        environment: Environment,
        peers: &[(EntityId, Vec2)],
        dt: f32,
        tick: Tick,
    ) -> Outcome {
        let before = self.needs;
        let mut event = action.kind.as_str().to_string();
        let mut interaction = None;

        if action.kind.is_movement() {
            if let Some(target) = action.target_position {
                if self.travel(target, &*world, dt) == Travel::Blocked {
                    event = "path_blocked".to_string();
                }
            }
        }

        match action.kind {
            ActionKind::Eat => {
                let cell = action
                    .target_position
                    .filter(|t| t.distance(&self.position) < EAT_REACH)
                    .map(|t| t.cell())
                    .unwrap_or_else(|| self.position.cell());

                if world.consume_food(cell) {
                    self.needs.satisfy(NeedType::Hunger, EAT_RELIEF);
                    event = "food_eaten".to_string();
                } else {
                    event = "nothing_to_eat".to_string();
                    self.memory.forget("food", cell.to_vec2());
                    if let Some(rival) = nearest_peer(self.id, self.position, peers, CONTEST_DISTANCE) {
                        interaction = Some(Interaction {
                            peer: rival,
                            category: "competitive".to_string(),
                            valence: 1.0,
                        });
                    }
                }
            }
            ActionKind::Rest => {
                self.needs.satisfy(NeedType::Energy, dt * REST_RATE);
                event = "rested".to_string();
            }
            ActionKind::Socialize => {
                self.needs.satisfy(NeedType::Social, dt * SOCIAL_RATE);
                event = "social_contact".to_string();
                let partner = action.target_entity.filter(|peer| {
                    peers
                        .iter()
                        .any(|(id, pos)| id == peer && pos.distance(&self.position) < SOCIAL_REACH)
                });
                if let Some(peer) = partner {
                    interaction = Some(Interaction {
                        peer,
                        category: "cooperative".to_string(),
                        valence: dt,
                    });
                }
            }
            // Movement is handled above; Idle and BuildShelter change nothing
            _ => {}
        }

        if environment.weather == Weather::Storm && !world.tile(self.position.cell()).kind.is_shelter() {
            event = "danger_storm".to_string();
        }

        if let Some(i) = &interaction {
            self.relationships.record_interaction(i.peer, &i.category, i.valence, tick);
        }

        Outcome {
            needs_deltas: self
                .needs
                .deltas_since(&before)
                .filter(|(_, delta)| *delta != 0.0)
                .map(|(need, delta)| (need.name().to_string(), delta))
                .collect(),
            event,
            interaction,
        }
    }

    pub fn on_outcome(&mut self, outcome: &Outcome, tick: Tick) {
        self.brain.on_outcome(outcome, tick);
    }

    /// Two agents came within meeting distance
    pub fn meet(&mut self, peer: EntityId, tick: Tick) {
        let interaction = Interaction {
            peer,
            category: "observe".to_string(),
            valence: 0.0,
        };
        self.relationships
            .record_interaction(peer, &interaction.category, interaction.valence, tick);
        self.brain.observe_interaction(&interaction, tick);
    }

    /// Periodic decay of memories and relationships
    pub fn upkeep(&mut self, tick: Tick) {
        self.memory.decay(tick);
        self.relationships.decay_relationships(tick);
        self.brain.maintain(tick);
    }

    /// Follow an A* route toward `target`, recomputing only when the goal changes
    pub fn travel(&mut self, target: Vec2, world: &dyn SpatialQuery, dt: f32) -> Travel {
        let target = clamp_to_world(target, world);
        let Some(goal) = reachable_goal(target, self.position, world) else {
            self.route = Route::default();
            return Travel::Blocked;
        };

        if self.route.goal != Some(goal) {
            let path = find_path(
                world,
                self.position.cell(),
                goal,
                self.params.max_path_expansions,
                self.params.heuristic,
            );
            if path.is_empty() {
                tracing::trace!(agent = %self.id, ?goal, "no route");
                self.route = Route::default();
                return Travel::Blocked;
            }
            self.route = Route {
                goal: Some(goal),
                waypoints: path.into_iter().skip(1).collect(),
            };
        }

        // Exact target for the last leg when it lies inside the goal cell
        let destination = if target.cell() == goal { target } else { goal.to_vec2() };
        let mut budget = self.params.speed * self.mood.speed_multiplier() * dt;

        while budget > 0.0 {
            let waypoint = match self.route.waypoints.front() {
                Some(&cell) if cell == goal => destination,
                Some(&cell) => cell.to_vec2(),
                None => destination,
            };
            let distance = self.position.distance(&waypoint);
            if distance <= budget {
                self.position = waypoint;
                budget -= distance;
                if self.route.waypoints.pop_front().is_none() {
                    break;
                }
            } else {
                self.position = self.position + (waypoint - self.position).normalize() * budget;
                budget = 0.0;
            }
        }

        self.position = clamp_to_world(self.position, world);
        if self.route.waypoints.is_empty() && self.position.distance(&destination) < 1e-3 {
            Travel::Arrived
        } else {
            Travel::Moving
        }
    }
}

fn clamp_to_world(pos: Vec2, world: &dyn SpatialQuery) -> Vec2 {
    Vec2::new(
        pos.x.clamp(0.0, (world.width() - 1).max(0) as f32),
        pos.y.clamp(0.0, (world.height() - 1).max(0) as f32),
    )
}

/// The target cell, or its walkable neighbor closest to `from` when blocked
fn reachable_goal(target: Vec2, from: Vec2, world: &dyn SpatialQuery) -> Option<Cell> {
    let cell = target.cell();
    if world.is_walkable(cell) {
        return Some(cell);
    }
    (-1..=1)
        .flat_map(|dy| (-1..=1).map(move |dx| cell.offset(dx, dy)))
        .filter(|c| *c != cell && world.is_walkable(*c))
        .min_by(|a, b| {
            from.distance(&a.to_vec2())
                .total_cmp(&from.distance(&b.to_vec2()))
        })
}

fn nearest_peer(me: EntityId, pos: Vec2, peers: &[(EntityId, Vec2)], within: f32) -> Option<EntityId> {
    peers
        .iter()
        .filter(|(id, _)| *id != me)
        .map(|(id, p)| (*id, pos.distance(p)))
        .filter(|(_, d)| *d < within)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}
