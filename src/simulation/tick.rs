//! Simulation tick - drives every agent through one fixed step
//!
//! Per tick: world update, then each agent in id order runs
//! needs -> perceive -> decide -> execute -> on_outcome, then meeting
//! detection over all pairs. Agents are processed sequentially, so the first
//! agent to eat from a bush in a given tick wins it.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use ahash::AHashSet;
use rand::Rng;

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::random::{derive_seed, seeded};
use crate::core::types::{Cell, EntityId, Tick, Vec2};
use crate::decision::learned::scorer::{ActionScorer, LinearScorer};
use crate::decision::{Brain, BrainKind, LearnedBrain, RuleBasedBrain};
use crate::entity::agent::{Agent, AgentParams};
use crate::entity::needs::Needs;
use crate::simulation::clock::FixedTimestep;
use crate::simulation::events::{DecisionRecord, SimulationEvent, WorldEvent};
use crate::simulation::perception::PerceptionRanges;
use crate::world::{SpatialQuery, World};

/// Random placement attempts per agent before scanning for any walkable cell
const SPAWN_ATTEMPTS: usize = 1000;

const BRAIN_SALT: u64 = 1;
const RELATIONSHIP_SALT: u64 = 2;
const SPAWN_SALT: u64 = 0x5BA7;

/// Result of feeding real time into `step`
#[derive(Debug, Default)]
pub struct StepReport {
    pub ticks_run: u32,
    pub events: Vec<SimulationEvent>,
    /// Leftover fraction of a tick
    pub alpha: f32,
}

/// End-of-run statistics
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: Tick,
    pub rule_based: usize,
    pub learned: usize,
    pub mean_needs: Needs,
    pub relationships: usize,
    pub meetings: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ticks:          {}", self.ticks)?;
        writeln!(f, "Agents:         {} rule-based, {} learned", self.rule_based, self.learned)?;
        writeln!(
            f,
            "Mean needs:     hunger {:.2}, energy {:.2}, social {:.2}, curiosity {:.2}, safety {:.2}",
            self.mean_needs.hunger,
            self.mean_needs.energy,
            self.mean_needs.social,
            self.mean_needs.curiosity,
            self.mean_needs.safety
        )?;
        writeln!(f, "Relationships:  {}", self.relationships)?;
        write!(f, "Meetings:       {}", self.meetings)
    }
}

pub struct Simulation {
    config: SimulationConfig,
    world: World,
    agents: Vec<Agent>,
    clock: FixedTimestep,
    current_tick: Tick,
    /// Pairs currently within meeting distance, lower id first
    contacts: AHashSet<(EntityId, EntityId)>,
    meetings: usize,
}

impl Simulation {
    /// Generate a world from the config and populate it
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let world = World::generate(config.world_width, config.world_height, config.seed);
        let mut sim = Self::with_world(config, world)?;
        sim.spawn_agents();
        tracing::info!(
            agents = sim.agents.len(),
            seed = sim.config.seed,
            width = sim.config.world_width,
            height = sim.config.world_height,
            "simulation created"
        );
        Ok(sim)
    }

    /// Empty simulation over a prepared world; agents are added by the caller
    pub fn with_world(config: SimulationConfig, world: World) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            clock: FixedTimestep::new(config.fixed_timestep, config.max_frame_time),
            config,
            world,
            agents: Vec::new(),
            current_tick: 0,
            contacts: AHashSet::new(),
            meetings: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn agent_mut(&mut self, id: EntityId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// Movement and perception parameters derived from the config
    pub fn agent_params(&self) -> AgentParams {
        AgentParams {
            speed: self.config.agent_speed,
            max_path_expansions: self.config.max_path_expansions,
            heuristic: self.config.heuristic,
            ranges: PerceptionRanges {
                tile_radius: self.config.tile_perception_radius,
                peer_radius: self.config.peer_perception_radius,
            },
        }
    }

    /// Build an agent with a brain of the given kind at `position`
    pub fn create_agent(&self, id: EntityId, position: Vec2, kind: BrainKind) -> Agent {
        let scorer = match kind {
            BrainKind::Learned => load_scorer(&self.config),
            BrainKind::RuleBased => None,
        };
        self.build_agent(id, position, kind, scorer)
    }

    pub fn add_agent(&mut self, agent: Agent) {
        self.agents.push(agent);
    }

    fn build_agent(
        &self,
        id: EntityId,
        position: Vec2,
        kind: BrainKind,
        scorer: Option<Arc<dyn ActionScorer>>,
    ) -> Agent {
        let brain_seed = derive_seed(self.config.seed, id, BRAIN_SALT);
        let brain: Box<dyn Brain> = match kind {
            BrainKind::RuleBased => Box::new(RuleBasedBrain::new(id, brain_seed)),
            BrainKind::Learned => {
                let mut brain = LearnedBrain::new(id, brain_seed, scorer);
                if let Some(path) = self.state_path(id).filter(|p| p.exists()) {
                    let report = brain.load_state(&path);
                    tracing::debug!(agent = %id, ?report, "restored brain state");
                }
                Box::new(brain)
            }
        };

        Agent::new(id, position, brain, derive_seed(self.config.seed, id, RELATIONSHIP_SALT))
            .with_params(self.agent_params())
    }

    fn state_path(&self, id: EntityId) -> Option<PathBuf> {
        self.config
            .state_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", id.0)))
    }

    /// Place `agent_count` agents on walkable cells, ids from 1
    fn spawn_agents(&mut self) {
        let scorer = if self.config.learned_ratio > 0.0 {
            load_scorer(&self.config)
        } else {
            None
        };
        let mut rng = seeded(derive_seed(self.config.seed, EntityId::NONE, SPAWN_SALT));
        let ratio = self.config.learned_ratio;

        for i in 0..self.config.agent_count {
            let id = EntityId(i as u32 + 1);

            let random_cell = (0..SPAWN_ATTEMPTS)
                .map(|_| {
                    Cell::new(
                        rng.gen_range(0..self.world.width()),
                        rng.gen_range(0..self.world.height()),
                    )
                })
                .find(|c| self.world.is_walkable(*c));
            let Some(cell) = random_cell.or_else(|| first_walkable(&self.world)) else {
                tracing::warn!(agent = %id, "no walkable cell to spawn on");
                continue;
            };

            // Spreads learned brains evenly through the id range
            let learned = ((i + 1) as f32 * ratio).floor() > (i as f32 * ratio).floor();
            let kind = if learned { BrainKind::Learned } else { BrainKind::RuleBased };

            let agent = self.build_agent(id, cell.to_vec2(), kind, scorer.clone());
            tracing::debug!(agent = %id, brain = kind.as_str(), x = cell.x, y = cell.y, "spawned");
            self.agents.push(agent);
        }
    }

    /// Feed real elapsed time; runs however many whole ticks are due
    pub fn step(&mut self, delta_seconds: f32) -> StepReport {
        let due = self.clock.advance(delta_seconds);
        let mut events = Vec::new();
        for _ in 0..due {
            events.extend(self.tick());
        }
        StepReport {
            ticks_run: due,
            events,
            alpha: self.clock.alpha(),
        }
    }

    /// One fixed simulation tick
    pub fn tick(&mut self) -> Vec<SimulationEvent> {
        let dt = self.config.fixed_timestep;
        let tick = self.current_tick;
        let mut events = Vec::with_capacity(self.agents.len() + 1);

        let weather_before = self.world.weather();
        self.world.update(dt);
        if self.world.weather() != weather_before {
            events.push(SimulationEvent::World(WorldEvent::WeatherChanged {
                tick,
                from: weather_before,
                to: self.world.weather(),
            }));
        }

        let mut positions: Vec<(EntityId, Vec2)> =
            self.agents.iter().map(|a| (a.id, a.position)).collect();

        for (i, agent) in self.agents.iter_mut().enumerate() {
            let environment = self.world.environment();
            agent.update_needs(dt);

            let perception = agent.perceive(&self.world, environment, &positions, tick);
            let action = agent.decide(&perception, &self.world, tick);
            let outcome = agent.execute(&action, &mut self.world, environment, &positions, dt, tick);
            agent.on_outcome(&outcome, tick);
            positions[i].1 = agent.position;

            tracing::trace!(tick, agent = %agent.id, %action, event = %outcome.event, "decision");

            events.push(SimulationEvent::Decision(DecisionRecord {
                tick,
                agent: agent.id,
                brain: agent.brain_kind(),
                perception,
                action,
                outcome,
            }));
        }

        self.detect_meetings(tick, &mut events);

        if tick > 0 && tick % self.config.upkeep_interval == 0 {
            for agent in &mut self.agents {
                agent.upkeep(tick);
            }
            tracing::debug!(tick, "upkeep pass");
        }

        self.current_tick += 1;
        events
    }

    /// New pairs within meeting distance meet once; they meet again only after separating
    fn detect_meetings(&mut self, tick: Tick, events: &mut Vec<SimulationEvent>) {
        let mut in_contact = AHashSet::new();
        let mut new_meetings = Vec::new();

        for (i, a) in self.agents.iter().enumerate() {
            for b in &self.agents[i + 1..] {
                if a.position.distance(&b.position) >= self.config.meeting_distance {
                    continue;
                }
                let pair = if a.id < b.id { (a.id, b.id) } else { (b.id, a.id) };
                in_contact.insert(pair);
                if !self.contacts.contains(&pair) {
                    let midpoint = (a.position + b.position) * 0.5;
                    new_meetings.push((pair, midpoint));
                }
            }
        }

        for ((a, b), position) in new_meetings {
            if let Some(agent) = self.agent_mut(a) {
                agent.meet(b, tick);
            }
            if let Some(agent) = self.agent_mut(b) {
                agent.meet(a, tick);
            }
            self.meetings += 1;
            events.push(SimulationEvent::World(WorldEvent::AgentsMet { tick, a, b, position }));
        }

        self.contacts = in_contact;
    }

    /// Run `ticks` ticks, handing each event to `sink`
    pub fn run_headless_with(&mut self, ticks: u64, mut sink: impl FnMut(&SimulationEvent)) -> RunSummary {
        for _ in 0..ticks {
            for event in self.tick() {
                sink(&event);
            }
        }
        self.summary()
    }

    pub fn run_headless(&mut self, ticks: u64) -> RunSummary {
        self.run_headless_with(ticks, |_| {})
    }

    pub fn summary(&self) -> RunSummary {
        let count = self.agents.len().max(1) as f32;
        let mut mean = Needs {
            hunger: 0.0,
            energy: 0.0,
            social: 0.0,
            curiosity: 0.0,
            safety: 0.0,
        };
        for agent in &self.agents {
            mean.hunger += agent.needs.hunger / count;
            mean.energy += agent.needs.energy / count;
            mean.social += agent.needs.social / count;
            mean.curiosity += agent.needs.curiosity / count;
            mean.safety += agent.needs.safety / count;
        }

        RunSummary {
            ticks: self.current_tick,
            rule_based: self
                .agents
                .iter()
                .filter(|a| a.brain_kind() == BrainKind::RuleBased)
                .count(),
            learned: self
                .agents
                .iter()
                .filter(|a| a.brain_kind() == BrainKind::Learned)
                .count(),
            mean_needs: mean,
            relationships: self.agents.iter().map(|a| a.relationships.len()).sum(),
            meetings: self.meetings,
        }
    }

    /// Persist learned-brain state when a state directory is configured
    pub fn shutdown(&self) {
        if self.config.state_dir.is_none() {
            tracing::info!(tick = self.current_tick, "simulation shut down");
            return;
        }
        let mut saved = 0;
        for agent in self.agents.iter().filter(|a| a.brain_kind() == BrainKind::Learned) {
            let Some(path) = self.state_path(agent.id) else {
                continue;
            };
            match agent.save_brain_state(&path) {
                Ok(()) => saved += 1,
                Err(e) => {
                    tracing::warn!(agent = %agent.id, path = %path.display(), error = %e, "failed to save brain state")
                }
            }
        }
        tracing::info!(saved, tick = self.current_tick, "simulation shut down");
    }
}

/// Load the configured scorer; failures leave every learned brain on the fallback
fn load_scorer(config: &SimulationConfig) -> Option<Arc<dyn ActionScorer>> {
    let path = config.scorer_path.as_ref()?;
    match LinearScorer::load(path) {
        Ok(scorer) => {
            tracing::info!(path = %path.display(), "scorer loaded");
            Some(Arc::new(scorer))
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "scorer unavailable, learned brains use heuristic fallback");
            None
        }
    }
}

fn first_walkable(world: &World) -> Option<Cell> {
    (0..world.height())
        .flat_map(|y| (0..world.width()).map(move |x| Cell::new(x, y)))
        .find(|c| world.is_walkable(*c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            world_width: 40,
            world_height: 30,
            agent_count: 6,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_spawns_on_walkable_cells_with_ids_from_one() {
        let sim = Simulation::new(small_config()).unwrap();
        assert_eq!(sim.agents().len(), 6);
        for (i, agent) in sim.agents().iter().enumerate() {
            assert_eq!(agent.id, EntityId(i as u32 + 1));
            assert!(sim.world().is_walkable(agent.position.cell()));
        }
        let summary = sim.summary();
        assert_eq!(summary.learned, 3);
        assert_eq!(summary.rule_based, 3);
    }

    #[test]
    fn test_tick_emits_one_decision_per_agent() {
        let mut sim = Simulation::new(small_config()).unwrap();
        let events = sim.tick();
        let decisions = events
            .iter()
            .filter(|e| matches!(e, SimulationEvent::Decision(_)))
            .count();
        assert_eq!(decisions, 6);
        assert_eq!(sim.current_tick(), 1);
    }

    #[test]
    fn test_step_clamps_frame_time() {
        let mut sim = Simulation::new(small_config()).unwrap();
        let report = sim.step(5.0);
        assert!(report.ticks_run <= 15);
        assert_eq!(sim.current_tick(), u64::from(report.ticks_run));
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = Simulation::new(small_config()).unwrap();
        let mut b = Simulation::new(small_config()).unwrap();
        a.run_headless(120);
        b.run_headless(120);
        for (x, y) in a.agents().iter().zip(b.agents()) {
            assert_eq!(x.position, y.position);
            assert_eq!(x.needs, y.needs);
        }
    }

    #[test]
    fn test_close_agents_meet_once() {
        let config = small_config();
        let mut sim = Simulation::with_world(config, World::flat(20, 20)).unwrap();
        let a = sim.create_agent(EntityId(1), Vec2::new(5.0, 5.0), BrainKind::RuleBased);
        let b = sim.create_agent(EntityId(2), Vec2::new(6.0, 5.0), BrainKind::RuleBased);
        sim.add_agent(a);
        sim.add_agent(b);

        let mut events = Vec::new();
        sim.detect_meetings(0, &mut events);
        sim.detect_meetings(1, &mut events);
        assert_eq!(events.len(), 1);
        assert!(sim.agent(EntityId(1)).unwrap().relationships.get_relationship(EntityId(2)).is_some());
        assert!(sim.agent(EntityId(2)).unwrap().relationships.get_relationship(EntityId(1)).is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimulationConfig {
            learned_ratio: 2.0,
            ..small_config()
        };
        assert!(Simulation::new(config).is_err());
    }
}
