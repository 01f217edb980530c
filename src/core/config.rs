//! Simulation configuration with documented constants
//!
//! Tunables are collected here with notes on how they interact.
//! Values load from an optional TOML file; any field left out keeps its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::spatial::pathfinding::Heuristic;

/// Configuration for the simulation systems
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === WORLD ===
    /// Seed for terrain, weather and every per-agent generator
    ///
    /// Two runs with the same seed and config produce identical ticks.
    pub seed: u64,

    /// World width in tiles
    pub world_width: i32,

    /// World height in tiles
    pub world_height: i32,

    // === POPULATION ===
    /// Number of agents spawned at startup
    pub agent_count: usize,

    /// Fraction of agents driven by the learned-scoring brain (0.0 - 1.0)
    ///
    /// At 0.5 every other agent gets a learned brain, the rest are rule-based.
    pub learned_ratio: f32,

    // === TIMING ===
    /// Size of one simulation tick in seconds
    ///
    /// Needs and movement are integrated with this dt, so halving it doubles
    /// the number of ticks needed for the same amount of simulated time.
    pub fixed_timestep: f32,

    /// Upper bound on real time fed into the accumulator per frame (seconds)
    ///
    /// Prevents the spiral of death: a slow frame never queues more than
    /// `max_frame_time / fixed_timestep` ticks.
    pub max_frame_time: f32,

    // === PERCEPTION ===
    /// Half-width of the square tile window sampled each tick
    pub tile_perception_radius: i32,

    /// Distance within which other agents are perceived
    pub peer_perception_radius: f32,

    /// Two agents closer than this generate a meeting event
    pub meeting_distance: f32,

    // === MOVEMENT ===
    /// Base movement speed in tiles per second, before mood modifiers
    pub agent_speed: f32,

    /// Expansion budget for a single A* search
    pub max_path_expansions: usize,

    /// Heuristic used by the pathfinder
    pub heuristic: Heuristic,

    // === UPKEEP ===
    /// Ticks between memory-store and relationship decay passes
    ///
    /// Memory decay scales with entry age, so running it every tick would
    /// floor every memory within a few hundred ticks.
    pub upkeep_interval: u64,

    // === LEARNED BRAIN ===
    /// JSON weights for the linear scorer; absent means heuristic fallback
    pub scorer_path: Option<PathBuf>,

    /// Directory holding per-agent learned-brain state documents
    pub state_dir: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            world_width: 200,
            world_height: 150,

            agent_count: 15,
            learned_ratio: 0.5,

            // 60 Hz simulation, never more than a quarter second of catch-up
            fixed_timestep: 1.0 / 60.0,
            max_frame_time: 0.25,

            tile_perception_radius: 5,
            peer_perception_radius: 20.0,
            meeting_distance: 2.0,

            agent_speed: 10.0,
            max_path_expansions: 1000,
            heuristic: Heuristic::Octile,

            upkeep_interval: 100,

            scorer_path: None,
            state_dir: None,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file and validate it
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.world_width <= 0 || self.world_height <= 0 {
            return Err(SimError::InvalidConfig(format!(
                "world size must be positive, got {}x{}",
                self.world_width, self.world_height
            )));
        }

        if !(self.fixed_timestep > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "fixed_timestep ({}) must be positive",
                self.fixed_timestep
            )));
        }

        if self.max_frame_time < self.fixed_timestep {
            return Err(SimError::InvalidConfig(format!(
                "max_frame_time ({}) should be >= fixed_timestep ({})",
                self.max_frame_time, self.fixed_timestep
            )));
        }

        if !(0.0..=1.0).contains(&self.learned_ratio) {
            return Err(SimError::InvalidConfig(format!(
                "learned_ratio ({}) must be within [0, 1]",
                self.learned_ratio
            )));
        }

        if self.upkeep_interval == 0 {
            return Err(SimError::InvalidConfig(
                "upkeep_interval must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
