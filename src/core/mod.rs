pub mod config;
pub mod error;
pub mod random;
pub mod types;

pub use config::SimulationConfig;
pub use error::{Result, SimError};
pub use types::{Cell, EntityId, Tick, Vec2};
