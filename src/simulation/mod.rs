pub mod clock;
pub mod events;
pub mod perception;
pub mod tick;

pub use clock::FixedTimestep;
pub use events::{DecisionRecord, SimulationEvent, WorldEvent};
pub use perception::{gather_perception, Perception, PerceptionRanges};
pub use tick::{RunSummary, Simulation, StepReport};
