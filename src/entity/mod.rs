pub mod agent;
pub mod emotion;
pub mod memory;
pub mod needs;
pub mod relationships;

pub use agent::{Agent, AgentParams, Mood};
pub use emotion::EmotionalState;
pub use memory::{MemoryEntry, MemoryStore};
pub use needs::{NeedType, Needs};
pub use relationships::{RelationshipModel, RelationshipVector};
