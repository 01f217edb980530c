pub mod grid;
pub mod pathfinding;

pub use grid::Grid;
pub use pathfinding::{find_path, search, Heuristic, SearchOutcome};
