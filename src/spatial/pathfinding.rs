//! A* pathfinding over the tile grid
//!
//! 8-connected movement, orthogonal steps cost 1.0 and diagonal steps 1.414.
//! Failure of any kind (non-walkable goal, exhausted frontier, blown
//! expansion budget) is an empty path, never an error.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::Cell;
use crate::world::SpatialQuery;

pub const ORTHOGONAL_COST: f32 = 1.0;
pub const DIAGONAL_COST: f32 = 1.414;

/// Default expansion budget for one search
pub const DEFAULT_MAX_EXPANSIONS: usize = 1000;

/// Neighbor offsets: orthogonal first, then diagonals
const NEIGHBORS: [(i32, i32, f32); 8] = [
    (0, -1, ORTHOGONAL_COST),
    (1, 0, ORTHOGONAL_COST),
    (0, 1, ORTHOGONAL_COST),
    (-1, 0, ORTHOGONAL_COST),
    (1, -1, DIAGONAL_COST),
    (1, 1, DIAGONAL_COST),
    (-1, 1, DIAGONAL_COST),
    (-1, -1, DIAGONAL_COST),
];

/// Distance estimate guiding the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    /// Fast but overestimates diagonal moves, so paths may be slightly suboptimal
    Manhattan,
    /// Exact for this cost model on an open grid
    #[default]
    Octile,
}

impl Heuristic {
    pub fn estimate(&self, from: Cell, to: Cell) -> f32 {
        let dx = (from.x - to.x).abs() as f32;
        let dy = (from.y - to.y).abs() as f32;
        match self {
            Heuristic::Manhattan => dx + dy,
            Heuristic::Octile => dx.max(dy) + (DIAGONAL_COST - ORTHOGONAL_COST) * dx.min(dy),
        }
    }
}

/// Node in the A* open set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PathNode {
    cell: Cell,
    f_cost: OrderedFloat<f32>,
    h_cost: OrderedFloat<f32>,
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap; lower h then lower cell break f ties
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.h_cost.cmp(&self.h_cost))
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of one search with its accounting
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchOutcome {
    /// Cells from start to goal inclusive; empty on failure
    pub path: Vec<Cell>,
    /// Frontier pops performed
    pub expanded: usize,
    /// Step cost of `path` (0 for failures and trivial paths)
    pub cost: f32,
}

impl SearchOutcome {
    pub fn found(&self) -> bool {
        !self.path.is_empty()
    }
}

/// Run A* and report the path together with search statistics
pub fn search(
    world: &dyn SpatialQuery,
    start: Cell,
    goal: Cell,
    max_expansions: usize,
    heuristic: Heuristic,
) -> SearchOutcome {
    if !world.is_walkable(goal) {
        return SearchOutcome::default();
    }
    if start == goal {
        return SearchOutcome {
            path: vec![start],
            ..SearchOutcome::default()
        };
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<Cell, Cell> = AHashMap::new();
    let mut g_scores: AHashMap<Cell, f32> = AHashMap::new();
    let mut closed: AHashSet<Cell> = AHashSet::new();
    let mut expanded = 0usize;

    let h = heuristic.estimate(start, goal);
    g_scores.insert(start, 0.0);
    open_set.push(PathNode {
        cell: start,
        f_cost: OrderedFloat(h),
        h_cost: OrderedFloat(h),
    });

    while let Some(current) = open_set.pop() {
        expanded += 1;
        if expanded > max_expansions {
            tracing::debug!(?start, ?goal, max_expansions, "path search over budget");
            return SearchOutcome {
                expanded,
                ..SearchOutcome::default()
            };
        }

        if current.cell == goal {
            let cost = g_scores.get(&goal).copied().unwrap_or(0.0);
            return SearchOutcome {
                path: reconstruct_path(&came_from, goal),
                expanded,
                cost,
            };
        }

        // Stale heap entry for a cell already finalized
        if !closed.insert(current.cell) {
            continue;
        }

        let current_g = g_scores.get(&current.cell).copied().unwrap_or(f32::INFINITY);

        for &(dx, dy, step_cost) in NEIGHBORS.iter() {
            let neighbor = current.cell.offset(dx, dy);
            if closed.contains(&neighbor) || !world.is_walkable(neighbor) {
                continue;
            }

            let tentative_g = current_g + step_cost;
            let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(f32::INFINITY);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.cell);
                g_scores.insert(neighbor, tentative_g);

                let h = heuristic.estimate(neighbor, goal);
                open_set.push(PathNode {
                    cell: neighbor,
                    f_cost: OrderedFloat(tentative_g + h),
                    h_cost: OrderedFloat(h),
                });
            }
        }
    }

    SearchOutcome {
        expanded,
        ..SearchOutcome::default()
    }
}

/// Find a walkable route from `start` to `goal` inclusive, or an empty Vec
pub fn find_path(
    world: &dyn SpatialQuery,
    start: Cell,
    goal: Cell,
    max_expansions: usize,
    heuristic: Heuristic,
) -> Vec<Cell> {
    search(world, start, goal, max_expansions, heuristic).path
}

/// Reconstruct path from came_from map
fn reconstruct_path(came_from: &AHashMap<Cell, Cell>, mut current: Cell) -> Vec<Cell> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Step cost of a path under the orthogonal/diagonal cost model
pub fn path_cost(path: &[Cell]) -> f32 {
    path.windows(2)
        .map(|pair| {
            let dx = (pair[1].x - pair[0].x).abs();
            let dy = (pair[1].y - pair[0].y).abs();
            if dx + dy == 2 {
                DIAGONAL_COST
            } else {
                ORTHOGONAL_COST
            }
        })
        .sum()
}
