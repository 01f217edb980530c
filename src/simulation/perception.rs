//! Perception system - the snapshot an agent's brain reasons over

use serde::{Deserialize, Serialize};

use crate::core::types::{Cell, EntityId, Tick, Vec2};
use crate::entity::memory::MemoryStore;
use crate::entity::needs::Needs;
use crate::world::{Environment, SpatialQuery, TileType};

/// Memories above this significance surface as recall tags
pub const RECALL_SIGNIFICANCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileSample {
    pub cell: Cell,
    pub kind: TileType,
    pub has_food: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeerSighting {
    pub id: EntityId,
    pub position: Vec2,
}

/// Immutable per-tick input to a brain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perception {
    pub observer: EntityId,
    pub tick: Tick,
    pub position: Vec2,
    pub nearby_tiles: Vec<TileSample>,
    pub nearby_peers: Vec<PeerSighting>,
    pub needs: Needs,
    pub environment: Environment,
    pub memory_recalls: Vec<String>,
}

/// How far an agent can see
#[derive(Debug, Clone, Copy)]
pub struct PerceptionRanges {
    /// Half-width of the square tile window
    pub tile_radius: i32,
    pub peer_radius: f32,
}

impl Default for PerceptionRanges {
    fn default() -> Self {
        Self {
            tile_radius: 5,
            peer_radius: 20.0,
        }
    }
}

impl Perception {
    /// Nearest perceived peer and its distance; first seen wins ties
    pub fn nearest_peer(&self) -> Option<(PeerSighting, f32)> {
        self.nearby_peers
            .iter()
            .map(|peer| (*peer, self.position.distance(&peer.position)))
            .fold(None, |best, candidate| match best {
                Some((_, d)) if d <= candidate.1 => best,
                _ => Some(candidate),
            })
    }

    /// Nearest perceived tile matching `pred`
    pub fn nearest_tile(&self, pred: impl Fn(&TileSample) -> bool) -> Option<TileSample> {
        self.nearby_tiles
            .iter()
            .filter(|t| pred(t))
            .map(|t| (t, self.position.distance(&t.cell.to_vec2())))
            .fold(None, |best: Option<(&TileSample, f32)>, candidate| match best {
                Some((_, d)) if d <= candidate.1 => best,
                _ => Some(candidate),
            })
            .map(|(t, _)| *t)
    }

    pub fn count_tiles(&self, pred: impl Fn(&TileSample) -> bool) -> usize {
        self.nearby_tiles.iter().filter(|t| pred(t)).count()
    }
}

/// Build one agent's snapshot of its surroundings
#[allow(clippy::too_many_arguments)]
pub fn gather_perception(
    observer: EntityId,
    position: Vec2,
    needs: Needs,
    world: &dyn SpatialQuery,
    environment: Environment,
    peers: &[(EntityId, Vec2)],
    memory: &MemoryStore,
    ranges: PerceptionRanges,
    tick: Tick,
) -> Perception {
    let center = position.cell();
    let r = ranges.tile_radius;

    let mut nearby_tiles = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)).max(0) as usize);
    for dy in -r..=r {
        for dx in -r..=r {
            let cell = center.offset(dx, dy);
            if !world.in_bounds(cell) {
                continue;
            }
            let tile = world.tile(cell);
            nearby_tiles.push(TileSample {
                cell,
                kind: tile.kind,
                has_food: tile.has_food(),
            });
        }
    }

    let nearby_peers = peers
        .iter()
        .filter(|(id, pos)| *id != observer && position.distance(pos) < ranges.peer_radius)
        .map(|&(id, position)| PeerSighting { id, position })
        .collect();

    Perception {
        observer,
        tick,
        position,
        nearby_tiles,
        nearby_peers,
        needs,
        environment,
        memory_recalls: memory.salient_categories(RECALL_SIGNIFICANCE),
    }
}
