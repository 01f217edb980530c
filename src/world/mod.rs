//! Grid world - the spatial surface agents query and act upon
//!
//! Agent cognition only sees the world through [`SpatialQuery`]; the one
//! mutation it may perform is [`ResourceAccess::consume_food`].

pub mod environment;
pub mod generation;
pub mod tile;

pub use environment::{Climate, Environment, Weather};
pub use tile::{Tile, TileType};

use crate::core::random::{derive_seed, seeded, SimRng};
use crate::core::types::{Cell, EntityId};
use crate::spatial::grid::Grid;

/// Read-only tile lookups
pub trait SpatialQuery {
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    /// Out-of-bounds cells return [`Tile::VOID`]
    fn tile(&self, cell: Cell) -> Tile;

    fn is_walkable(&self, cell: Cell) -> bool {
        self.tile(cell).walkable
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.width() && cell.y >= 0 && cell.y < self.height()
    }
}

/// The single terrain mutation agents are allowed
///
/// Single-writer per tile: whichever agent is processed first in a tick wins.
pub trait ResourceAccess: SpatialQuery {
    /// Take one unit of food from the cell; false when there was none
    fn consume_food(&mut self, cell: Cell) -> bool;
}

/// Concrete tile world with climate
pub struct World {
    tiles: Grid<Tile>,
    climate: Climate,
    rng: SimRng,
}

impl World {
    /// Procedurally generated world
    pub fn generate(width: i32, height: i32, seed: u64) -> Self {
        let mut rng = seeded(derive_seed(seed, EntityId::NONE, 0xC11A7E));
        let climate = Climate::new(&mut rng);
        Self {
            tiles: generation::generate_terrain(width, height, seed),
            climate,
            rng,
        }
    }

    /// All-grass world with fixed clear weather at noon
    pub fn flat(width: i32, height: i32) -> Self {
        Self {
            tiles: Grid::new(width, height),
            climate: Climate::fixed(Weather::Clear, 0.5),
            rng: seeded(0),
        }
    }

    pub fn set_tile(&mut self, cell: Cell, kind: TileType) {
        self.tiles.set(cell, Tile::of(kind));
    }

    pub fn set_weather(&mut self, weather: Weather) {
        self.climate = Climate::fixed(weather, self.climate.time_of_day);
    }

    pub fn update(&mut self, dt: f32) {
        self.climate.update(dt, &mut self.rng);
    }

    pub fn environment(&self) -> Environment {
        self.climate.environment()
    }

    pub fn weather(&self) -> Weather {
        self.climate.weather
    }

    pub fn time_of_day(&self) -> f32 {
        self.climate.time_of_day
    }

    pub fn tiles(&self) -> &Grid<Tile> {
        &self.tiles
    }
}

impl SpatialQuery for World {
    fn width(&self) -> i32 {
        self.tiles.width
    }

    fn height(&self) -> i32 {
        self.tiles.height
    }

    fn tile(&self, cell: Cell) -> Tile {
        self.tiles.get(cell).copied().unwrap_or(Tile::VOID)
    }
}

impl ResourceAccess for World {
    fn consume_food(&mut self, cell: Cell) -> bool {
        match self.tiles.get_mut(cell) {
            Some(tile) if tile.has_food() => {
                tile.food -= 1;
                true
            }
            _ => false,
        }
    }
}
