//! Terrain tiles

use serde::{Deserialize, Serialize};

/// Food units a fresh berry bush carries
pub const BERRY_BUSH_FOOD: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileType {
    Water,
    Sand,
    #[default]
    Grass,
    Dirt,
    Stone,
    Tree,
    BerryBush,
    Cave,
    /// Agent-built
    Shelter,
}

impl TileType {
    pub fn name(&self) -> &'static str {
        match self {
            TileType::Water => "water",
            TileType::Sand => "sand",
            TileType::Grass => "grass",
            TileType::Dirt => "dirt",
            TileType::Stone => "stone",
            TileType::Tree => "tree",
            TileType::BerryBush => "berry_bush",
            TileType::Cave => "cave",
            TileType::Shelter => "shelter",
        }
    }

    pub fn is_walkable(&self) -> bool {
        !matches!(self, TileType::Water | TileType::Tree)
    }

    pub fn is_food_source(&self) -> bool {
        matches!(self, TileType::BerryBush)
    }

    pub fn is_shelter(&self) -> bool {
        matches!(self, TileType::Cave | TileType::Shelter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileType,
    pub walkable: bool,
    pub food: u8,
}

impl Default for Tile {
    fn default() -> Self {
        Tile::of(TileType::Grass)
    }
}

impl Tile {
    /// Returned for out-of-bounds lookups
    pub const VOID: Tile = Tile {
        kind: TileType::Stone,
        walkable: false,
        food: 0,
    };

    pub fn of(kind: TileType) -> Self {
        Self {
            kind,
            walkable: kind.is_walkable(),
            food: if kind.is_food_source() { BERRY_BUSH_FOOD } else { 0 },
        }
    }

    pub fn has_food(&self) -> bool {
        self.kind.is_food_source() && self.food > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_and_trees_block() {
        assert!(!Tile::of(TileType::Water).walkable);
        assert!(!Tile::of(TileType::Tree).walkable);
        assert!(Tile::of(TileType::Cave).walkable);
        assert!(!Tile::VOID.walkable);
    }

    #[test]
    fn test_berry_bush_starts_stocked() {
        let bush = Tile::of(TileType::BerryBush);
        assert_eq!(bush.food, BERRY_BUSH_FOOD);
        assert!(bush.has_food());
        assert!(!Tile::of(TileType::Grass).has_food());
    }
}
