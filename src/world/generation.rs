//! Seeded terrain generation
//!
//! Three fractal value-noise layers (elevation, moisture, detail) are
//! thresholded into tile types. Same seed, same map.

use rand::Rng;

use crate::core::random::{seeded, SimRng};
use crate::core::types::Cell;
use crate::spatial::grid::Grid;
use crate::world::tile::{Tile, TileType};

const LATTICE: usize = 64;

/// Tileable lattice of random values in [-1, 1], smoothly interpolated
struct ValueNoise {
    values: Vec<f32>,
}

impl ValueNoise {
    fn new(rng: &mut SimRng) -> Self {
        Self {
            values: (0..LATTICE * LATTICE).map(|_| rng.gen_range(-1.0..1.0)).collect(),
        }
    }

    fn lattice(&self, x: i64, y: i64) -> f32 {
        let xi = x.rem_euclid(LATTICE as i64) as usize;
        let yi = y.rem_euclid(LATTICE as i64) as usize;
        self.values.get(yi * LATTICE + xi).copied().unwrap_or(0.0)
    }

    fn sample(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = smoothstep(x - x0);
        let ty = smoothstep(y - y0);
        let (xi, yi) = (x0 as i64, y0 as i64);

        let top = lerp(self.lattice(xi, yi), self.lattice(xi + 1, yi), tx);
        let bottom = lerp(self.lattice(xi, yi + 1), self.lattice(xi + 1, yi + 1), tx);
        lerp(top, bottom, ty)
    }

    /// Sum of octaves, normalized back into [-1, 1]
    fn octaves(&self, x: f32, y: f32, octaves: u32, persistence: f32) -> f32 {
        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_value += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }

        if max_value > 0.0 {
            total / max_value
        } else {
            0.0
        }
    }
}

fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Classify a tile from its three noise samples
pub fn classify(elevation: f32, moisture: f32, detail: f32) -> TileType {
    if elevation < -0.3 {
        TileType::Water
    } else if elevation < -0.15 {
        TileType::Sand
    } else if elevation > 0.5 {
        if moisture < -0.2 {
            TileType::Stone
        } else if detail > 0.3 && moisture > 0.0 {
            TileType::Cave
        } else {
            TileType::Stone
        }
    } else if moisture > 0.3 && detail > 0.4 {
        TileType::Tree
    } else if moisture > 0.0 && detail > 0.5 {
        TileType::BerryBush
    } else if moisture < -0.2 {
        TileType::Dirt
    } else {
        TileType::Grass
    }
}

pub fn generate_terrain(width: i32, height: i32, seed: u64) -> Grid<Tile> {
    let mut rng = seeded(seed);
    let elevation = ValueNoise::new(&mut rng);
    let moisture = ValueNoise::new(&mut rng);
    let detail = ValueNoise::new(&mut rng);

    let mut tiles = Grid::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let (fx, fy) = (x as f32, y as f32);
            let e = elevation.octaves(fx * 0.05, fy * 0.05, 4, 0.5);
            let m = moisture.octaves(fx * 0.03 + 100.0, fy * 0.03 + 100.0, 3, 0.5);
            let d = detail.octaves(fx * 0.2, fy * 0.2, 2, 0.4);
            tiles.set(Cell::new(x, y), Tile::of(classify(e, m, d)));
        }
    }

    tracing::debug!(width, height, seed, "terrain generated");
    tiles
}
