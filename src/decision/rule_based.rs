//! Rule-based need prioritization
//!
//! Evaluated in fixed order on every call:
//! 1. Wet weather with safety below crisis level -> seek shelter
//! 2. hunger > 0.7 -> forage, energy > 0.7 -> rest, safety > 0.7 -> seek
//!    shelter, social > 0.6 -> socialize, curiosity > 0.6 -> explore
//! 3. Otherwise explore
//!
//! Each branch first consults remembered locations, then scans the world,
//! then navigates. Whatever cannot be resolved degrades to Explore.

use crate::actions::{Action, ActionKind, Outcome};
use crate::core::random::{seeded, SimRng};
use crate::core::types::{Cell, EntityId, Tick, Vec2};
use crate::decision::{random_walkable_target, Brain, BrainKind, BrainSnapshot, DecisionContext};
use crate::simulation::perception::Perception;
use crate::world::{SpatialQuery, Tile, TileType};

pub const NEED_THRESHOLD: f32 = 0.7;
pub const SOCIAL_THRESHOLD: f32 = 0.6;
pub const CURIOSITY_THRESHOLD: f32 = 0.6;

/// Remembered locations farther than this are ignored
pub const MEMORY_RANGE: f32 = 100.0;
pub const SEARCH_RADIUS: f32 = 50.0;
/// Secondary (tree cover) radius when no cave is in range
pub const COVER_SEARCH_RADIUS: f32 = 30.0;
pub const EXPLORE_RADIUS: f32 = 30.0;

pub const EAT_DISTANCE: f32 = 1.5;
pub const REST_DISTANCE: f32 = 2.0;
pub const SOCIALIZE_DISTANCE: f32 = 3.0;

/// Memories consulted per lookup
const RECALL_COUNT: usize = 3;

pub struct RuleBasedBrain {
    owner: EntityId,
    rng: SimRng,
}

impl RuleBasedBrain {
    pub fn new(owner: EntityId, seed: u64) -> Self {
        Self {
            owner,
            rng: seeded(seed),
        }
    }

    fn decide_from_needs(&mut self, p: &Perception, ctx: &mut DecisionContext<'_>) -> Action {
        let needs = &p.needs;

        if p.environment.weather.is_wet() && needs.safety < NEED_THRESHOLD {
            return self.seek_shelter(p, ctx);
        }

        if needs.hunger > NEED_THRESHOLD {
            self.forage(p, ctx)
        } else if needs.energy > NEED_THRESHOLD {
            self.seek_rest(p, ctx)
        } else if needs.safety > NEED_THRESHOLD {
            self.seek_shelter(p, ctx)
        } else if needs.social > SOCIAL_THRESHOLD {
            self.socialize(p, ctx)
        } else {
            // Curiosity and the default case both explore
            self.explore(p, ctx)
        }
    }

    fn forage(&mut self, p: &Perception, ctx: &mut DecisionContext<'_>) -> Action {
        let remembered = self.recall_valid(p, ctx, "food", |tile| tile.has_food());

        let target = remembered.or_else(|| {
            let found = find_nearest_tile(ctx.world, p.position, SEARCH_RADIUS, |t| t.has_food());
            if let Some(pos) = found {
                ctx.memory.add_memory("food", pos, ctx.tick, 1.0);
            }
            found
        });

        match target {
            Some(target) if p.position.distance(&target) < EAT_DISTANCE => {
                Action::new(ActionKind::Eat).with_position(target)
            }
            Some(target) => Action::new(ActionKind::Move).with_position(target),
            None => self.explore(p, ctx),
        }
    }

    fn seek_rest(&mut self, p: &Perception, ctx: &mut DecisionContext<'_>) -> Action {
        let remembered = self.recall_valid(p, ctx, "shelter", |tile| tile.kind.is_shelter());

        let target = remembered.or_else(|| {
            let found = find_nearest_tile(ctx.world, p.position, SEARCH_RADIUS, |t| {
                t.kind == TileType::Cave
            });
            if let Some(pos) = found {
                ctx.memory.add_memory("shelter", pos, ctx.tick, 1.0);
            }
            found
        });

        match target {
            Some(target) if p.position.distance(&target) >= REST_DISTANCE => {
                Action::new(ActionKind::Move).with_position(target)
            }
            // At the shelter, or nowhere better to go: rest in place
            _ => Action::new(ActionKind::Rest),
        }
    }

    fn seek_shelter(&mut self, p: &Perception, ctx: &mut DecisionContext<'_>) -> Action {
        let target = find_nearest_tile(ctx.world, p.position, SEARCH_RADIUS, |t| t.kind == TileType::Cave)
            .or_else(|| {
                find_nearest_tile(ctx.world, p.position, COVER_SEARCH_RADIUS, |t| {
                    t.kind == TileType::Tree
                })
            });

        match target {
            Some(target) => Action::new(ActionKind::SeekShelter).with_position(target),
            None => self.explore(p, ctx),
        }
    }

    fn socialize(&mut self, p: &Perception, ctx: &mut DecisionContext<'_>) -> Action {
        match p.nearest_peer() {
            Some((peer, dist)) if dist < SOCIALIZE_DISTANCE => Action::new(ActionKind::Socialize)
                .with_position(peer.position)
                .with_entity(peer.id),
            Some((peer, _)) => Action::new(ActionKind::Move)
                .with_position(peer.position)
                .with_entity(peer.id),
            None => self.explore(p, ctx),
        }
    }

    fn explore(&mut self, p: &Perception, ctx: &mut DecisionContext<'_>) -> Action {
        let target = random_walkable_target(&mut self.rng, ctx.world, p.position, EXPLORE_RADIUS);
        Action::new(ActionKind::Explore).with_position(target)
    }

    /// First remembered location in range whose tile still qualifies
    ///
    /// Stale memories (eaten bush, location no longer matching) are forgotten.
    fn recall_valid(
        &self,
        p: &Perception,
        ctx: &mut DecisionContext<'_>,
        category: &str,
        still_valid: impl Fn(&Tile) -> bool,
    ) -> Option<Vec2> {
        let mut stale = Vec::new();
        let mut found = None;

        for memory in ctx.memory.recall(category, RECALL_COUNT) {
            if memory.location.distance(&p.position) >= MEMORY_RANGE {
                continue;
            }
            if still_valid(&ctx.world.tile(memory.location.cell())) {
                found = Some(memory.location);
                break;
            }
            stale.push(memory.location);
        }

        for location in stale {
            tracing::trace!(owner = %self.owner, category, ?location, "forgetting stale memory");
            ctx.memory.forget(category, location);
        }
        found
    }
}

impl Brain for RuleBasedBrain {
    fn kind(&self) -> BrainKind {
        BrainKind::RuleBased
    }

    fn decide(&mut self, perception: &Perception, ctx: &mut DecisionContext<'_>) -> Action {
        let action = self.decide_from_needs(perception, ctx);
        tracing::trace!(owner = %self.owner, %action, "rule-based decision");
        action
    }

    fn on_outcome(&mut self, _outcome: &Outcome, _tick: Tick) {}

    fn introspect(&self) -> BrainSnapshot {
        BrainSnapshot::neutral(BrainKind::RuleBased)
    }
}

/// Nearest tile within a square window of `radius`, by Euclidean distance
///
/// Scans row by row, so the first tile found wins ties.
pub fn find_nearest_tile(
    world: &dyn SpatialQuery,
    position: Vec2,
    radius: f32,
    pred: impl Fn(&Tile) -> bool,
) -> Option<Vec2> {
    let center = position.cell();
    let r = radius as i32;
    let mut best_dist_sq = (r * r) as f32;
    let mut best = None;

    for dy in -r..=r {
        for dx in -r..=r {
            let cell = Cell::new(center.x + dx, center.y + dy);
            if !world.in_bounds(cell) {
                continue;
            }
            let dist_sq = (dx * dx + dy * dy) as f32;
            if dist_sq < best_dist_sq && pred(&world.tile(cell)) {
                best_dist_sq = dist_sq;
                best = Some(cell.to_vec2());
            }
        }
    }
    best
}
