//! Integration tests for the two decision engines
//!
//! Covers:
//! - Rule-based priorities (hungry agents go for food)
//! - Learned distribution stays a distribution for any scorer output
//! - Introspection works without knowing the concrete brain

use std::sync::Arc;

use proptest::prelude::*;

use pixel_world::actions::ActionKind;
use pixel_world::core::types::{Cell, EntityId, Vec2};
use pixel_world::decision::learned::scorer::ActionScorer;
use pixel_world::decision::learned::{fallback_distribution, modulate};
use pixel_world::decision::{Brain, BrainKind, DecisionContext, LearnedBrain, RuleBasedBrain};
use pixel_world::entity::emotion::EmotionalState;
use pixel_world::entity::memory::MemoryStore;
use pixel_world::entity::needs::Needs;
use pixel_world::simulation::perception::{gather_perception, Perception, PerceptionRanges};
use pixel_world::world::{TileType, World};

fn needs(hunger: f32, energy: f32, social: f32, curiosity: f32, safety: f32) -> Needs {
    Needs {
        hunger,
        energy,
        social,
        curiosity,
        safety,
    }
}

fn perceive(world: &World, position: Vec2, needs: Needs, memory: &MemoryStore) -> Perception {
    gather_perception(
        EntityId(1),
        position,
        needs,
        world,
        world.environment(),
        &[],
        memory,
        PerceptionRanges::default(),
        0,
    )
}

/// Scorer that always returns the same raw output
struct FixedScorer(Vec<f32>);

impl ActionScorer for FixedScorer {
    fn score(&self, _perception: &[f32], _memory_context: &[f32]) -> Vec<f32> {
        self.0.clone()
    }
}

// ========================================
// Rule-based engine
// ========================================

#[test]
fn test_hungry_agent_heads_for_food() {
    let mut world = World::flat(40, 40);
    world.set_tile(Cell::new(15, 10), TileType::BerryBush);
    let mut memory = MemoryStore::new();
    let mut brain = RuleBasedBrain::new(EntityId(1), 3);

    let p = perceive(&world, Vec2::new(10.0, 10.0), needs(0.9, 0.1, 0.1, 0.1, 0.1), &memory);
    let mut ctx = DecisionContext {
        world: &world,
        memory: &mut memory,
        tick: 0,
    };
    let action = brain.decide(&p, &mut ctx);

    assert!(matches!(action.kind, ActionKind::Forage | ActionKind::Move));
    assert_eq!(action.target_position, Some(Vec2::new(15.0, 10.0)));
    // The sighting is remembered for next time
    assert_eq!(memory.recall("food", 5).len(), 1);
}

#[test]
fn test_hunger_never_yields_rest_socialize_or_explore_when_food_exists() {
    let mut world = World::flat(40, 40);
    world.set_tile(Cell::new(20, 20), TileType::BerryBush);

    for seed in 0..20 {
        let mut memory = MemoryStore::new();
        let mut brain = RuleBasedBrain::new(EntityId(1), seed);
        let p = perceive(&world, Vec2::new(12.0, 25.0), needs(0.9, 0.2, 0.2, 0.2, 0.2), &memory);
        let mut ctx = DecisionContext {
            world: &world,
            memory: &mut memory,
            tick: 0,
        };
        let kind = brain.decide(&p, &mut ctx).kind;
        assert!(
            !matches!(kind, ActionKind::Rest | ActionKind::Socialize | ActionKind::Explore),
            "seed {seed} chose {kind:?}"
        );
    }
}

#[test]
fn test_hungry_agent_beside_food_eats() {
    let mut world = World::flat(40, 40);
    world.set_tile(Cell::new(11, 10), TileType::BerryBush);
    let mut memory = MemoryStore::new();
    let mut brain = RuleBasedBrain::new(EntityId(1), 3);

    let p = perceive(&world, Vec2::new(10.0, 10.0), needs(0.9, 0.1, 0.1, 0.1, 0.1), &memory);
    let mut ctx = DecisionContext {
        world: &world,
        memory: &mut memory,
        tick: 0,
    };
    assert_eq!(brain.decide(&p, &mut ctx).kind, ActionKind::Eat);
}

#[test]
fn test_tired_agent_rests_without_shelter() {
    let world = World::flat(40, 40);
    let mut memory = MemoryStore::new();
    let mut brain = RuleBasedBrain::new(EntityId(1), 3);

    let p = perceive(&world, Vec2::new(10.0, 10.0), needs(0.1, 0.9, 0.1, 0.1, 0.1), &memory);
    let mut ctx = DecisionContext {
        world: &world,
        memory: &mut memory,
        tick: 0,
    };
    assert_eq!(brain.decide(&p, &mut ctx).kind, ActionKind::Rest);
}

#[test]
fn test_nothing_pressing_explores_walkable_ground() {
    let world = World::flat(40, 40);
    let mut memory = MemoryStore::new();
    let mut brain = RuleBasedBrain::new(EntityId(1), 8);

    let p = perceive(&world, Vec2::new(20.0, 20.0), needs(0.1, 0.1, 0.1, 0.1, 0.1), &memory);
    let mut ctx = DecisionContext {
        world: &world,
        memory: &mut memory,
        tick: 0,
    };
    let action = brain.decide(&p, &mut ctx);
    assert_eq!(action.kind, ActionKind::Explore);
    assert!(action.target_position.is_some());
}

// ========================================
// Learned-scoring engine
// ========================================

proptest! {
    #[test]
    fn prop_fallback_then_modulation_sums_to_one(
        hunger in 0.0f32..=1.0,
        energy in 0.0f32..=1.0,
        social in 0.0f32..=1.0,
        curiosity in 0.0f32..=1.0,
        valence in -1.0f32..=1.0,
        arousal in -1.0f32..=1.0,
    ) {
        let probs = fallback_distribution(&needs(hunger, energy, social, curiosity, 0.5));
        let probs = modulate(probs, &EmotionalState::new(valence, arousal, 0.0));
        let sum: f32 = probs.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-4);
        prop_assert!(probs.iter().all(|p| *p >= 0.0));
    }

    #[test]
    fn prop_any_scorer_output_yields_distribution(
        raw in prop::collection::vec(prop::num::f32::ANY, 0..16),
        hunger in 0.0f32..=1.0,
    ) {
        let world = World::flat(30, 30);
        let mut memory = MemoryStore::new();
        let scorer: Arc<dyn ActionScorer> = Arc::new(FixedScorer(raw));
        let mut brain = LearnedBrain::new(EntityId(1), 4, Some(scorer));

        let p = perceive(&world, Vec2::new(10.0, 10.0), needs(hunger, 0.2, 0.2, 0.2, 0.5), &memory);
        let mut ctx = DecisionContext { world: &world, memory: &mut memory, tick: 0 };
        brain.decide(&p, &mut ctx);

        let probs = brain.last_action_probs();
        let sum: f32 = probs.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-4);
        prop_assert!(probs.iter().all(|p| p.is_finite() && *p >= 0.0));
        let emotion = brain.emotion();
        prop_assert!(emotion.valence.abs() <= 1.0 && emotion.arousal.abs() <= 1.0 && emotion.dominance.abs() <= 1.0);
    }
}

#[test]
fn test_confident_scorer_drives_choice() {
    let world = World::flat(30, 30);
    let mut memory = MemoryStore::new();
    let mut raw = vec![0.0; 12];
    raw[ActionKind::Rest.index()] = 1.0;
    let scorer: Arc<dyn ActionScorer> = Arc::new(FixedScorer(raw));
    let mut brain = LearnedBrain::new(EntityId(1), 4, Some(scorer));

    for tick in 0..10 {
        let p = perceive(&world, Vec2::new(10.0, 10.0), needs(0.2, 0.2, 0.2, 0.2, 0.5), &memory);
        let mut ctx = DecisionContext {
            world: &world,
            memory: &mut memory,
            tick,
        };
        assert_eq!(brain.decide(&p, &mut ctx).kind, ActionKind::Rest);
    }
}

#[test]
fn test_learned_brain_without_scorer_uses_fallback() {
    let world = World::flat(30, 30);
    let mut memory = MemoryStore::new();
    let mut brain = LearnedBrain::new(EntityId(1), 5, None);
    assert!(!brain.has_scorer());

    let hungry = needs(0.9, 0.2, 0.2, 0.2, 0.5);
    let p = perceive(&world, Vec2::new(10.0, 10.0), hungry, &memory);
    let mut ctx = DecisionContext {
        world: &world,
        memory: &mut memory,
        tick: 0,
    };
    brain.decide(&p, &mut ctx);

    let probs = brain.last_action_probs();
    let forage = probs[ActionKind::Forage.index()];
    assert!(probs.iter().all(|p| *p <= forage));
}

// ========================================
// Introspection
// ========================================

#[test]
fn test_introspection_through_trait_objects() {
    let brains: Vec<Box<dyn Brain>> = vec![
        Box::new(RuleBasedBrain::new(EntityId(1), 1)),
        Box::new(LearnedBrain::new(EntityId(2), 2, None)),
    ];

    let rule = brains[0].introspect();
    assert_eq!(rule.kind, BrainKind::RuleBased);
    assert!(rule.emotion.is_none());
    assert!(rule.action_probs.is_none());

    let learned = brains[1].introspect();
    assert_eq!(learned.kind, BrainKind::Learned);
    assert_eq!(learned.emotion, Some(EmotionalState::default()));
    assert!(!learned.scorer_loaded);
}
