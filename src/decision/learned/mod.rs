//! Learned-scoring brain
//!
//! Each decision builds a perception vector and a memory context, asks the
//! scorer for an action distribution (or falls back to a need heuristic when
//! no scorer is loaded), lets the emotional state reshape that distribution,
//! then samples from it. Outcomes feed a reward signal back into emotion.

pub mod episodic;
pub mod persistence;
pub mod replay;
pub mod scorer;

use std::path::Path;
use std::sync::Arc;

use rand::distributions::{Distribution, WeightedIndex};

use crate::actions::{Action, ActionKind, Interaction, Outcome};
use crate::core::error::Result;
use crate::core::random::{seeded, SimRng};
use crate::core::types::{EntityId, Tick};
use crate::decision::{random_walkable_target, Brain, BrainKind, BrainSnapshot, DecisionContext};
use crate::entity::emotion::EmotionalState;
use crate::entity::memory::MemoryEntry;
use crate::entity::needs::Needs;
use crate::entity::relationships::RelationshipModel;
use crate::simulation::perception::Perception;
use crate::world::TileType;

use episodic::{embed, EpisodicBuffer};
use persistence::{LoadReport, StateDocument};
use replay::{Experience, ReplayBuffer};
use scorer::{ActionScorer, ScorerOutput};

pub const PERCEPTION_DIM: usize = 20;

/// Probability mass every action starts with in the fallback heuristic
pub const BASELINE_PROB: f32 = 0.05;
pub const LEARNING_RATE: f32 = 0.001;
/// Replay entries required before online updates kick in
pub const ONLINE_UPDATE_MIN: usize = 10;
/// Rewards beyond this magnitude also move arousal and dominance
pub const STRONG_REWARD: f32 = 0.5;
/// Radius for Move/Explore targets
pub const WANDER_RADIUS: f32 = 20.0;

const UNIFORM: [f32; ActionKind::COUNT] = [1.0 / ActionKind::COUNT as f32; ActionKind::COUNT];

pub struct LearnedBrain {
    owner: EntityId,
    rng: SimRng,
    scorer: Option<Arc<dyn ActionScorer>>,
    emotion: EmotionalState,
    episodic: EpisodicBuffer,
    replay: ReplayBuffer,
    relationships: RelationshipModel,
    last_probs: [f32; ActionKind::COUNT],
    /// Experience awaiting its reward from the next outcome
    pending: Option<Experience>,
}

impl LearnedBrain {
    /// Scorer availability is fixed here for the brain's whole lifetime
    pub fn new(owner: EntityId, seed: u64, scorer: Option<Arc<dyn ActionScorer>>) -> Self {
        if scorer.is_none() {
            tracing::debug!(%owner, "learned brain running on heuristic fallback");
        }
        Self {
            owner,
            rng: seeded(seed),
            scorer,
            emotion: EmotionalState::default(),
            episodic: EpisodicBuffer::new(),
            replay: ReplayBuffer::default(),
            relationships: RelationshipModel::new(seed.rotate_left(17) ^ 0x5EED),
            last_probs: UNIFORM,
            pending: None,
        }
    }

    pub fn emotion(&self) -> EmotionalState {
        self.emotion
    }

    pub fn set_emotion(&mut self, emotion: EmotionalState) {
        self.emotion = emotion;
        self.emotion.clamp();
    }

    pub fn episodic(&self) -> &EpisodicBuffer {
        &self.episodic
    }

    pub fn relationships(&self) -> &RelationshipModel {
        &self.relationships
    }

    pub fn replay_len(&self) -> usize {
        self.replay.len()
    }

    pub fn last_action_probs(&self) -> &[f32; ActionKind::COUNT] {
        &self.last_probs
    }

    pub fn has_scorer(&self) -> bool {
        self.scorer.is_some()
    }

    /// Merge a saved document into this brain; failures leave defaults in place
    pub fn load_state(&mut self, path: &Path) -> LoadReport {
        let state = match persistence::load(path) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(owner = %self.owner, path = %path.display(), error = %e, "brain state not loaded");
                return LoadReport::default();
            }
        };

        if let Some(owner) = state.owner.filter(|o| *o != self.owner) {
            tracing::warn!(owner = %self.owner, saved_owner = %owner, "state document belongs to another agent");
        }

        let mut emotion = self.emotion;
        emotion.valence = state.valence.unwrap_or(emotion.valence);
        emotion.arousal = state.arousal.unwrap_or(emotion.arousal);
        emotion.dominance = state.dominance.unwrap_or(emotion.dominance);
        self.set_emotion(emotion);

        for memory in state.memories {
            self.episodic.restore(memory);
        }
        for rel in state.relationships {
            self.relationships.insert(rel);
        }

        tracing::info!(owner = %self.owner, report = ?state.report, "brain state restored");
        state.report
    }

    /// Embed visible food and peers into the episodic buffer
    fn update_memory_buffer(&mut self, p: &Perception, tick: Tick, world_size: (f32, f32)) {
        let food_significance = p.needs.hunger * 1.5;
        for tile in p.nearby_tiles.iter().filter(|t| t.has_food) {
            let location = tile.cell.to_vec2();
            self.episodic.add(
                MemoryEntry::new("food", location, tick, food_significance),
                embed("food", location, food_significance, world_size),
            );
        }

        let peer_significance = p.needs.social * 1.2;
        for peer in &p.nearby_peers {
            self.episodic.add(
                MemoryEntry::new("npc", peer.position, tick, peer_significance),
                embed("npc", peer.position, peer_significance, world_size),
            );
        }
    }

    /// Fill in targets by nearest-match rules per action kind
    fn resolve_target(&mut self, kind: ActionKind, p: &Perception, ctx: &mut DecisionContext<'_>) -> Action {
        let action = Action::new(kind);
        match kind {
            ActionKind::Move | ActionKind::Explore => {
                action.with_position(random_walkable_target(&mut self.rng, ctx.world, p.position, WANDER_RADIUS))
            }
            ActionKind::Forage | ActionKind::Eat => {
                let seen = p.nearest_tile(|t| t.has_food).map(|t| t.cell.to_vec2());
                let remembered = || ctx.memory.recall("food", 1).first().map(|m| m.location);
                match seen.or_else(remembered) {
                    Some(target) => action.with_position(target),
                    None => action,
                }
            }
            ActionKind::Socialize => match p.nearest_peer() {
                Some((peer, _)) => action.with_position(peer.position).with_entity(peer.id),
                None => action,
            },
            ActionKind::SeekShelter => {
                let shelter = p
                    .nearest_tile(|t| t.kind.is_shelter())
                    .or_else(|| p.nearest_tile(|t| t.kind == TileType::Tree));
                match shelter {
                    Some(tile) => action.with_position(tile.cell.to_vec2()),
                    None => action,
                }
            }
            ActionKind::Idle | ActionKind::Rest | ActionKind::BuildShelter => action.with_position(p.position),
        }
    }

    /// Reward-modulated nudge to emotion; no weights are trained
    fn apply_online_update(&mut self, reward: f32) {
        let mut dv = reward * LEARNING_RATE * 10.0;
        let (mut da, mut dd) = (0.0, 0.0);
        if reward.abs() > STRONG_REWARD {
            da = 0.05 * reward.signum();
            dd = 0.05 * reward.signum();
        }
        if !dv.is_finite() {
            dv = 0.0;
        }
        self.emotion.nudge(dv, da, dd);
    }
}

impl Brain for LearnedBrain {
    fn kind(&self) -> BrainKind {
        BrainKind::Learned
    }

    fn decide(&mut self, perception: &Perception, ctx: &mut DecisionContext<'_>) -> Action {
        let world_size = (ctx.world.width() as f32, ctx.world.height() as f32);
        self.update_memory_buffer(perception, ctx.tick, world_size);

        let perception_vec = perception_vector(perception, &self.emotion, world_size);
        self.episodic.compute_attention(&perception_vec);
        let resurfaced = self.episodic.resurface();
        if resurfaced > 0 {
            tracing::debug!(owner = %self.owner, resurfaced, "old memories resurfaced");
            self.emotion.nudge(0.0, 0.2 * resurfaced as f32, 0.0);
        }
        let memory_context = self.episodic.context();

        let probs = match &self.scorer {
            Some(scorer) => {
                let output = ScorerOutput::from_raw(&scorer.score(&perception_vec, &memory_context));
                if let Some([v, a, d]) = output.emotion {
                    self.emotion = EmotionalState::new(v, a, d);
                }
                normalize(output.action_probs)
            }
            None => fallback_distribution(&perception.needs),
        };
        let probs = modulate(probs, &self.emotion);
        self.last_probs = probs;

        let index = WeightedIndex::new(probs.iter())
            .map(|dist| dist.sample(&mut self.rng))
            .unwrap_or(0);
        let kind = ActionKind::from_index(index).unwrap_or_default();
        let action = self.resolve_target(kind, perception, ctx);

        self.pending = Some(Experience {
            perception: perception_vec,
            action_index: index,
            reward: 0.0,
            memory_context,
        });

        tracing::trace!(owner = %self.owner, %action, "learned decision");
        action
    }

    fn on_outcome(&mut self, outcome: &Outcome, tick: Tick) {
        let reward = compute_reward(outcome);

        if let Some(interaction) = &outcome.interaction {
            self.observe_interaction(interaction, tick);
        }

        if let Some(mut experience) = self.pending.take() {
            experience.reward = reward;
            self.replay.push(experience);
        }

        for delta in outcome.needs_deltas.values() {
            if *delta < 0.0 {
                self.emotion.nudge(0.1, -0.05, 0.0);
            } else {
                self.emotion.nudge(-0.05, 0.1, 0.0);
            }
        }

        let event = outcome.event.as_str();
        if event.contains("danger") || event.contains("attacked") {
            self.emotion.nudge(-0.3, 0.4, -0.2);
        } else if event.contains("food") || event.contains("social") {
            self.emotion.nudge(0.2, 0.0, 0.0);
        }

        if self.replay.len() >= ONLINE_UPDATE_MIN {
            self.apply_online_update(reward);
        }
        self.emotion.clamp();
    }

    fn observe_interaction(&mut self, interaction: &Interaction, tick: Tick) {
        self.relationships
            .record_interaction(interaction.peer, &interaction.category, interaction.valence, tick);
    }

    fn maintain(&mut self, tick: Tick) {
        self.episodic.decay(tick);
        self.relationships.decay_relationships(tick);
    }

    fn introspect(&self) -> BrainSnapshot {
        BrainSnapshot {
            kind: BrainKind::Learned,
            emotion: Some(self.emotion),
            action_probs: Some(self.last_probs.to_vec()),
            buffered_memories: self.episodic.len(),
            replay_len: self.replay.len(),
            mean_reward: (!self.replay.is_empty()).then(|| self.replay.mean_reward()),
            scorer_loaded: self.scorer.is_some(),
        }
    }

    fn save_state(&self, path: &Path) -> Result<()> {
        let document = StateDocument {
            owner: self.owner,
            emotional_state: self.emotion,
            memory_buffer: self.episodic.entries(),
            relationships: self.relationships.all_relationships().values().collect(),
            replay_buffer_size: self.replay.len(),
        };
        persistence::save(path, &document)
    }
}

/// Fixed-size perception encoding
///
/// Layout: position (2), needs (5), time of day, wet-weather flag, nearby
/// water/food/shelter/peer counts (4), emotion (3), zero padding to 20.
pub fn perception_vector(p: &Perception, emotion: &EmotionalState, world_size: (f32, f32)) -> Vec<f32> {
    let water = p.count_tiles(|t| t.kind == TileType::Water) as f32;
    let food = p.count_tiles(|t| matches!(t.kind, TileType::BerryBush | TileType::Tree)) as f32;
    let shelter = p.count_tiles(|t| t.kind.is_shelter()) as f32;
    let peers = p.nearby_peers.len() as f32;

    let mut vec = vec![
        p.position.x / world_size.0.max(1.0),
        p.position.y / world_size.1.max(1.0),
        p.needs.hunger,
        p.needs.energy,
        p.needs.social,
        p.needs.curiosity,
        p.needs.safety,
        p.environment.time_of_day,
        if p.environment.weather.is_wet() { 1.0 } else { 0.0 },
        (water / 5.0).min(1.0),
        (food / 5.0).min(1.0),
        (shelter / 3.0).min(1.0),
        (peers / 5.0).min(1.0),
        emotion.valence,
        emotion.arousal,
        emotion.dominance,
    ];
    vec.resize(PERCEPTION_DIM, 0.0);
    vec
}

/// Need heuristic used when no scorer is loaded
///
/// Every action gets the baseline; the first need over its threshold boosts
/// one action, then the whole thing is normalized.
pub fn fallback_distribution(needs: &Needs) -> [f32; ActionKind::COUNT] {
    let mut probs = [BASELINE_PROB; ActionKind::COUNT];
    let (kind, weight) = if needs.hunger > 0.7 {
        (ActionKind::Forage, 0.5)
    } else if needs.energy > 0.7 {
        (ActionKind::Rest, 0.5)
    } else if needs.social > 0.7 {
        (ActionKind::Socialize, 0.4)
    } else if needs.curiosity > 0.6 {
        (ActionKind::Explore, 0.3)
    } else {
        (ActionKind::Idle, 0.3)
    };
    probs[kind.index()] = weight;
    normalize(probs)
}

/// Emotional reshaping followed by renormalization
pub fn modulate(mut probs: [f32; ActionKind::COUNT], emotion: &EmotionalState) -> [f32; ActionKind::COUNT] {
    if emotion.arousal > 0.5 {
        probs[ActionKind::Explore.index()] *= 1.5;
        probs[ActionKind::Move.index()] *= 1.3;
    }
    if emotion.valence < -0.5 {
        probs[ActionKind::SeekShelter.index()] *= 2.0;
        probs[ActionKind::Rest.index()] *= 1.5;
    }
    normalize(probs)
}

/// Scale to sum 1; degenerate input becomes uniform
pub fn normalize(mut probs: [f32; ActionKind::COUNT]) -> [f32; ActionKind::COUNT] {
    let valid = probs.iter().all(|p| p.is_finite() && *p >= 0.0);
    let sum: f32 = probs.iter().sum();
    if !valid || !(sum > f32::EPSILON) || !sum.is_finite() {
        return UNIFORM;
    }
    for p in probs.iter_mut() {
        *p /= sum;
    }
    probs
}

/// Scalar reward for an outcome
///
/// Relieved needs pay their magnitude, worsened needs cost half of theirs.
/// Event tags add a fixed bonus: danger -2.0, food +1.0, social +0.5.
pub fn compute_reward(outcome: &Outcome) -> f32 {
    let mut reward: f32 = outcome
        .needs_deltas
        .values()
        .map(|&delta| if delta < 0.0 { -delta } else { -delta * 0.5 })
        .sum();

    let event = outcome.event.as_str();
    if event.contains("danger") {
        reward -= 2.0;
    } else if event.contains("food") {
        reward += 1.0;
    } else if event.contains("social") {
        reward += 0.5;
    }
    reward
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Cell, Vec2};
    use crate::entity::memory::MemoryStore;
    use crate::simulation::perception::{gather_perception, PerceptionRanges};
    use crate::world::World;

    fn sum(probs: &[f32]) -> f32 {
        probs.iter().sum()
    }

    fn perceive(world: &World, needs: Needs) -> Perception {
        gather_perception(
            EntityId(1),
            Vec2::new(10.0, 10.0),
            needs,
            world,
            world.environment(),
            &[(EntityId(2), Vec2::new(12.0, 10.0))],
            &MemoryStore::new(),
            PerceptionRanges::default(),
            0,
        )
    }

    #[test]
    fn test_fallback_hunger_boost() {
        let needs = Needs {
            hunger: 0.9,
            ..Needs::default()
        };
        let probs = fallback_distribution(&needs);
        assert!((sum(&probs) - 1.0).abs() < 1e-6);
        // 0.5 / (8 * 0.05 + 0.5)
        assert!((probs[ActionKind::Forage.index()] - 0.5 / 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_fallback_default_is_idle() {
        let needs = Needs {
            hunger: 0.1,
            energy: 0.1,
            social: 0.1,
            curiosity: 0.1,
            safety: 0.9,
        };
        let probs = fallback_distribution(&needs);
        let best = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(best, Some(ActionKind::Idle.index()));
    }

    #[test]
    fn test_modulation_renormalizes() {
        let emotion = EmotionalState::new(-0.9, 0.9, 0.0);
        let base = fallback_distribution(&Needs::default());
        let probs = modulate(base, &emotion);
        assert!((sum(&probs) - 1.0).abs() < 1e-6);
        assert!(probs[ActionKind::SeekShelter.index()] > base[ActionKind::SeekShelter.index()]);
    }

    #[test]
    fn test_normalize_degenerate_is_uniform() {
        assert_eq!(normalize([0.0; ActionKind::COUNT]), UNIFORM);
        let mut bad = [0.1; ActionKind::COUNT];
        bad[0] = f32::INFINITY;
        assert_eq!(normalize(bad), UNIFORM);
    }

    #[test]
    fn test_reward_components() {
        let mut outcome = Outcome::with_event("food_eaten");
        outcome.needs_deltas.insert("hunger".into(), -0.3);
        outcome.needs_deltas.insert("energy".into(), 0.2);
        assert!((compute_reward(&outcome) - (0.3 - 0.1 + 1.0)).abs() < 1e-6);

        assert!((compute_reward(&Outcome::with_event("danger_storm")) + 2.0).abs() < 1e-6);
        assert!((compute_reward(&Outcome::with_event("social_contact")) - 0.5).abs() < 1e-6);
        assert_eq!(compute_reward(&Outcome::default()), 0.0);
    }

    #[test]
    fn test_perception_vector_layout() {
        let mut world = World::flat(200, 150);
        world.set_tile(Cell::new(11, 11), TileType::BerryBush);
        world.set_tile(Cell::new(9, 9), TileType::Water);
        let p = perceive(&world, Needs::default());
        let v = perception_vector(&p, &EmotionalState::new(0.1, 0.2, 0.3), (200.0, 150.0));

        assert_eq!(v.len(), PERCEPTION_DIM);
        assert!((v[0] - 0.05).abs() < 1e-6);
        assert_eq!(v[2], 0.5);
        assert_eq!(v[6], 0.9);
        assert!((v[9] - 0.2).abs() < 1e-6);
        assert!((v[10] - 0.2).abs() < 1e-6);
        assert!((v[12] - 0.2).abs() < 1e-6);
        assert_eq!(v[15], 0.3);
        assert!(v[16..].iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_decide_without_scorer_keeps_distribution() {
        let world = World::flat(200, 150);
        let mut memory = MemoryStore::new();
        let mut brain = LearnedBrain::new(EntityId(1), 7, None);

        for tick in 0..20 {
            let p = perceive(&world, Needs::default());
            let mut ctx = DecisionContext {
                world: &world,
                memory: &mut memory,
                tick,
            };
            brain.decide(&p, &mut ctx);
            assert!((sum(brain.last_action_probs()) - 1.0).abs() < 1e-5);
        }
        // The peer sighting is buffered once, not once per tick
        assert_eq!(brain.episodic().len(), 1);
    }

    #[test]
    fn test_outcomes_fill_replay_and_move_emotion() {
        let world = World::flat(200, 150);
        let mut memory = MemoryStore::new();
        let mut brain = LearnedBrain::new(EntityId(1), 3, None);

        for tick in 0..12 {
            let p = perceive(&world, Needs::default());
            let mut ctx = DecisionContext {
                world: &world,
                memory: &mut memory,
                tick,
            };
            brain.decide(&p, &mut ctx);
            let mut outcome = Outcome::with_event("food_eaten");
            outcome.needs_deltas.insert("hunger".into(), -0.3);
            brain.on_outcome(&outcome, tick);
        }

        assert_eq!(brain.replay_len(), 12);
        assert!(brain.emotion().valence > 0.5);
        assert!(brain.emotion().is_clamped());
    }

    #[test]
    fn test_danger_lowers_valence() {
        let mut brain = LearnedBrain::new(EntityId(1), 3, None);
        brain.on_outcome(&Outcome::with_event("danger_storm"), 0);
        let emotion = brain.emotion();
        assert!((emotion.valence + 0.3).abs() < 1e-6);
        assert!((emotion.arousal - 0.4).abs() < 1e-6);
        assert!((emotion.dominance + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_outcome_interaction_mirrored() {
        let mut brain = LearnedBrain::new(EntityId(1), 3, None);
        let mut outcome = Outcome::with_event("social_contact");
        outcome.interaction = Some(Interaction {
            peer: EntityId(9),
            category: "cooperative".into(),
            valence: 1.0,
        });
        brain.on_outcome(&outcome, 4);
        assert!(brain.relationships().get_relationship(EntityId(9)).is_some());
    }

    #[test]
    fn test_introspect_reports_learned_state() {
        let brain = LearnedBrain::new(EntityId(1), 3, None);
        let snapshot = brain.introspect();
        assert_eq!(snapshot.kind, BrainKind::Learned);
        assert!(snapshot.emotion.is_some());
        assert!(!snapshot.scorer_loaded);
        assert_eq!(snapshot.mean_reward, None);
    }

    #[test]
    fn test_introspect_reports_mean_reward() {
        let world = World::flat(20, 20);
        let mut memory = MemoryStore::new();
        let mut brain = LearnedBrain::new(EntityId(1), 3, None);
        let p = perceive(&world, Needs::default());

        for event in ["food_eaten", "idle"] {
            let mut ctx = DecisionContext {
                world: &world,
                memory: &mut memory,
                tick: 1,
            };
            brain.decide(&p, &mut ctx);
            brain.on_outcome(&Outcome::with_event(event), 1);
        }

        let snapshot = brain.introspect();
        assert_eq!(snapshot.replay_len, 2);
        let expected = (compute_reward(&Outcome::with_event("food_eaten"))
            + compute_reward(&Outcome::with_event("idle")))
            / 2.0;
        let mean = snapshot.mean_reward.unwrap();
        assert!((mean - expected).abs() < 1e-6);
    }
}
