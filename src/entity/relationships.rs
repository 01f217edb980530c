//! Relationship embeddings
//!
//! Each agent keeps one learned vector per peer. The first two dimensions are
//! interpretable (trust, affinity), the third tracks familiarity, and the rest
//! drift with small noise so that peers met under similar circumstances end up
//! with similar vectors. Clusters fall out of cosine similarity.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::random::{gaussian, seeded, SimRng};
use crate::core::types::{EntityId, Tick};

pub const EMBEDDING_DIM: usize = 16;
/// Learning rate for interaction updates
pub const ALPHA: f32 = 0.1;
pub const EMBEDDING_CLAMP: f32 = 2.0;
pub const INIT_SIGMA: f32 = 0.1;
pub const DRIFT_SIGMA: f32 = 0.01;
/// Ticks without interaction before a relationship starts fading
pub const QUIESCENCE_TICKS: Tick = 1000;
pub const DECAY_RATE: f32 = 0.001;
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.7;

const TRUST: usize = 0;
const AFFINITY: usize = 1;
const FAMILIARITY: usize = 2;

/// How an interaction moves the embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionCategory {
    Cooperative,
    Competitive,
    Neutral,
    /// Unrecognized tag: only drift is applied
    Other,
}

impl InteractionCategory {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "cooperative" | "share_food" => InteractionCategory::Cooperative,
            "competitive" | "conflict" => InteractionCategory::Competitive,
            "neutral" | "observe" => InteractionCategory::Neutral,
            _ => InteractionCategory::Other,
        }
    }
}

/// One agent's disposition toward a peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipVector {
    pub peer: EntityId,
    pub embedding: Vec<f32>,
    /// tanh(embedding[0])
    pub trust: f32,
    /// tanh(embedding[1])
    pub affinity: f32,
    pub last_interaction: Tick,
}

impl RelationshipVector {
    pub fn new(peer: EntityId, rng: &mut SimRng) -> Self {
        let embedding = (0..EMBEDDING_DIM).map(|_| gaussian(rng, INIT_SIGMA)).collect();
        Self::from_embedding(peer, embedding, 0)
    }

    pub fn from_embedding(peer: EntityId, embedding: Vec<f32>, last_interaction: Tick) -> Self {
        let mut rel = Self {
            peer,
            embedding,
            trust: 0.0,
            affinity: 0.0,
            last_interaction,
        };
        rel.update_derived();
        rel
    }

    pub fn update_derived(&mut self) {
        self.trust = self.embedding.get(TRUST).copied().unwrap_or(0.0).tanh();
        self.affinity = self.embedding.get(AFFINITY).copied().unwrap_or(0.0).tanh();
    }

    pub fn familiarity(&self) -> f32 {
        self.embedding.get(FAMILIARITY).copied().unwrap_or(0.0)
    }
}

/// Cosine similarity over the shared prefix; 0 when either vector is ~zero
pub fn similarity(a: &RelationshipVector, b: &RelationshipVector) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.embedding.iter().zip(b.embedding.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();
    if norm_a < 1e-6 || norm_b < 1e-6 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Peer-id to relationship vector map, owned by one agent
#[derive(Debug, Clone)]
pub struct RelationshipModel {
    relationships: BTreeMap<EntityId, RelationshipVector>,
    rng: SimRng,
}

impl RelationshipModel {
    pub fn new(seed: u64) -> Self {
        Self {
            relationships: BTreeMap::new(),
            rng: seeded(seed),
        }
    }

    /// Apply one interaction, creating the relationship on first contact
    pub fn record_interaction(&mut self, peer: EntityId, category: &str, valence: f32, tick: Tick) {
        let rng = &mut self.rng;
        let rel = self
            .relationships
            .entry(peer)
            .or_insert_with(|| RelationshipVector::new(peer, rng));

        let e = &mut rel.embedding;
        e.resize(EMBEDDING_DIM.max(e.len()), 0.0);

        match InteractionCategory::parse(category) {
            InteractionCategory::Cooperative => {
                e[TRUST] += ALPHA * valence * 0.5;
                e[AFFINITY] += ALPHA * valence * 0.3;
            }
            InteractionCategory::Competitive => {
                e[TRUST] -= ALPHA * valence.abs() * 0.4;
                e[AFFINITY] -= ALPHA * valence.abs() * 0.6;
            }
            InteractionCategory::Neutral => {
                e[FAMILIARITY] += ALPHA * 0.1;
            }
            InteractionCategory::Other => {}
        }

        for value in e.iter_mut().skip(3) {
            *value += gaussian(rng, DRIFT_SIGMA);
        }
        for value in e.iter_mut() {
            *value = value.clamp(-EMBEDDING_CLAMP, EMBEDDING_CLAMP);
        }

        rel.update_derived();
        rel.last_interaction = tick;

        tracing::trace!(%peer, category, valence, trust = rel.trust, "interaction recorded");
    }

    pub fn get_relationship(&self, peer: EntityId) -> Option<&RelationshipVector> {
        self.relationships.get(&peer)
    }

    pub fn all_relationships(&self) -> &BTreeMap<EntityId, RelationshipVector> {
        &self.relationships
    }

    /// Replace or insert a relationship wholesale (state restore)
    pub fn insert(&mut self, mut rel: RelationshipVector) {
        rel.update_derived();
        self.relationships.insert(rel.peer, rel);
    }

    /// Peers that have at least one other peer with similarity >= threshold
    pub fn find_similar(&self, threshold: f32) -> BTreeSet<EntityId> {
        let rels: Vec<&RelationshipVector> = self.relationships.values().collect();
        let mut similar = BTreeSet::new();

        for (i, a) in rels.iter().enumerate() {
            for b in rels.iter().skip(i + 1) {
                if similarity(a, b) >= threshold {
                    similar.insert(a.peer);
                    similar.insert(b.peer);
                }
            }
        }
        similar
    }

    /// Highest affinity; ties go to the lowest id
    pub fn closest_ally(&self) -> Option<EntityId> {
        self.relationships
            .values()
            .fold(None, |best: Option<&RelationshipVector>, rel| match best {
                Some(b) if b.affinity >= rel.affinity => best,
                _ => Some(rel),
            })
            .map(|rel| rel.peer)
    }

    /// Lowest affinity; ties go to the lowest id
    pub fn strongest_rival(&self) -> Option<EntityId> {
        self.relationships
            .values()
            .fold(None, |worst: Option<&RelationshipVector>, rel| match worst {
                Some(w) if w.affinity <= rel.affinity => worst,
                _ => Some(rel),
            })
            .map(|rel| rel.peer)
    }

    /// One fade step for every quiescent relationship
    ///
    /// Applied once per call regardless of how many ticks have passed.
    pub fn decay_relationships(&mut self, current_tick: Tick) {
        for rel in self.relationships.values_mut() {
            if current_tick.saturating_sub(rel.last_interaction) > QUIESCENCE_TICKS {
                for value in rel.embedding.iter_mut() {
                    *value *= 1.0 - DECAY_RATE;
                }
                rel.update_derived();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(peer: u32, embedding: Vec<f32>) -> RelationshipVector {
        RelationshipVector::from_embedding(EntityId(peer), embedding, 0)
    }

    #[test]
    fn test_first_interaction_creates_relationship() {
        let mut model = RelationshipModel::new(1);
        assert!(model.get_relationship(EntityId(5)).is_none());

        model.record_interaction(EntityId(5), "observe", 0.0, 10);

        let rel = model.get_relationship(EntityId(5)).unwrap();
        assert_eq!(rel.embedding.len(), EMBEDDING_DIM);
        assert_eq!(rel.last_interaction, 10);
    }

    #[test]
    fn test_cooperation_raises_trust() {
        let mut model = RelationshipModel::new(2);
        model.record_interaction(EntityId(1), "cooperative", 1.0, 0);
        let before = model.get_relationship(EntityId(1)).unwrap().trust;
        model.record_interaction(EntityId(1), "share_food", 1.0, 1);
        let after = model.get_relationship(EntityId(1)).unwrap().trust;
        assert!(after > before);
    }

    #[test]
    fn test_conflict_ignores_valence_sign() {
        let mut a = RelationshipModel::new(3);
        let mut b = RelationshipModel::new(3);
        a.record_interaction(EntityId(1), "conflict", 1.0, 0);
        b.record_interaction(EntityId(1), "conflict", -1.0, 0);
        assert_eq!(
            a.get_relationship(EntityId(1)).unwrap().embedding[0],
            b.get_relationship(EntityId(1)).unwrap().embedding[0]
        );
    }

    #[test]
    fn test_neutral_bumps_familiarity() {
        let mut model = RelationshipModel::new(4);
        model.insert(rel(1, vec![0.0; EMBEDDING_DIM]));
        model.record_interaction(EntityId(1), "neutral", 0.0, 0);
        let fam = model.get_relationship(EntityId(1)).unwrap().familiarity();
        assert!((fam - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_embedding_clamped() {
        let mut model = RelationshipModel::new(5);
        for tick in 0..200 {
            model.record_interaction(EntityId(1), "cooperative", 10.0, tick);
        }
        let rel = model.get_relationship(EntityId(1)).unwrap();
        assert!(rel.embedding.iter().all(|v| v.abs() <= EMBEDDING_CLAMP));
        assert!((rel.embedding[0] - EMBEDDING_CLAMP).abs() < 1e-6);
    }

    #[test]
    fn test_similarity_zero_vector() {
        let a = rel(1, vec![0.0; EMBEDDING_DIM]);
        let b = rel(2, vec![1.0; EMBEDDING_DIM]);
        assert_eq!(similarity(&a, &b), 0.0);
        assert!((similarity(&b, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_similarity_uses_shorter_length() {
        let a = rel(1, vec![1.0, 0.0]);
        let b = rel(2, vec![1.0, 0.0, 5.0]);
        assert!((similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_find_similar_pairs_only() {
        let mut model = RelationshipModel::new(6);
        let mut base = vec![0.0; EMBEDDING_DIM];
        base[0] = 1.0;
        let mut other = vec![0.0; EMBEDDING_DIM];
        other[1] = 1.0;

        model.insert(rel(1, base.clone()));
        model.insert(rel(2, base));
        model.insert(rel(3, other));

        let similar = model.find_similar(DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(similar, BTreeSet::from([EntityId(1), EntityId(2)]));
    }

    #[test]
    fn test_ally_and_rival() {
        let mut model = RelationshipModel::new(7);
        assert_eq!(model.closest_ally(), None);
        assert_eq!(model.strongest_rival(), None);

        let mut friendly = vec![0.0; EMBEDDING_DIM];
        friendly[1] = 1.0;
        let mut hostile = vec![0.0; EMBEDDING_DIM];
        hostile[1] = -1.0;
        model.insert(rel(1, vec![0.0; EMBEDDING_DIM]));
        model.insert(rel(2, friendly));
        model.insert(rel(3, hostile));

        assert_eq!(model.closest_ally(), Some(EntityId(2)));
        assert_eq!(model.strongest_rival(), Some(EntityId(3)));
    }

    #[test]
    fn test_ally_tie_goes_to_lowest_id() {
        let mut model = RelationshipModel::new(8);
        model.insert(rel(4, vec![0.0; EMBEDDING_DIM]));
        model.insert(rel(2, vec![0.0; EMBEDDING_DIM]));
        assert_eq!(model.closest_ally(), Some(EntityId(2)));
        assert_eq!(model.strongest_rival(), Some(EntityId(2)));
    }

    #[test]
    fn test_decay_only_after_quiescence() {
        let mut model = RelationshipModel::new(9);
        model.insert(RelationshipVector::from_embedding(EntityId(1), vec![1.0; EMBEDDING_DIM], 0));

        model.decay_relationships(1000);
        assert_eq!(model.get_relationship(EntityId(1)).unwrap().embedding[0], 1.0);

        model.decay_relationships(1001);
        let value = model.get_relationship(EntityId(1)).unwrap().embedding[0];
        assert!((value - 0.999).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_embeddings() {
        let mut a = RelationshipModel::new(11);
        let mut b = RelationshipModel::new(11);
        a.record_interaction(EntityId(1), "observe", 0.0, 0);
        b.record_interaction(EntityId(1), "observe", 0.0, 0);
        assert_eq!(a.get_relationship(EntityId(1)), b.get_relationship(EntityId(1)));
    }
}
