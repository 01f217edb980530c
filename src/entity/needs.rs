//! Drives that push an agent toward action

use serde::{Deserialize, Serialize};

/// Five bounded drives in [0, 1]
///
/// Hunger, energy, social and curiosity grow over time (1.0 = desperate).
/// Safety is inverted: it falls over time and its urgency is `1 - safety`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    /// 0.0 = full, 1.0 = starving
    pub hunger: f32,
    /// 0.0 = rested, 1.0 = needs rest
    pub energy: f32,
    /// 0.0 = socially satisfied, 1.0 = lonely
    pub social: f32,
    /// 0.0 = content, 1.0 = restless
    pub curiosity: f32,
    pub safety: f32,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            hunger: 0.5,
            energy: 0.5,
            social: 0.5,
            curiosity: 0.5,
            safety: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeedType {
    Hunger,
    Energy,
    Social,
    Curiosity,
    Safety,
}

impl NeedType {
    pub const ALL: [NeedType; 5] = [
        NeedType::Hunger,
        NeedType::Energy,
        NeedType::Social,
        NeedType::Curiosity,
        NeedType::Safety,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NeedType::Hunger => "hunger",
            NeedType::Energy => "energy",
            NeedType::Social => "social",
            NeedType::Curiosity => "curiosity",
            NeedType::Safety => "safety",
        }
    }
}

impl Needs {
    /// Advance drives by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.hunger = (self.hunger + 0.05 * dt).min(1.0);
        self.energy = (self.energy + 0.03 * dt).min(1.0);
        self.social = (self.social + 0.02 * dt).min(1.0);
        self.curiosity = (self.curiosity + 0.01 * dt).min(1.0);
        self.safety = (self.safety - 0.1 * dt).max(0.0);
    }

    pub fn get(&self, need: NeedType) -> f32 {
        match need {
            NeedType::Hunger => self.hunger,
            NeedType::Energy => self.energy,
            NeedType::Social => self.social,
            NeedType::Curiosity => self.curiosity,
            NeedType::Safety => self.safety,
        }
    }

    /// Urgency of a need; safety counts inverted
    pub fn urgency(&self, need: NeedType) -> f32 {
        match need {
            NeedType::Safety => 1.0 - self.safety,
            other => self.get(other),
        }
    }

    /// Most pressing need and its urgency, `None` when nothing is pressing
    pub fn most_pressing(&self) -> Option<(NeedType, f32)> {
        NeedType::ALL
            .iter()
            .map(|&need| (need, self.urgency(need)))
            .filter(|(_, urgency)| *urgency > 0.0)
            .fold(None, |best, candidate| match best {
                Some((_, u)) if u >= candidate.1 => best,
                _ => Some(candidate),
            })
    }

    pub fn most_urgent(&self) -> f32 {
        self.most_pressing().map(|(_, u)| u).unwrap_or(0.0)
    }

    pub fn most_urgent_name(&self) -> &'static str {
        self.most_pressing().map(|(need, _)| need.name()).unwrap_or("none")
    }

    /// Reduce a growing need (or raise safety), clamped to [0, 1]
    pub fn satisfy(&mut self, need: NeedType, amount: f32) {
        match need {
            NeedType::Hunger => self.hunger = (self.hunger - amount).max(0.0),
            NeedType::Energy => self.energy = (self.energy - amount).max(0.0),
            NeedType::Social => self.social = (self.social - amount).max(0.0),
            NeedType::Curiosity => self.curiosity = (self.curiosity - amount).max(0.0),
            NeedType::Safety => self.safety = (self.safety + amount).min(1.0),
        }
    }

    /// Signed per-need change from `before` to `self`
    pub fn deltas_since(&self, before: &Needs) -> impl Iterator<Item = (NeedType, f32)> + '_ {
        let before = *before;
        NeedType::ALL
            .into_iter()
            .map(move |need| (need, self.get(need) - before.get(need)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_grow_and_cap() {
        let mut needs = Needs::default();
        needs.update(1.0);
        assert!((needs.hunger - 0.55).abs() < 1e-6);
        assert!((needs.energy - 0.53).abs() < 1e-6);
        assert!((needs.safety - 0.8).abs() < 1e-6);

        for _ in 0..100 {
            needs.update(1.0);
        }
        assert_eq!(needs.hunger, 1.0);
        assert_eq!(needs.curiosity, 1.0);
        assert_eq!(needs.safety, 0.0);
    }

    #[test]
    fn test_most_urgent_counts_safety_inverted() {
        let needs = Needs {
            hunger: 0.2,
            energy: 0.2,
            social: 0.2,
            curiosity: 0.2,
            safety: 0.1,
        };
        assert_eq!(needs.most_urgent_name(), "safety");
        assert!((needs.most_urgent() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_most_urgent_hunger() {
        let needs = Needs {
            hunger: 0.9,
            ..Needs::default()
        };
        assert_eq!(needs.most_urgent_name(), "hunger");
    }

    #[test]
    fn test_all_zero_urgency_is_none() {
        let needs = Needs {
            hunger: 0.0,
            energy: 0.0,
            social: 0.0,
            curiosity: 0.0,
            safety: 1.0,
        };
        assert_eq!(needs.most_urgent_name(), "none");
        assert_eq!(needs.most_urgent(), 0.0);
    }

    #[test]
    fn test_satisfy_clamps() {
        let mut needs = Needs::default();
        needs.satisfy(NeedType::Hunger, 2.0);
        needs.satisfy(NeedType::Safety, 2.0);
        assert_eq!(needs.hunger, 0.0);
        assert_eq!(needs.safety, 1.0);
    }

    #[test]
    fn test_deltas_since() {
        let before = Needs::default();
        let mut after = before;
        after.satisfy(NeedType::Hunger, 0.3);
        let deltas: Vec<_> = after.deltas_since(&before).collect();
        assert_eq!(deltas.len(), 5);
        assert!((deltas[0].1 + 0.3).abs() < 1e-6);
        assert_eq!(deltas[1].1, 0.0);
    }
}
