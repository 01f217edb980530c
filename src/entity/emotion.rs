//! Continuous emotional state on the valence/arousal/dominance axes

use serde::{Deserialize, Serialize};

/// Point in [-1, 1]^3
///
/// Valence: negative to positive. Arousal: calm to excited.
/// Dominance: submissive to in control.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionalState {
    pub valence: f32,
    pub arousal: f32,
    pub dominance: f32,
}

impl EmotionalState {
    pub fn new(valence: f32, arousal: f32, dominance: f32) -> Self {
        let mut state = Self {
            valence,
            arousal,
            dominance,
        };
        state.clamp();
        state
    }

    /// Shift every axis and re-clamp
    pub fn nudge(&mut self, valence: f32, arousal: f32, dominance: f32) {
        self.valence += valence;
        self.arousal += arousal;
        self.dominance += dominance;
        self.clamp();
    }

    pub fn clamp(&mut self) {
        // NaN collapses to neutral rather than poisoning later arithmetic
        for axis in [&mut self.valence, &mut self.arousal, &mut self.dominance] {
            *axis = if axis.is_nan() { 0.0 } else { axis.clamp(-1.0, 1.0) };
        }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dv = self.valence - other.valence;
        let da = self.arousal - other.arousal;
        let dd = self.dominance - other.dominance;
        (dv * dv + da * da + dd * dd).sqrt()
    }

    pub fn is_clamped(&self) -> bool {
        [self.valence, self.arousal, self.dominance]
            .iter()
            .all(|v| (-1.0..=1.0).contains(v))
    }
}
