//! Pluggable scoring functions for the learned brain
//!
//! A scorer maps the perception vector and the flattened memory context to
//! 12 raw outputs: 9 action probabilities followed by 3 emotion values. The
//! brain validates the output; anything malformed becomes a uniform
//! distribution for that call.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::actions::ActionKind;
use crate::core::error::{Result, SimError};
use crate::decision::learned::episodic::MEMORY_CONTEXT_DIM;
use crate::decision::learned::PERCEPTION_DIM;

pub const EMOTION_OUTPUTS: usize = 3;
pub const SCORER_OUTPUTS: usize = ActionKind::COUNT + EMOTION_OUTPUTS;

/// Opaque scoring function the learned brain may call
pub trait ActionScorer: Send + Sync {
    fn score(&self, perception: &[f32], memory_context: &[f32]) -> Vec<f32>;
}

/// Validated scorer output
#[derive(Debug, Clone, PartialEq)]
pub struct ScorerOutput {
    pub action_probs: [f32; ActionKind::COUNT],
    pub emotion: Option<[f32; EMOTION_OUTPUTS]>,
}

impl ScorerOutput {
    /// Check shape and values; a bad distribution degrades to uniform
    pub fn from_raw(raw: &[f32]) -> Self {
        let uniform = [1.0 / ActionKind::COUNT as f32; ActionKind::COUNT];
        if raw.len() < SCORER_OUTPUTS {
            return Self {
                action_probs: uniform,
                emotion: None,
            };
        }

        let mut action_probs = [0.0; ActionKind::COUNT];
        action_probs.copy_from_slice(&raw[..ActionKind::COUNT]);
        let valid = action_probs.iter().all(|p| p.is_finite() && *p >= 0.0)
            && action_probs.iter().sum::<f32>() > f32::EPSILON;
        if !valid {
            action_probs = uniform;
        }

        let emotion_raw = &raw[ActionKind::COUNT..SCORER_OUTPUTS];
        let emotion = if emotion_raw.iter().all(|v| v.is_finite()) {
            Some([emotion_raw[0], emotion_raw[1], emotion_raw[2]])
        } else {
            None
        };

        Self { action_probs, emotion }
    }
}

/// Single linear layer: softmax over actions, tanh over emotions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearScorer {
    /// `SCORER_OUTPUTS` rows of `PERCEPTION_DIM + MEMORY_CONTEXT_DIM` weights
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

impl LinearScorer {
    pub const INPUT_DIM: usize = PERCEPTION_DIM + MEMORY_CONTEXT_DIM;

    /// All-zero weights (uniform action distribution, neutral emotion)
    pub fn zeros() -> Self {
        Self {
            weights: vec![vec![0.0; Self::INPUT_DIM]; SCORER_OUTPUTS],
            bias: vec![0.0; SCORER_OUTPUTS],
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let scorer: LinearScorer = serde_json::from_str(&content)?;
        scorer.validate()?;
        Ok(scorer)
    }

    pub fn validate(&self) -> Result<()> {
        if self.weights.len() != SCORER_OUTPUTS || self.bias.len() != SCORER_OUTPUTS {
            return Err(SimError::Scorer(format!(
                "expected {} output rows, got {} weight rows and {} biases",
                SCORER_OUTPUTS,
                self.weights.len(),
                self.bias.len()
            )));
        }
        if let Some((row, w)) = self
            .weights
            .iter()
            .enumerate()
            .find(|(_, w)| w.len() != Self::INPUT_DIM)
        {
            return Err(SimError::Scorer(format!(
                "weight row {} has {} inputs, expected {}",
                row,
                w.len(),
                Self::INPUT_DIM
            )));
        }
        Ok(())
    }
}

impl ActionScorer for LinearScorer {
    fn score(&self, perception: &[f32], memory_context: &[f32]) -> Vec<f32> {
        let logits: Vec<f32> = self
            .weights
            .iter()
            .zip(self.bias.iter())
            .map(|(row, bias)| {
                row.iter()
                    .zip(perception.iter().chain(memory_context.iter()))
                    .map(|(w, x)| w * x)
                    .sum::<f32>()
                    + bias
            })
            .collect();

        let (action_logits, emotion_logits) = logits.split_at(ActionKind::COUNT.min(logits.len()));
        let mut out = softmax(action_logits);
        out.extend(emotion_logits.iter().map(|v| v.tanh()));
        out
    }
}

/// Numerically stable softmax
pub fn softmax(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.iter().map(|e| e / sum).collect()
    } else {
        vec![1.0 / values.len().max(1) as f32; values.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_scorer_is_uniform() {
        let scorer = LinearScorer::zeros();
        let out = scorer.score(&[0.5; PERCEPTION_DIM], &vec![0.1; MEMORY_CONTEXT_DIM]);
        assert_eq!(out.len(), SCORER_OUTPUTS);
        for p in &out[..ActionKind::COUNT] {
            assert!((p - 1.0 / 9.0).abs() < 1e-6);
        }
        assert!(out[ActionKind::COUNT..].iter().all(|e| *e == 0.0));
    }

    #[test]
    fn test_bias_prefers_action() {
        let mut scorer = LinearScorer::zeros();
        scorer.bias[ActionKind::Rest.index()] = 5.0;
        let out = scorer.score(&[0.0; PERCEPTION_DIM], &vec![0.0; MEMORY_CONTEXT_DIM]);
        let best = out[..ActionKind::COUNT]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(best, Some(ActionKind::Rest.index()));
    }

    #[test]
    fn test_validate_rejects_bad_shape() {
        let mut scorer = LinearScorer::zeros();
        scorer.weights[3].pop();
        assert!(matches!(scorer.validate(), Err(SimError::Scorer(_))));

        let mut scorer = LinearScorer::zeros();
        scorer.bias.push(0.0);
        assert!(scorer.validate().is_err());
    }

    #[test]
    fn test_short_output_is_uniform() {
        let out = ScorerOutput::from_raw(&[1.0, 2.0]);
        assert!(out.action_probs.iter().all(|p| (p - 1.0 / 9.0).abs() < 1e-6));
        assert!(out.emotion.is_none());
    }

    #[test]
    fn test_nan_probs_are_uniform() {
        let mut raw = vec![0.1; SCORER_OUTPUTS];
        raw[2] = f32::NAN;
        let out = ScorerOutput::from_raw(&raw);
        assert!(out.action_probs.iter().all(|p| (p - 1.0 / 9.0).abs() < 1e-6));
        assert!(out.emotion.is_some());
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1000.0, 0.0, -1000.0]);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(probs[0] > 0.99);
    }
}
