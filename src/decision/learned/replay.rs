//! Bounded experience replay

use std::collections::VecDeque;

pub const MAX_REPLAY: usize = 100;

/// One (perception, action, reward, memory context) tuple
#[derive(Debug, Clone, PartialEq)]
pub struct Experience {
    pub perception: Vec<f32>,
    pub action_index: usize,
    pub reward: f32,
    pub memory_context: Vec<f32>,
}

/// FIFO buffer; the oldest experience is dropped on overflow
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    experiences: VecDeque<Experience>,
    capacity: usize,
}

impl Default for ReplayBuffer {
    fn default() -> Self {
        Self::with_capacity(MAX_REPLAY)
    }
}

impl ReplayBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            experiences: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, experience: Experience) {
        if self.experiences.len() >= self.capacity {
            self.experiences.pop_front();
        }
        self.experiences.push_back(experience);
    }

    pub fn len(&self) -> usize {
        self.experiences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiences.is_empty()
    }

    /// Average reward over the buffered experiences
    pub fn mean_reward(&self) -> f32 {
        if self.experiences.is_empty() {
            return 0.0;
        }
        self.experiences.iter().map(|e| e.reward).sum::<f32>() / self.experiences.len() as f32
    }
}
