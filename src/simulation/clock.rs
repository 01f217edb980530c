//! Fixed-timestep accumulator
//!
//! Real elapsed time goes in, whole simulation ticks come out. Elapsed time is
//! clamped per frame so a stalled frame cannot queue an unbounded backlog.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTimestep {
    timestep: f32,
    max_frame_time: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(timestep: f32, max_frame_time: f32) -> Self {
        Self {
            timestep,
            max_frame_time,
            accumulator: 0.0,
        }
    }

    /// Add elapsed seconds and return how many ticks are due
    pub fn advance(&mut self, delta_seconds: f32) -> u32 {
        if !(self.timestep > 0.0) {
            return 0;
        }
        let delta = if delta_seconds.is_finite() {
            delta_seconds.clamp(0.0, self.max_frame_time)
        } else {
            0.0
        };
        self.accumulator += delta;

        let mut ticks = 0;
        while self.accumulator >= self.timestep {
            self.accumulator -= self.timestep;
            ticks += 1;
        }
        ticks
    }

    /// Fraction of a tick left in the accumulator, for render interpolation
    pub fn alpha(&self) -> f32 {
        if self.timestep > 0.0 {
            self.accumulator / self.timestep
        } else {
            0.0
        }
    }
}
