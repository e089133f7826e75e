use std::ops::Range;

use rand::Rng;
use staircase_core::StimulusDescriptor;

/// Orientation range for present stimuli, in degrees
pub const ORIENTATION_RANGE_DEG: Range<f64> = 90.0..180.0;

/// Draws the per-trial stimulus from an injected random source
#[derive(Debug, Clone)]
pub struct TrialScheduler<R: Rng> {
    rng: R,
}

impl<R: Rng> TrialScheduler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Fair coin for presence, then an orientation only if present
    pub fn next_stimulus(&mut self) -> StimulusDescriptor {
        let presence_draw: f64 = self.rng.random();
        if presence_draw >= 0.5 {
            return StimulusDescriptor::ABSENT;
        }
        let deg = self.rng.random_range(ORIENTATION_RANGE_DEG);
        StimulusDescriptor::present(deg.to_radians())
    }
}
