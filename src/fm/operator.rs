//! FM operator.

// Based on MIT-licensed code (c) 2021 by Emilie Gillet (emilie.o.gillet@gmail.com)

use crate::utils::sine::sine_pm;

/// Highest amplitude (modulation index) an operator can reach.
pub const MAX_AMPLITUDE: f32 = 4.0;

#[derive(Debug, Default, Clone)]
pub struct Operator {
    pub phase: u32,
    pub frequency: u32,
    pub amplitude: f32,
    pub amplitude_increment: f32,
}

impl Operator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the frequency (in cycles per sample) and the amplitude reached at
    /// the end of the next `frame_size` samples.
    #[inline]
    pub fn prepare(&mut self, frequency: f32, amplitude: f32, frame_size: usize) {
        self.frequency = (frequency.clamp(0.0, 0.5) * 4294967296.0) as u32;
        self.amplitude_increment =
            (amplitude.min(MAX_AMPLITUDE) - self.amplitude) / frame_size as f32;
    }

    /// Renders one sample with phase modulation `pm`, in cycles.
    #[inline]
    pub fn next(&mut self, pm: f32) -> f32 {
        self.phase = self.phase.wrapping_add(self.frequency);
        let out = sine_pm(self.phase, pm) * self.amplitude;
        self.amplitude += self.amplitude_increment;
        out
    }
}
