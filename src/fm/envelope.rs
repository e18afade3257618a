//! Multi-segment envelope generator.
//!
//! The envelope is advanced once per synthesis frame. A couple of quirks from
//! the DX-series' operator envelopes are implemented, namely:
//! - vaguely logarithmic shape for ascending segments.
//! - direct jump above a threshold for ascending segments.
//! - specific logic and rates for plateaus.

// Based on MIT-licensed code (c) 2021 by Emilie Gillet (emilie.o.gillet@gmail.com)

#[allow(unused_imports)]
use num_traits::float::Float;

use super::dx_units::{
    operator_envelope_increment, operator_level, pitch_envelope_increment, pitch_envelope_level,
};

/// Rate at which the envelope increments are specified.
const NATIVE_SAMPLE_RATE: f32 = 44100.0;

const NUM_STAGES: usize = 4;
const RELEASE: usize = NUM_STAGES - 1;

#[derive(Debug, Clone)]
pub struct Envelope<const RESHAPE_ASCENDING_SEGMENTS: bool> {
    stage: usize,
    phase: f32,
    start: Option<f32>,

    increment: [f32; NUM_STAGES],
    level: [f32; NUM_STAGES],
    scale: f32,
}

impl<const RESHAPE_ASCENDING_SEGMENTS: bool> Default for Envelope<RESHAPE_ASCENDING_SEGMENTS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const RESHAPE_ASCENDING_SEGMENTS: bool> Envelope<RESHAPE_ASCENDING_SEGMENTS> {
    pub fn new() -> Self {
        Self {
            stage: RELEASE,
            phase: 1.0,
            start: None,

            increment: [0.001; NUM_STAGES],
            level: [0.0; NUM_STAGES],
            scale: 1.0,
        }
    }

    /// Sets the sample rate the increments are scaled to and parks the
    /// envelope at the end of its release.
    pub fn init(&mut self, sample_rate: f32) {
        self.scale = NATIVE_SAMPLE_RATE / sample_rate;
        self.stage = RELEASE;
        self.phase = 1.0;
        self.start = None;

        for i in 0..NUM_STAGES {
            self.increment[i] = 0.001;
            self.level[i] = 1.0 / (1 << i) as f32;
        }
        self.level[RELEASE] = 0.0;
    }

    /// Restarts the attack from the current value.
    pub fn trigger(&mut self) {
        self.start = Some(self.current_value());
        self.stage = 0;
        self.phase = 0.0;
    }

    /// Jumps to the release segment from the current value.
    pub fn release(&mut self) {
        if self.stage != RELEASE {
            self.start = Some(self.current_value());
            self.stage = RELEASE;
            self.phase = 0.0;
        }
    }

    /// Advances the envelope by `rate` samples and returns its value.
    #[inline]
    pub fn render(&mut self, rate: f32) -> f32 {
        self.phase += self.increment[self.stage] * rate;

        if self.phase >= 1.0 {
            if self.stage >= NUM_STAGES - 2 {
                // Sustain and release hold their end level.
                self.phase = 1.0;
            } else {
                self.phase = 0.0;
                self.stage += 1;
            }
            self.start = None;
        }

        self.current_value()
    }

    #[inline]
    pub fn current_value(&self) -> f32 {
        let mut from = self
            .start
            .unwrap_or(self.level[(self.stage + NUM_STAGES - 1) % NUM_STAGES]);
        let mut to = self.level[self.stage];
        let mut phase = self.phase;

        if RESHAPE_ASCENDING_SEGMENTS && from < to {
            from = f32::max(6.7, from);
            to = f32::max(6.7, to);
            phase *= (2.5 - phase) * 0.666667;
        }

        phase * (to - from) + from
    }

    #[inline]
    pub fn stage(&self) -> usize {
        self.stage
    }

    /// True once the release segment has reached its end level.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.stage == RELEASE && self.phase >= 1.0
    }
}

/// Operator envelope, with levels in 1/8 of TL units.
#[derive(Debug, Default, Clone)]
pub struct OperatorEnvelope(pub Envelope<true>);

impl OperatorEnvelope {
    pub fn new() -> Self {
        Self(Envelope::new())
    }

    pub fn set(&mut self, rate: &[u8; NUM_STAGES], level: &[u8; NUM_STAGES], global_level: u8) {
        let env = &mut self.0;

        for (target, level) in env.level.iter_mut().zip(level.iter()) {
            let level_scaled =
                (operator_level(*level) as i32 & !1) + global_level as i32 - 133;
            *target = 0.125 * if level_scaled < 1 { 0.5 } else { level_scaled as f32 };
        }

        for i in 0..NUM_STAGES {
            let mut increment = operator_envelope_increment(rate[i]);
            let mut from = env.level[(i + NUM_STAGES - 1) % NUM_STAGES];
            let mut to = env.level[i];

            if from == to {
                // Plateaus are slower, except the attack plateau.
                increment *= 0.6;
                if i == 0 && level[i] != 0 {
                    increment *= 20.0;
                }
            } else if from < to {
                from = f32::max(6.7, from);
                to = f32::max(6.7, to);
                if from == to {
                    // The jump swallowed the whole segment.
                    increment = 1.0;
                } else {
                    increment *= 7.2 / (to - from);
                }
            } else {
                increment *= 1.0 / (from - to);
            }

            env.increment[i] = increment * env.scale;
        }
    }
}

/// Pitch envelope, with levels in octaves.
#[derive(Debug, Default, Clone)]
pub struct PitchEnvelope(pub Envelope<false>);

impl PitchEnvelope {
    pub fn new() -> Self {
        Self(Envelope::new())
    }

    pub fn set(&mut self, rate: &[u8; NUM_STAGES], level: &[u8; NUM_STAGES]) {
        let env = &mut self.0;

        for (target, level) in env.level.iter_mut().zip(level.iter()) {
            *target = pitch_envelope_level(*level);
        }

        for (i, rate) in rate.iter().enumerate() {
            let from = env.level[(i + NUM_STAGES - 1) % NUM_STAGES];
            let to = env.level[i];
            let mut increment = pitch_envelope_increment(*rate);

            if from != to {
                increment *= 1.0 / Float::abs(from - to);
            } else if i != RELEASE {
                increment = 0.2;
            }

            env.increment[i] = increment * env.scale;
        }
    }
}
