//! Per-voice synthesis.
//!
//! [`NoteSynth`] is everything the voice pool needs from a note: it is
//! implemented by the 6-operator [`FmNote`], and voices are generic over it so
//! that the pool stays free of dynamic dispatch.

// Based on MIT-licensed code (c) 2021 by Emilie Gillet (emilie.o.gillet@gmail.com)

use super::algorithms::{self, Routing};
use super::controllers::Controllers;
use super::dx_units::{
    amp_mod_sensitivity, frequency_ratio, keyboard_scaling, normalize_velocity, operator_level,
    pitch_mod_sensitivity, pow_2_fast, rate_scaling,
};
use super::envelope::{OperatorEnvelope, PitchEnvelope};
use super::operator::Operator;
use super::patch::Patch;
use super::{N, NUM_OPERATORS, Q24_ONE};
use crate::utils::semitones_to_ratio;

/// Accumulator value of a carrier at amplitude 1.0.
const OUTPUT_SCALE: f32 = (1 << 23) as f32;

/// Carrier amplitude below which a released note counts as silent.
const SILENCE: f32 = 1.0 / 2048.0;

/// Snapshot of a note for display purposes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VoiceStatus {
    /// Operator envelope levels, operator 6 first.
    pub amp: [f32; NUM_OPERATORS],
    /// Operator envelope stages (0-3), operator 6 first.
    pub amp_step: [u8; NUM_OPERATORS],
    pub pitch_step: u8,
}

pub trait NoteSynth {
    fn new(sample_rate: f32) -> Self;

    /// Starts a note. `pitch` is in 1/128 semitones, `velocity` is 0-127.
    fn init(&mut self, patch: &Patch, pitch: i16, velocity: u8);

    /// Applies a changed patch to a sounding note without restarting it.
    fn update(&mut self, patch: &Patch, pitch: i16, velocity: u8);

    fn update_pitch(&mut self, pitch: i16);

    /// Adds one frame of output to `buffer`. Returns false once the note has
    /// decayed to silence after its release.
    fn compute(
        &mut self,
        buffer: &mut [i32; N],
        lfo_value: i32,
        lfo_delay: i32,
        controllers: &Controllers,
    ) -> bool;

    fn keyup(&mut self);

    /// Resets all oscillator phases.
    fn osc_sync(&mut self);

    fn peek_status(&self, status: &mut VoiceStatus);
}

#[derive(Debug, Clone)]
pub struct FmNote {
    one_hz: f32,
    a0: f32,

    operator: [Operator; NUM_OPERATORS],
    operator_envelope: [OperatorEnvelope; NUM_OPERATORS],
    pitch_envelope: PitchEnvelope,

    routing: [Routing; NUM_OPERATORS],
    ratios: [f32; NUM_OPERATORS],
    level_offset: [f32; NUM_OPERATORS],
    rate_scaling: [f32; NUM_OPERATORS],
    amp_mod_sensitivity: [f32; NUM_OPERATORS],
    enabled: [bool; NUM_OPERATORS],
    feedback: u8,

    pitch_mod_depth: f32,
    pitch_mod_sensitivity: f32,
    amp_mod_depth: f32,
    transpose: f32,

    note: f32,
    gate: bool,
    feedback_state: [f32; 2],
}

impl FmNote {
    #[inline]
    pub fn gate(&self) -> bool {
        self.gate
    }

    /// Note currently played, in semitones.
    #[inline]
    pub fn note(&self) -> f32 {
        self.note
    }
}

impl NoteSynth for FmNote {
    fn new(sample_rate: f32) -> Self {
        let mut note = Self {
            one_hz: 1.0 / sample_rate,
            a0: 55.0 / sample_rate,

            operator: core::array::from_fn(|_| Operator::new()),
            operator_envelope: core::array::from_fn(|_| OperatorEnvelope::new()),
            pitch_envelope: PitchEnvelope::new(),

            routing: *algorithms::routing(0),
            ratios: [1.0; NUM_OPERATORS],
            level_offset: [0.0; NUM_OPERATORS],
            rate_scaling: [1.0; NUM_OPERATORS],
            amp_mod_sensitivity: [0.0; NUM_OPERATORS],
            enabled: [true; NUM_OPERATORS],
            feedback: 0,

            pitch_mod_depth: 0.0,
            pitch_mod_sensitivity: 0.0,
            amp_mod_depth: 0.0,
            transpose: 0.0,

            note: 60.0,
            gate: false,
            feedback_state: [0.0; 2],
        };

        for envelope in note.operator_envelope.iter_mut() {
            envelope.0.init(sample_rate);
        }
        note.pitch_envelope.0.init(sample_rate);

        note
    }

    fn init(&mut self, patch: &Patch, pitch: i16, velocity: u8) {
        self.update(patch, pitch, velocity);

        for envelope in self.operator_envelope.iter_mut() {
            envelope.0.trigger();
        }
        self.pitch_envelope.0.trigger();

        self.gate = true;
    }

    fn update(&mut self, patch: &Patch, pitch: i16, velocity: u8) {
        let key = pitch as f32 / 128.0;
        self.note = key;

        let velocity = normalize_velocity(velocity.min(127) as f32 / 127.0);

        self.pitch_envelope
            .set(&patch.pitch_envelope.rate, &patch.pitch_envelope.level);

        for (i, op) in patch.op.iter().enumerate() {
            let level = operator_level(op.level);
            self.operator_envelope[i].set(&op.envelope.rate, &op.envelope.level, level);

            // Keyboard plus velocity scaling may not push the operator past
            // the equivalent of level 99.
            let headroom = (127 - level) as f32;
            let scaling = keyboard_scaling(key, &op.keyboard_scaling)
                + velocity * op.velocity_sensitivity as f32;
            self.level_offset[i] = 0.125 * f32::min(scaling, headroom);

            self.ratios[i] = frequency_ratio(op);
            self.rate_scaling[i] = rate_scaling(key, op.rate_scaling);
            self.amp_mod_sensitivity[i] = amp_mod_sensitivity(op.amp_mod_sensitivity);
            self.enabled[i] = op.enabled;
        }

        self.routing = *algorithms::routing(patch.algorithm);
        self.feedback = patch.feedback;

        let modulations = &patch.modulations;
        self.pitch_mod_sensitivity = pitch_mod_sensitivity(modulations.pitch_mod_sensitivity);
        self.pitch_mod_depth = modulations.pitch_mod_depth as f32 * 0.01 * self.pitch_mod_sensitivity;
        self.amp_mod_depth = modulations.amp_mod_depth as f32 * 0.01;
        self.transpose = patch.transpose as f32 - 24.0;
    }

    fn update_pitch(&mut self, pitch: i16) {
        self.note = pitch as f32 / 128.0;
    }

    fn compute(
        &mut self,
        buffer: &mut [i32; N],
        lfo_value: i32,
        lfo_delay: i32,
        controllers: &Controllers,
    ) -> bool {
        let frame = N as f32;
        let lfo = lfo_value as f32 / Q24_ONE as f32;
        let delay = lfo_delay as f32 / Q24_ONE as f32;

        let pitch_depth = f32::max(
            self.pitch_mod_depth * delay,
            controllers.pitch_mod() * self.pitch_mod_sensitivity,
        );
        let pitch_mod = (lfo - 0.5) * pitch_depth;
        let amp_depth = f32::max(self.amp_mod_depth * delay, controllers.amp_mod());
        let amp_mod = f32::max((1.0 - lfo) * amp_depth, controllers.eg_mod());

        let pitch_envelope = self.pitch_envelope.0.render(frame);
        let note = self.note
            + self.transpose
            + controllers.pitch_offset()
            + (pitch_envelope + pitch_mod) * 12.0;
        let f0 = self.a0 * 0.25 * semitones_to_ratio(note - 9.0);

        let mut sounding = self.gate;

        for i in 0..NUM_OPERATORS {
            let f = self.ratios[i]
                * if self.ratios[i] < 0.0 {
                    -self.one_hz
                } else {
                    f0
                };

            let envelope = &mut self.operator_envelope[i].0;
            let level = envelope.render(frame * self.rate_scaling[i]) + self.level_offset[i];
            let log_level_mod = self.amp_mod_sensitivity[i] * amp_mod - 1.0;
            let level_mod = 1.0 - pow_2_fast(6.4 * log_level_mod, 2);
            let a = if self.enabled[i] {
                pow_2_fast(-14.0 + level * level_mod, 2)
            } else {
                0.0
            };

            if self.routing[i].is_carrier() && !(envelope.is_released() && a < SILENCE) {
                sounding = true;
            }

            self.operator[i].prepare(f, a, N);
        }

        let fb_scale = if self.feedback != 0 {
            (1 << self.feedback) as f32 / 512.0
        } else {
            0.0
        };
        let [mut previous_0, mut previous_1] = self.feedback_state;

        for sample in buffer.iter_mut() {
            // Bus 0 is the voice output, buses 1 and 2 carry modulation.
            let mut bus = [0.0; 3];

            for (op, routing) in self.operator.iter_mut().zip(self.routing.iter()) {
                let mut pm = match routing.input_bus() {
                    0 => 0.0,
                    input => bus[input],
                };
                if routing.feedback_in() {
                    pm += (previous_0 + previous_1) * fb_scale;
                }

                let out = op.next(pm);

                if routing.feedback_out() {
                    previous_1 = previous_0;
                    previous_0 = out;
                }

                let output = routing.output_bus();
                if routing.is_additive() {
                    bus[output] += out;
                } else {
                    bus[output] = out;
                }
            }

            *sample = sample.saturating_add((bus[0] * OUTPUT_SCALE) as i32);
        }

        self.feedback_state = [previous_0, previous_1];

        sounding
    }

    fn keyup(&mut self) {
        self.gate = false;

        for envelope in self.operator_envelope.iter_mut() {
            envelope.0.release();
        }
        self.pitch_envelope.0.release();
    }

    fn osc_sync(&mut self) {
        for op in self.operator.iter_mut() {
            op.phase = 0;
        }
        self.feedback_state = [0.0; 2];
    }

    fn peek_status(&self, status: &mut VoiceStatus) {
        for (i, envelope) in self.operator_envelope.iter().enumerate() {
            status.amp[i] = envelope.0.current_value();
            status.amp_step[i] = envelope.0.stage() as u8;
        }
        status.pitch_step = self.pitch_envelope.0.stage() as u8;
    }
}
