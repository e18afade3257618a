//! Two-voice chord resonator.
//!
//! Eight comb filters (two voices with four harmonics each) are excited by a
//! filtered noise burst and by the external input through a long diffusion
//! delay. Every rising trigger edge swaps the voice that follows the pitch
//! control, so consecutive notes ring out against each other.

// Based on MIT-licensed code (c) 2014 by Olivier Gillet (ol.gillet@gmail.com)

use super::{required_size, DataFormat12Bit, DelayMemory, FxContext};
use crate::error::Error;
use crate::utils::random::Random;
use crate::utils::{interpolate_plateau, semitones_to_ratio};

/// Longest comb delay in samples.
pub const MAX_COMB: usize = 1000;

/// Length of the comb shaping the noise burst.
pub const BURST_COMB_LENGTH: usize = 200;

/// Length of the diffusion delay feeding the combs.
pub const FEEDBACK_DELAY_LENGTH: usize = 4000;

/// Frequency of the fundamental comb at a pitch of 0 semitones.
pub const BASE_PITCH: f32 = 220.0;

pub const NUM_VOICES: usize = 2;
pub const NUM_HARMONICS: usize = 4;

/// Chord interval tables, in semitones above the fundamental, one per
/// upper harmonic. Indexed by the chord control over 16 steps.
pub const CHORDS: [[f32; 18]; 3] = [
    [
        0.0,
        4.0 / 128.0,
        16.0 / 128.0,
        4.0 / 128.0,
        4.0 / 128.0,
        12.0,
        12.0,
        4.0,
        4.0,
        3.0,
        3.0,
        2.0,
        4.0,
        3.0,
        4.0,
        3.0,
        4.0,
        4.0,
    ],
    [
        0.0,
        8.0 / 128.0,
        32.0 / 128.0,
        7.0,
        12.0,
        24.0,
        7.0,
        7.0,
        7.0,
        7.0,
        7.0,
        7.0,
        7.0,
        7.0,
        7.0,
        7.0,
        7.0,
        7.0,
    ],
    [
        0.0,
        12.0 / 128.0,
        48.0 / 128.0,
        7.0 + 4.0 / 128.0,
        12.0 + 4.0 / 128.0,
        36.0,
        19.0,
        12.0,
        11.0,
        10.0,
        12.0,
        12.0,
        12.0,
        14.0,
        14.0,
        16.0,
        16.0,
        16.0,
    ],
];

const CHORD_STEPS: f32 = 16.0;

// Offset of the output taps, the oldest sample a comb line holds.
const OUTPUT_TAP: usize = MAX_COMB - 1;

const TAP_GAIN: [f32; NUM_HARMONICS] = [0.20, 0.23, 0.27, 0.30];

// Delay line indices inside the memory.
const COMB: [[usize; NUM_VOICES]; NUM_HARMONICS] = [[0, 6], [1, 7], [2, 8], [3, 9]];
const BURST_COMB: usize = 4;
const FEEDBACK_DELAY: usize = 5;

const NUM_LINES: usize = 10;

const LINE_LENGTHS: [usize; NUM_LINES] = [
    MAX_COMB,
    MAX_COMB,
    MAX_COMB,
    MAX_COMB,
    BURST_COMB_LENGTH,
    FEEDBACK_DELAY_LENGTH,
    MAX_COMB,
    MAX_COMB,
    MAX_COMB,
    MAX_COMB,
];

pub const MEMORY_SIZE: usize = required_size(&LINE_LENGTHS);

/// Stereo sample pair, nominal range -1.0..1.0.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FloatFrame {
    pub l: f32,
    pub r: f32,
}

impl FloatFrame {
    pub fn new(l: f32, r: f32) -> Self {
        Self { l, r }
    }
}

#[derive(Debug)]
pub struct Resonator {
    memory: DelayMemory<MEMORY_SIZE, NUM_LINES, DataFormat12Bit>,
    random: Random,
    comb_scale: f32,

    feedback: f32,
    damp: f32,
    base_pitch: f32,
    chord: f32,
    spread_amount: f32,
    stereo: f32,
    separation: f32,
    burst_time: f32,
    burst_damp: f32,
    burst_comb: f32,
    burst_duration: f32,

    pitch: [f32; NUM_VOICES],
    comb_delay: [[f32; NUM_VOICES]; NUM_HARMONICS],
    spread_delay: [f32; 3],

    burst_lp: [f32; 2],
    lp: [[f32; NUM_VOICES]; NUM_HARMONICS],

    trigger: bool,
    previous_trigger: bool,
    voice: usize,
}

impl Resonator {
    /// Creates a resonator drawing its noise and diffusion offsets from
    /// `random`.
    pub fn new(random: Random) -> Result<Self, Error> {
        Ok(Self {
            memory: DelayMemory::new(LINE_LENGTHS)?,
            random,
            comb_scale: 0.0,

            feedback: 0.0,
            damp: 0.0,
            base_pitch: 0.0,
            chord: 0.0,
            spread_amount: 0.0,
            stereo: 0.0,
            separation: 0.0,
            burst_time: 0.0,
            burst_damp: 0.0,
            burst_comb: 0.0,
            burst_duration: 0.0,

            pitch: [0.0; NUM_VOICES],
            comb_delay: [[0.0; NUM_VOICES]; NUM_HARMONICS],
            spread_delay: [0.0; 3],

            burst_lp: [0.0; 2],
            lp: [[0.0; NUM_VOICES]; NUM_HARMONICS],

            trigger: false,
            previous_trigger: false,
            voice: 0,
        })
    }

    pub fn init(&mut self, sample_rate: f32) {
        self.memory.clear();
        self.comb_scale = sample_rate / BASE_PITCH;

        self.feedback = 0.0;
        self.damp = 0.6;
        self.base_pitch = 0.0;
        self.chord = 0.0;
        self.spread_amount = 0.0;
        self.stereo = 0.0;
        self.separation = 0.0;
        self.burst_time = 0.0;
        self.burst_damp = 1.0;
        self.burst_comb = 1.0;
        self.burst_duration = 0.0;

        self.pitch = [0.0; NUM_VOICES];
        self.burst_lp = [0.0; 2];
        self.lp = [[0.0; NUM_VOICES]; NUM_HARMONICS];

        self.trigger = false;
        self.previous_trigger = false;
        self.voice = 0;

        for spread in self.spread_delay.iter_mut() {
            *spread = self.random.get_float() * (FEEDBACK_DELAY_LENGTH - 1) as f32;
        }

        self.update_comb_delays();
    }

    /// Processes a block of stereo frames in place.
    pub fn process(&mut self, in_out: &mut [FloatFrame]) {
        let rising_edge = self.trigger && !self.previous_trigger;
        self.previous_trigger = self.trigger;

        if rising_edge {
            self.voice = 1 - self.voice;
        }

        self.pitch[self.voice] = self.base_pitch;
        self.update_comb_delays();

        if rising_edge {
            self.burst_time = self.comb_delay[0][self.voice] * 2.0 * self.burst_duration;

            for spread in self.spread_delay.iter_mut() {
                *spread = self.random.get_float() * (FEEDBACK_DELAY_LENGTH - 1) as f32;
            }
        }

        // Output weights per channel, harmonic and voice. Each channel
        // attenuates one voice by the separation amount.
        let mut gain = [[[0.0; NUM_VOICES]; NUM_HARMONICS]; 2];
        for (channel, channel_gain) in gain.iter_mut().enumerate() {
            for (harmonic, harmonic_gain) in channel_gain.iter_mut().enumerate() {
                for (voice, g) in harmonic_gain.iter_mut().enumerate() {
                    let wide = (harmonic % 2 == 1) ^ (channel != voice);
                    let stereo = if wide { 1.0 + self.stereo } else { 1.0 - self.stereo };
                    let separation = if channel == voice {
                        1.0 - self.separation
                    } else {
                        1.0
                    };
                    *g = TAP_GAIN[harmonic] * stereo * separation;
                }
            }
        }

        let comb_fb = 0.6 - self.burst_comb * 0.4;
        let comb_del = f32::max(self.burst_comb * BURST_COMB_LENGTH as f32, 1.0);

        let mut c = FxContext::new();

        for frame in in_out.iter_mut() {
            self.memory.start(&mut c);

            self.burst_time = f32::max(self.burst_time - 1.0, 0.0);
            let burst_gain = if self.burst_time > 0.0 { 1.0 } else { 0.0 };

            // Burst noise through a short comb and two low-pass stages.
            c.read(self.random.get_float() * 2.0 - 1.0, burst_gain);
            c.interpolate_hermite(&self.memory, BURST_COMB, comb_del, comb_fb);
            c.write_line(&mut self.memory, BURST_COMB, 1.0);
            c.lp(&mut self.burst_lp[0], self.burst_damp);
            c.lp(&mut self.burst_lp[1], self.burst_damp);

            c.read(frame.l + frame.r, 1.0);
            c.write_line(&mut self.memory, FEEDBACK_DELAY, 0.0);

            for voice in 0..NUM_VOICES {
                let excitation = if voice == self.voice { 1.0 } else { 0.0 };

                for harmonic in 0..NUM_HARMONICS {
                    let spread = if harmonic == 0 {
                        0.0
                    } else {
                        self.spread_delay[harmonic - 1] * self.spread_amount
                    };
                    let spread = (spread.max(0.0) as usize).min(FEEDBACK_DELAY_LENGTH);
                    let line = COMB[harmonic][voice];

                    c.load(0.0);
                    c.read_line(&self.memory, FEEDBACK_DELAY, spread, excitation);
                    c.interpolate_hermite(
                        &self.memory,
                        line,
                        self.comb_delay[harmonic][voice],
                        self.feedback,
                    );
                    c.lp(&mut self.lp[harmonic][voice], self.damp);
                    c.write_line(&mut self.memory, line, 0.0);
                }
            }

            // Output taps sit at the tail of each comb line.
            for (channel, out) in [&mut frame.l, &mut frame.r].into_iter().enumerate() {
                for harmonic in 0..NUM_HARMONICS {
                    for voice in 0..NUM_VOICES {
                        c.read_line(
                            &self.memory,
                            COMB[harmonic][voice],
                            OUTPUT_TAP,
                            gain[channel][harmonic][voice],
                        );
                    }
                }
                c.write(out, 0.0);
            }
        }
    }

    fn update_comb_delays(&mut self) {
        let max_comb = MAX_COMB as f32;
        let mut intervals = [0.0; NUM_HARMONICS];
        for (interval, table) in intervals[1..].iter_mut().zip(CHORDS.iter()) {
            *interval = interpolate_plateau(table, self.chord, CHORD_STEPS);
        }

        for voice in 0..NUM_VOICES {
            let fundamental =
                (self.comb_scale / semitones_to_ratio(self.pitch[voice])).clamp(0.0, max_comb);
            self.comb_delay[0][voice] = fundamental;

            for harmonic in 1..NUM_HARMONICS {
                self.comb_delay[harmonic][voice] =
                    (fundamental / semitones_to_ratio(intervals[harmonic])).clamp(0.0, max_comb);
            }
        }
    }

    /// Pitch of the active voice, in semitones relative to 220 Hz.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.base_pitch = pitch;
    }

    pub fn set_trigger(&mut self, trigger: bool) {
        self.trigger = trigger;
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback;
    }

    pub fn set_damp(&mut self, damp: f32) {
        self.damp = damp;
    }

    pub fn set_burst_damp(&mut self, burst_damp: f32) {
        self.burst_damp = burst_damp;
    }

    pub fn set_burst_comb(&mut self, burst_comb: f32) {
        self.burst_comb = burst_comb;
    }

    pub fn set_burst_duration(&mut self, burst_duration: f32) {
        self.burst_duration = burst_duration;
    }

    pub fn set_chord(&mut self, chord: f32) {
        self.chord = chord;
    }

    pub fn set_spread_amount(&mut self, spread_amount: f32) {
        self.spread_amount = spread_amount;
    }

    pub fn set_stereo(&mut self, stereo: f32) {
        self.stereo = stereo;
    }

    pub fn set_separation(&mut self, separation: f32) {
        self.separation = separation;
    }

    /// Index of the voice currently following the pitch control.
    #[inline]
    pub fn active_voice(&self) -> usize {
        self.voice
    }

    /// Remaining burst length in samples.
    #[inline]
    pub fn burst_countdown(&self) -> f32 {
        self.burst_time
    }

    #[inline]
    pub fn diffusion_offsets(&self) -> [f32; 3] {
        self.spread_delay
    }

    /// Comb delays in samples, indexed by harmonic then voice, as computed
    /// for the last processed block.
    #[inline]
    pub fn comb_delays(&self) -> [[f32; NUM_VOICES]; NUM_HARMONICS] {
        self.comb_delay
    }

    #[inline]
    pub fn memory_size(&self) -> usize {
        self.memory.capacity()
    }
}
