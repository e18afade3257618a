//! DX7-compatible LFO shared by all voices.
//!
//! The LFO runs at frame rate: [`Lfo::get_sample`] and [`Lfo::get_delay`] are
//! each called once per synthesis frame of [`N`] samples.

// Based on MIT-licensed code (c) 2021 by Emilie Gillet (emilie.o.gillet@gmail.com)

use super::dx_units::{lfo_delay, lfo_frequency};
use super::patch::ModulationParameters;
use super::{N, Q24_ONE};
use crate::utils::random::Random;
use crate::utils::sine::sine_pm;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    #[default]
    Triangle,

    RampDown,
    RampUp,
    Square,
    Sine,
    SAndH,
}

impl From<u8> for Waveform {
    fn from(value: u8) -> Self {
        match value {
            1 => Waveform::RampDown,
            2 => Waveform::RampUp,
            3 => Waveform::Square,
            4 => Waveform::Sine,
            5 => Waveform::SAndH,
            _ => Waveform::Triangle,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Lfo {
    phase: f32,
    frequency: f32,
    delay_phase: f32,
    delay_increment: [f32; 2],

    random: Random,
    random_value: f32,
    frame_duration: f32,

    waveform: Waveform,
    sync: bool,
}

impl Lfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self, sample_rate: f32) {
        self.phase = 0.0;
        self.frequency = 0.0;
        self.delay_phase = 0.0;
        self.delay_increment = [0.0; 2];
        self.random = Random::default();
        self.random_value = 0.0;
        self.frame_duration = N as f32 / sample_rate;
        self.waveform = Waveform::Triangle;
        self.sync = false;
    }

    /// Loads rate, delay, sync and waveform from the patch LFO block and
    /// restarts the LFO.
    pub fn reset(&mut self, params: &[u8]) {
        let modulations = ModulationParameters::unpack(params);

        self.frequency = lfo_frequency(modulations.rate) * self.frame_duration;

        let [hold, fade] = lfo_delay(modulations.delay);
        self.delay_increment = [hold * self.frame_duration, fade * self.frame_duration];

        self.waveform = Waveform::from(modulations.waveform);
        self.sync = modulations.sync;

        self.phase = 0.0;
        self.delay_phase = 0.0;
    }

    /// Notifies the LFO of a new note.
    pub fn keydown(&mut self) {
        if self.sync {
            self.phase = 0.0;
        }
        self.delay_phase = 0.0;
    }

    /// Advances the LFO by one frame and returns its value, 0 to `1 << 24`.
    pub fn get_sample(&mut self) -> i32 {
        self.phase += self.frequency;

        if self.phase >= 1.0 {
            self.phase -= self.phase as i32 as f32;
            self.random_value = self.random.get_float();
        }

        (self.value() * Q24_ONE as f32) as i32
    }

    /// Advances the delay ramp by one frame and returns it, 0 to `1 << 24`.
    pub fn get_delay(&mut self) -> i32 {
        let increment = self.delay_increment[if self.delay_phase < 0.5 { 0 } else { 1 }];
        self.delay_phase = f32::min(self.delay_phase + increment, 1.0);

        let ramp = if self.delay_phase < 0.5 {
            0.0
        } else {
            (self.delay_phase - 0.5) * 2.0
        };

        (ramp * Q24_ONE as f32) as i32
    }

    #[inline]
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    #[inline]
    fn value(&self) -> f32 {
        match self.waveform {
            Waveform::Triangle => {
                2.0 * (if self.phase < 0.5 {
                    0.5 - self.phase
                } else {
                    self.phase - 0.5
                })
            }
            Waveform::RampDown => 1.0 - self.phase,
            Waveform::RampUp => self.phase,
            Waveform::Square => {
                if self.phase < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
            Waveform::Sine => {
                let phase = ((self.phase + 0.5) * 4294967296.0) as u64 as u32;
                0.5 + 0.5 * sine_pm(phase, 0.0)
            }
            Waveform::SAndH => self.random_value,
        }
    }
}
