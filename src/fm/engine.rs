//! Block renderer for the FM voice pool.
//!
//! Voices are synthesized in frames of [`N`] samples while the host may ask for
//! any number of samples per call. Samples synthesized past the end of a
//! request are held in a carry buffer and returned first by the next call, so
//! the output stream is identical however it is split into blocks.

// Based on MIT-licensed code (c) 2021 by Emilie Gillet (emilie.o.gillet@gmail.com)

use log::debug;

use super::controllers::Controllers;
use super::lfo::Lfo;
use super::note::{FmNote, NoteSynth, VoiceStatus};
use super::patch::{Patch, INIT_VOICE, LFO_SIZE, OFFSET_LFO, PATCH_SIZE};
use super::voice_pool::VoicePool;
use super::{N, OUTPUT_SHIFT};
use crate::error::Error;
use crate::utils::{clip_16, sine};

#[derive(Debug)]
pub struct FmEngine<V: NoteSynth = FmNote> {
    sample_rate: f32,

    pool: VoicePool<V>,
    lfo: Lfo,
    controllers: Controllers,

    patch_data: [u8; PATCH_SIZE],
    patch: Patch,

    carry: [i16; N],
    carry_len: usize,

    pitch: i16,
    velocity: u8,
    gate: bool,
    note_start: bool,
    refresh_voice: bool,

    voice_status: VoiceStatus,
}

impl<V: NoteSynth> FmEngine<V> {
    /// Creates an engine ready to play the built-in patch.
    pub fn new(sample_rate: f32) -> Self {
        let mut engine = Self {
            sample_rate,

            pool: VoicePool::new(sample_rate),
            lfo: Lfo::new(),
            controllers: Controllers::default(),

            patch_data: INIT_VOICE,
            patch: Patch::new(),

            carry: [0; N],
            carry_len: 0,

            pitch: 60 << 7,
            velocity: 127,
            gate: false,
            note_start: false,
            refresh_voice: false,

            voice_status: VoiceStatus::default(),
        };
        engine.prepare_to_play(sample_rate);
        engine
    }

    /// Resets voices, controllers and carry buffer, and loads the built-in
    /// patch.
    pub fn prepare_to_play(&mut self, sample_rate: f32) {
        sine::init();

        self.sample_rate = sample_rate;
        self.pool.reset(sample_rate);
        self.lfo.init(sample_rate);
        self.controllers = Controllers::default();

        self.patch_data = INIT_VOICE;
        self.patch.unpack(&self.patch_data);
        self.lfo.reset(&self.patch_data[OFFSET_LFO..OFFSET_LFO + LFO_SIZE]);

        self.carry_len = 0;
        self.gate = false;
        self.note_start = false;
        self.refresh_voice = false;
    }

    /// Silences every voice and unsets the scheduler cursor.
    pub fn release_resources(&mut self) {
        debug!("Releasing FM engine resources");

        self.pool.release();
        self.carry_len = 0;
        self.gate = false;
        self.note_start = false;
    }

    /// Replaces the whole patch. Sounding voices pick it up on the next render.
    pub fn load_patch(&mut self, data: &[u8]) -> Result<(), Error> {
        let data: &[u8; PATCH_SIZE] = data.try_into().map_err(|_| Error::PatchSize {
            expected: PATCH_SIZE,
            actual: data.len(),
        })?;

        self.patch_data = *data;
        self.patch.unpack(&self.patch_data);
        self.refresh_voice = true;

        let name = core::str::from_utf8(&self.patch.name).unwrap_or("");
        debug!("Loaded patch \"{}\"", name.trim_end());

        Ok(())
    }

    /// Writes a single patch byte.
    pub fn set_parameter(&mut self, offset: usize, value: u8) -> Result<(), Error> {
        let byte = self
            .patch_data
            .get_mut(offset)
            .ok_or(Error::ParameterOffset {
                offset,
                size: PATCH_SIZE,
            })?;

        *byte = value;
        self.patch.unpack(&self.patch_data);
        self.refresh_voice = true;

        Ok(())
    }

    /// Sets the played pitch, in 1/128 semitones.
    #[inline]
    pub fn set_pitch(&mut self, pitch: i16) {
        self.pitch = pitch;
    }

    /// Sets the gate. A rising edge starts a note on the next render, a low
    /// gate releases it.
    pub fn set_gate(&mut self, gate: bool) {
        if gate && !self.gate {
            self.note_start = true;
        }
        self.gate = gate;
    }

    /// Requests a new note on the next render regardless of the gate.
    #[inline]
    pub fn note_on(&mut self) {
        self.note_start = true;
    }

    #[inline]
    pub fn set_velocity(&mut self, velocity: u8) {
        self.velocity = velocity.min(127);
    }

    #[inline]
    pub fn set_normalize_velocity(&mut self, normalize: bool) {
        self.pool.set_normalize_velocity(normalize);
    }

    #[inline]
    pub fn set_sustain(&mut self, sustain: bool) {
        self.pool.set_sustain(sustain);
    }

    #[inline]
    pub fn panic(&mut self) {
        self.pool.panic();
    }

    /// Starts a note at the current pitch and velocity.
    pub fn keydown(&mut self) -> usize {
        self.pool
            .keydown(&self.patch, &mut self.lfo, self.pitch, self.velocity)
    }

    /// Releases the first held note.
    pub fn keyup(&mut self) -> Option<usize> {
        self.pool.keyup()
    }

    /// Fills `out` with the next `out.len()` samples.
    ///
    /// `_sync` is reserved for oscillator sync input and currently unused.
    pub fn render(&mut self, _sync: &[u8], out: &mut [i16]) {
        let size = out.len();

        if self.refresh_voice {
            self.pool.refresh(&self.patch, self.pitch);
            self.lfo.reset(&self.patch_data[OFFSET_LFO..OFFSET_LFO + LFO_SIZE]);
            self.refresh_voice = false;
        }

        self.pool.update_pitch(self.pitch);

        if !self.gate && self.last_note_held() {
            self.keyup();
        } else if self.note_start {
            self.keydown();
            self.note_start = false;
        }

        let flushed = size.min(self.carry_len);
        out[..flushed].copy_from_slice(&self.carry[..flushed]);

        if self.carry_len > size {
            self.carry.copy_within(size..self.carry_len, 0);
            self.carry_len -= size;
            return;
        }

        let mut i = flushed;
        while i < size {
            let mut frame = [0i32; N];

            let lfo_value = self.lfo.get_sample();
            let lfo_delay = self.lfo.get_delay();
            self.pool
                .compute(&mut frame, lfo_value, lfo_delay, &self.controllers);

            let remaining = size - i;
            for (j, &acc) in frame.iter().enumerate() {
                let sample = clip_16(acc >> OUTPUT_SHIFT) as i16;
                if j < remaining {
                    out[i + j] = sample;
                } else {
                    self.carry[j - remaining] = sample;
                }
            }

            i += N;
        }

        self.carry_len = i - size;
    }

    /// Snapshot of the most representative voice, if any is sounding.
    ///
    /// The snapshot is overwritten in place by the next call.
    pub fn peek_voice_status(&mut self) -> Option<&VoiceStatus> {
        if self.pool.peek_status(&mut self.voice_status) {
            Some(&self.voice_status)
        } else {
            None
        }
    }

    #[inline]
    pub fn controllers(&self) -> &Controllers {
        &self.controllers
    }

    #[inline]
    pub fn controllers_mut(&mut self) -> &mut Controllers {
        &mut self.controllers
    }

    #[inline]
    pub fn pool(&self) -> &VoicePool<V> {
        &self.pool
    }

    #[inline]
    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    #[inline]
    pub fn patch_data(&self) -> &[u8; PATCH_SIZE] {
        &self.patch_data
    }

    /// Number of samples waiting in the carry buffer, always below [`N`].
    #[inline]
    pub fn carry_len(&self) -> usize {
        self.carry_len
    }

    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn last_note_held(&self) -> bool {
        self.pool
            .last_note()
            .is_some_and(|note| self.pool.voices()[note].keydown())
    }
}
