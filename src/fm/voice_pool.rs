//! Voice pool and note scheduler.
//!
//! A fixed array of [`MAX_ACTIVE_NOTES`] slots is allocated round-robin from a
//! rotating cursor. Note-offs carry no note identity: they release the first
//! held slot in array order.

use log::{debug, trace};

use super::controllers::Controllers;
use super::lfo::Lfo;
use super::note::{FmNote, NoteSynth, VoiceStatus};
use super::patch::Patch;
use super::{MAX_ACTIVE_NOTES, N};

/// Velocity scaling applied when velocity normalization is on (100 / 127).
pub const NORMALIZE_VELOCITY_RATIO: f32 = 0.7874015;

#[derive(Debug, Clone)]
pub struct Voice<V> {
    keydown: bool,
    sustained: bool,
    live: bool,
    velocity: u8,
    pitch: i16,
    synth: V,
}

impl<V: NoteSynth> Voice<V> {
    fn new(sample_rate: f32) -> Self {
        Self {
            keydown: false,
            sustained: false,
            live: false,
            velocity: 0,
            pitch: 0,
            synth: V::new(sample_rate),
        }
    }

    fn clear(&mut self) {
        self.keydown = false;
        self.sustained = false;
        self.live = false;
    }
}

impl<V> Voice<V> {
    /// The key is held.
    #[inline]
    pub fn keydown(&self) -> bool {
        self.keydown
    }

    /// The key was released while the sustain pedal was down.
    #[inline]
    pub fn sustained(&self) -> bool {
        self.sustained
    }

    /// The voice is rendered.
    #[inline]
    pub fn live(&self) -> bool {
        self.live
    }

    #[inline]
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    #[inline]
    pub fn pitch(&self) -> i16 {
        self.pitch
    }

    #[inline]
    pub fn synth(&self) -> &V {
        &self.synth
    }
}

#[derive(Debug)]
pub struct VoicePool<V: NoteSynth = FmNote> {
    voices: [Voice<V>; MAX_ACTIVE_NOTES],
    current_note: Option<usize>,
    last_note: Option<usize>,
    sustain: bool,
    normalize_velocity: bool,
}

impl<V: NoteSynth> VoicePool<V> {
    /// Creates an idle pool. The cursor stays unset until [`Self::reset`].
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: core::array::from_fn(|_| Voice::new(sample_rate)),
            current_note: None,
            last_note: None,
            sustain: false,
            normalize_velocity: false,
        }
    }

    /// Rebuilds every slot for `sample_rate` and arms the cursor.
    pub fn reset(&mut self, sample_rate: f32) {
        for voice in self.voices.iter_mut() {
            *voice = Voice::new(sample_rate);
        }
        self.current_note = Some(0);
        self.last_note = None;
        self.sustain = false;
    }

    /// Clears every slot and unsets the cursor.
    pub fn release(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.clear();
        }
        self.current_note = None;
        self.last_note = None;
    }

    /// Allocates a slot for a new note and returns its index.
    ///
    /// When every slot is held, the slot under the cursor (the oldest
    /// allocation) is stolen.
    pub fn keydown(&mut self, patch: &Patch, lfo: &mut Lfo, pitch: i16, velocity: u8) -> usize {
        let start = self.current_note.unwrap_or(0);

        let note = match (0..MAX_ACTIVE_NOTES)
            .map(|i| (start + i) % MAX_ACTIVE_NOTES)
            .find(|&n| !self.voices[n].keydown)
        {
            Some(note) => note,
            None => {
                debug!("All {} voices held, stealing voice {}", MAX_ACTIVE_NOTES, start);
                start
            }
        };

        self.current_note = Some((note + 1) % MAX_ACTIVE_NOTES);
        self.last_note = Some(note);
        lfo.keydown();

        let velocity = if self.normalize_velocity {
            (velocity as f32 * NORMALIZE_VELOCITY_RATIO) as u8
        } else {
            velocity
        };

        let voice = &mut self.voices[note];
        voice.velocity = velocity;
        voice.sustained = self.sustain;
        voice.keydown = true;
        voice.pitch = pitch;
        voice.synth.init(patch, pitch, velocity);

        if patch.osc_sync {
            voice.synth.osc_sync();
        }

        voice.live = true;

        note
    }

    /// Releases the first held slot. Returns its index, or `None` if no key
    /// was held.
    pub fn keyup(&mut self) -> Option<usize> {
        let Some(note) = self.voices.iter().position(|voice| voice.keydown) else {
            trace!("Note-off without a held voice");
            return None;
        };

        let voice = &mut self.voices[note];
        voice.keydown = false;

        if self.sustain {
            voice.sustained = true;
        } else {
            voice.synth.keyup();
        }

        Some(note)
    }

    /// Sets the sustain pedal. Lifting it releases every sustained voice
    /// whose key is up.
    pub fn set_sustain(&mut self, sustain: bool) {
        self.sustain = sustain;

        if !sustain {
            for voice in self.voices.iter_mut() {
                if voice.sustained && !voice.keydown {
                    voice.synth.keyup();
                }
                voice.sustained = false;
            }
        }
    }

    /// Silences every voice at once.
    pub fn panic(&mut self) {
        debug!("Panic, resetting all voices");

        for voice in self.voices.iter_mut() {
            voice.clear();
            voice.synth.osc_sync();
        }
    }

    /// Re-applies `patch` to every live voice.
    pub fn refresh(&mut self, patch: &Patch, pitch: i16) {
        for voice in self.voices.iter_mut().filter(|voice| voice.live) {
            voice.synth.update(patch, pitch, voice.velocity);
        }
    }

    /// Moves every slot to `pitch`, retuning live voices in place.
    pub fn update_pitch(&mut self, pitch: i16) {
        if self.voices[0].pitch == pitch {
            return;
        }

        for voice in self.voices.iter_mut() {
            voice.pitch = pitch;
            if voice.live {
                voice.synth.update_pitch(pitch);
            }
        }
    }

    /// Adds one frame of every live voice into `buffer`.
    pub fn compute(
        &mut self,
        buffer: &mut [i32; N],
        lfo_value: i32,
        lfo_delay: i32,
        controllers: &Controllers,
    ) {
        for voice in self.voices.iter_mut().filter(|voice| voice.live) {
            let sounding = voice
                .synth
                .compute(buffer, lfo_value, lfo_delay, controllers);

            if !sounding && !voice.keydown && !voice.sustained {
                voice.live = false;
            }
        }
    }

    /// Copies the status of the most representative voice into `status`.
    ///
    /// Searches backwards for a held voice, then for any live one. The walk
    /// starts at the slot before the cursor, the most recent allocation,
    /// rather than at the cursor itself, which points at the next slot to be
    /// filled. Returns false if the cursor is unset or nothing is sounding.
    pub fn peek_status(&self, status: &mut VoiceStatus) -> bool {
        let Some(current) = self.current_note else {
            return false;
        };

        let backwards =
            || (1..=MAX_ACTIVE_NOTES).map(move |i| (current + MAX_ACTIVE_NOTES - i) % MAX_ACTIVE_NOTES);

        let selected = backwards()
            .find(|&n| self.voices[n].keydown)
            .or_else(|| backwards().find(|&n| self.voices[n].live));

        match selected {
            Some(note) => {
                self.voices[note].synth.peek_status(status);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn set_normalize_velocity(&mut self, normalize: bool) {
        self.normalize_velocity = normalize;
    }

    #[inline]
    pub fn sustain(&self) -> bool {
        self.sustain
    }

    /// Slot the next allocation starts searching from.
    #[inline]
    pub fn current_note(&self) -> Option<usize> {
        self.current_note
    }

    /// Slot allocated by the latest [`Self::keydown`].
    #[inline]
    pub fn last_note(&self) -> Option<usize> {
        self.last_note
    }

    #[inline]
    pub fn voices(&self) -> &[Voice<V>; MAX_ACTIVE_NOTES] {
        &self.voices
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|voice| voice.live).count()
    }
}
