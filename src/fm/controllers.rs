//! Performance controllers shared by every voice.
//!
//! Written by the control decoding layer, read by each live voice once per
//! frame. Derived modulation amounts are only recomputed by
//! [`Controllers::refresh`], which every setter calls.

#[allow(unused_imports)]
use num_traits::float::Float;

pub const PITCH_BEND_CENTER: u16 = 0x2000;
pub const PITCH_BEND_MAX: u16 = 0x3FFF;

/// Where a continuous controller is routed to, and how strongly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModulationRouting {
    /// Depth, 0-99.
    pub range: u8,
    pub pitch: bool,
    pub amp: bool,
    pub eg: bool,
}

impl ModulationRouting {
    pub const fn new(range: u8, pitch: bool, amp: bool, eg: bool) -> Self {
        Self {
            range,
            pitch,
            amp,
            eg,
        }
    }

    #[inline]
    fn amount(&self, cc: u8) -> f32 {
        (cc.min(127) as f32 / 127.0) * (self.range.min(99) as f32 / 99.0)
    }
}

#[derive(Debug, Clone)]
pub struct Controllers {
    /// 14-bit pitch bend, centred at [`PITCH_BEND_CENTER`].
    pub pitch_bend: u16,
    /// Bend range in semitones.
    pub pitch_range: u8,
    /// Bend quantization in semitones, 0 for continuous bends.
    pub pitch_step: u8,
    /// Global tuning offset in cents.
    pub master_tune: i16,

    pub modwheel_cc: u8,
    pub breath_cc: u8,
    pub foot_cc: u8,
    pub aftertouch_cc: u8,

    pub wheel: ModulationRouting,
    pub breath: ModulationRouting,
    pub foot: ModulationRouting,
    pub aftertouch: ModulationRouting,

    pitch_mod: f32,
    amp_mod: f32,
    eg_mod: f32,
}

impl Default for Controllers {
    fn default() -> Self {
        let mut controllers = Self {
            pitch_bend: PITCH_BEND_CENTER,
            pitch_range: 3,
            pitch_step: 0,
            master_tune: 0,

            modwheel_cc: 0,
            breath_cc: 0,
            foot_cc: 0,
            aftertouch_cc: 0,

            wheel: ModulationRouting::new(99, true, false, false),
            breath: ModulationRouting::new(99, false, true, false),
            foot: ModulationRouting::default(),
            aftertouch: ModulationRouting::new(99, true, false, false),

            pitch_mod: 0.0,
            amp_mod: 0.0,
            eg_mod: 0.0,
        };
        controllers.refresh();
        controllers
    }
}

impl Controllers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the modulation amounts from the controller values.
    pub fn refresh(&mut self) {
        self.pitch_mod = 0.0;
        self.amp_mod = 0.0;
        self.eg_mod = 0.0;

        let sources = [
            (self.modwheel_cc, self.wheel),
            (self.breath_cc, self.breath),
            (self.foot_cc, self.foot),
            (self.aftertouch_cc, self.aftertouch),
        ];

        for (cc, routing) in sources {
            let amount = routing.amount(cc);
            if routing.pitch {
                self.pitch_mod += amount;
            }
            if routing.amp {
                self.amp_mod += amount;
            }
            if routing.eg {
                self.eg_mod += amount;
            }
        }

        self.pitch_mod = self.pitch_mod.min(1.0);
        self.amp_mod = self.amp_mod.min(1.0);
        self.eg_mod = self.eg_mod.min(1.0);
    }

    pub fn set_pitch_bend(&mut self, value: u16) {
        self.pitch_bend = value.min(PITCH_BEND_MAX);
    }

    pub fn set_mod_wheel(&mut self, value: u8) {
        self.modwheel_cc = value.min(127);
        self.refresh();
    }

    pub fn set_breath(&mut self, value: u8) {
        self.breath_cc = value.min(127);
        self.refresh();
    }

    pub fn set_foot(&mut self, value: u8) {
        self.foot_cc = value.min(127);
        self.refresh();
    }

    pub fn set_aftertouch(&mut self, value: u8) {
        self.aftertouch_cc = value.min(127);
        self.refresh();
    }

    /// Depth of LFO pitch modulation requested by the controllers, 0.0-1.0.
    #[inline]
    pub fn pitch_mod(&self) -> f32 {
        self.pitch_mod
    }

    /// Depth of LFO amplitude modulation requested by the controllers, 0.0-1.0.
    #[inline]
    pub fn amp_mod(&self) -> f32 {
        self.amp_mod
    }

    /// Envelope bias (attenuation of modulation-sensitive operators), 0.0-1.0.
    #[inline]
    pub fn eg_mod(&self) -> f32 {
        self.eg_mod
    }

    /// Current bend in semitones, quantized to the pitch step if set.
    pub fn pitch_bend_semitones(&self) -> f32 {
        let bend = (self.pitch_bend as f32 - PITCH_BEND_CENTER as f32)
            / PITCH_BEND_CENTER as f32
            * self.pitch_range as f32;

        if self.pitch_step > 0 {
            let step = self.pitch_step as f32;
            Float::round(bend / step) * step
        } else {
            bend
        }
    }

    /// Bend plus master tune, in semitones.
    #[inline]
    pub fn pitch_offset(&self) -> f32 {
        self.pitch_bend_semitones() + self.master_tune as f32 * 0.01
    }
}
