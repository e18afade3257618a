//! DX7 voice patch in the 155-byte "unpacked" layout, extended by operator
//! enable flags.
//!
//! The engine stores the raw bytes and hands out a decoded [`Patch`]. The
//! six operator blocks come first, in the order operator 6 down to operator 1,
//! followed by the global parameters and six operator enable bytes in the
//! same operator order.

use crate::error::Error;

pub const PATCH_SIZE: usize = 161;

/// Size of one operator block.
pub const OPERATOR_SIZE: usize = 21;

pub const OFFSET_PITCH_ENVELOPE: usize = 126;
pub const OFFSET_ALGORITHM: usize = 134;
pub const OFFSET_FEEDBACK: usize = 135;
pub const OFFSET_OSC_SYNC: usize = 136;
/// Start of the LFO block: rate, delay, pitch depth, amp depth, sync, waveform.
pub const OFFSET_LFO: usize = 137;
pub const LFO_SIZE: usize = 6;
pub const OFFSET_PITCH_MOD_SENSITIVITY: usize = 143;
pub const OFFSET_TRANSPOSE: usize = 144;
pub const OFFSET_NAME: usize = 145;
pub const OFFSET_OPERATOR_ENABLE: usize = 155;

/// "BRASS 1", loaded when the engine starts.
pub const INIT_VOICE: [u8; PATCH_SIZE] = [
    49, 99, 28, 68, 98, 98, 91, 0, 39, 54, 50, 1, 1, 4, 0, 2, 82, 0, 1, 0, 7, //
    77, 36, 41, 71, 99, 98, 98, 0, 39, 0, 0, 3, 3, 0, 0, 2, 98, 0, 1, 0, 8, //
    77, 36, 41, 71, 99, 98, 98, 0, 39, 0, 0, 3, 3, 0, 0, 2, 99, 0, 1, 0, 7, //
    77, 76, 82, 71, 99, 98, 98, 0, 39, 0, 0, 3, 3, 0, 0, 2, 99, 0, 1, 0, 5, //
    62, 51, 29, 71, 82, 95, 96, 0, 27, 0, 7, 3, 1, 0, 0, 0, 86, 0, 0, 0, 14, //
    72, 76, 99, 71, 99, 88, 96, 0, 39, 0, 14, 3, 3, 0, 0, 0, 98, 0, 0, 0, 14, //
    84, 95, 95, 60, 50, 50, 50, 50, 21, 7, 1, 37, 0, 5, 0, 0, 4, 3, 24, 66, 82, //
    65, 83, 83, 32, 32, 32, 49, 32, 1, 1, 1, 1, 1, 1,
];

#[derive(Debug, Default, Clone)]
pub struct Patch {
    /// Operators in computation order (operator 6 first).
    pub op: [Operator; 6],
    pub pitch_envelope: Envelope,
    pub algorithm: u8,
    pub feedback: u8,
    pub osc_sync: bool,
    pub modulations: ModulationParameters,
    pub transpose: u8,
    pub name: [u8; 10],
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a patch, clamping every field to its legal range.
    pub fn unpack(&mut self, data: &[u8; PATCH_SIZE]) {
        for (i, op) in self.op.iter_mut().enumerate() {
            let op_data = &data[i * OPERATOR_SIZE..(i + 1) * OPERATOR_SIZE];

            for j in 0..4 {
                op.envelope.rate[j] = op_data[j].min(99);
                op.envelope.level[j] = op_data[4 + j].min(99);
            }

            op.keyboard_scaling.break_point = op_data[8].min(99);
            op.keyboard_scaling.left_depth = op_data[9].min(99);
            op.keyboard_scaling.right_depth = op_data[10].min(99);
            op.keyboard_scaling.left_curve = op_data[11] & 0x03;
            op.keyboard_scaling.right_curve = op_data[12] & 0x03;

            op.rate_scaling = op_data[13].min(7);
            op.amp_mod_sensitivity = op_data[14] & 0x03;
            op.velocity_sensitivity = op_data[15].min(7);
            op.level = op_data[16].min(99);
            op.mode = op_data[17] & 0x01;
            op.coarse = op_data[18] & 0x1F;
            op.fine = op_data[19].min(99);
            op.detune = op_data[20].min(14);
            op.enabled = data[OFFSET_OPERATOR_ENABLE + i] != 0;
        }

        for j in 0..4 {
            self.pitch_envelope.rate[j] = data[OFFSET_PITCH_ENVELOPE + j].min(99);
            self.pitch_envelope.level[j] = data[OFFSET_PITCH_ENVELOPE + 4 + j].min(99);
        }

        self.algorithm = data[OFFSET_ALGORITHM] & 0x1F;
        self.feedback = data[OFFSET_FEEDBACK] & 0x07;
        self.osc_sync = data[OFFSET_OSC_SYNC] != 0;

        self.modulations = ModulationParameters::unpack(&data[OFFSET_LFO..]);
        self.modulations.pitch_mod_sensitivity = data[OFFSET_PITCH_MOD_SENSITIVITY] & 0x07;

        self.transpose = data[OFFSET_TRANSPOSE].min(48);

        for (i, c) in self.name.iter_mut().enumerate() {
            *c = data[OFFSET_NAME + i] & 0x7F;
        }
    }

    /// Decodes a patch from a byte slice of exactly [`PATCH_SIZE`] bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let data: &[u8; PATCH_SIZE] = data.try_into().map_err(|_| Error::PatchSize {
            expected: PATCH_SIZE,
            actual: data.len(),
        })?;

        let mut patch = Self::new();
        patch.unpack(data);
        Ok(patch)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Envelope {
    pub rate: [u8; 4],
    pub level: [u8; 4],
}

#[derive(Debug, Default, Clone)]
pub struct KeyboardScaling {
    pub left_depth: u8,
    pub right_depth: u8,
    pub left_curve: u8,
    pub right_curve: u8,
    pub break_point: u8,
}

#[derive(Debug, Default, Clone)]
pub struct Operator {
    pub envelope: Envelope,
    pub keyboard_scaling: KeyboardScaling,

    pub rate_scaling: u8,
    pub amp_mod_sensitivity: u8,
    pub velocity_sensitivity: u8,
    pub level: u8,

    pub mode: u8,
    pub coarse: u8,
    pub fine: u8, // x frequency by 1 + 0.01 x fine
    pub detune: u8,

    pub enabled: bool,
}

#[derive(Debug, Default, Clone)]
pub struct ModulationParameters {
    pub rate: u8,
    pub delay: u8,
    pub pitch_mod_depth: u8,
    pub amp_mod_depth: u8,
    pub sync: bool,
    pub waveform: u8,
    pub pitch_mod_sensitivity: u8,
}

impl ModulationParameters {
    /// Decodes the LFO block. Missing bytes read as zero.
    pub fn unpack(data: &[u8]) -> Self {
        let byte = |i: usize| data.get(i).copied().unwrap_or(0);

        Self {
            rate: byte(0).min(99),
            delay: byte(1).min(99),
            pitch_mod_depth: byte(2).min(99),
            amp_mod_depth: byte(3).min(99),
            sync: byte(4) != 0,
            waveform: byte(5).min(5),
            pitch_mod_sensitivity: 0,
        }
    }
}
