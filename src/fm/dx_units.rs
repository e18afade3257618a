//! Conversions from DX7 patch values (mostly 0-99) to DSP quantities.

// Based on MIT-licensed code (c) 2021 by Emilie Gillet (emilie.o.gillet@gmail.com)

#![allow(clippy::excessive_precision)]

#[allow(unused_imports)]
use num_traits::float::Float;

use super::patch::{KeyboardScaling, Operator};
use crate::utils::{interpolate, semitones_to_ratio};

/// Computes 2^x by approximating 2^frac(x) with a polynomial of the given
/// order (1 to 3) and adding int(x) to the IEEE 754 exponent.
#[inline]
pub fn pow_2_fast(mut x: f32, order: i32) -> f32 {
    let mut x_integral = x as i32;
    if x < 0.0 {
        x_integral -= 1;
    }
    x -= x_integral as f32;

    let mantissa = match order {
        1 => 1.0 + x,
        2 => 1.0 + x * (0.6565 + x * 0.3435),
        _ => 1.0 + x * (0.6958 + x * (0.2251 + x * 0.0791)),
    };

    // Below the smallest normal number the exponent arithmetic breaks down.
    if x_integral < -126 {
        return 0.0;
    }

    f32::from_bits((mantissa.to_bits() as i32).wrapping_add(x_integral << 23) as u32)
}

/// Operator (envelope) level 0-99 to the complement of the "TL" value.
///   0 =   0  (TL = 127)
///  20 =  48  (TL =  79)
///  50 =  78  (TL =  49)
///  99 = 127  (TL =   0)
#[inline]
pub fn operator_level(level: u8) -> u8 {
    let tlc = level as u32;

    let tlc = if level >= 20 {
        tlc + 28
    } else if tlc < 15 {
        (tlc * (36 - tlc)) >> 3
    } else {
        27 + tlc
    };

    tlc as u8
}

/// Pitch envelope level 0-99 to an octave shift (50 = no shift, 0 and 99 =
/// four octaves down or up).
#[inline]
pub fn pitch_envelope_level(level: u8) -> f32 {
    let l = (level as f32 - 50.0) / 32.0;
    let tail = f32::max(Float::abs(l + 0.02) - 1.0, 0.0);

    l * (1.0 + tail * tail * 5.3056)
}

/// Operator envelope rate 0-99 to a per-sample increment at 44.1 kHz.
#[inline]
pub fn operator_envelope_increment(rate: u8) -> f32 {
    let rate_scaled = (rate as i32 * 41) >> 6;
    let mantissa = 4 + (rate_scaled & 3);
    let exponent = 2 + (rate_scaled >> 2);

    (mantissa << exponent) as f32 / (1 << 24) as f32
}

/// Pitch envelope rate 0-99 to a per-sample increment at 44.1 kHz.
#[inline]
pub fn pitch_envelope_increment(rate: u8) -> f32 {
    let r = rate as f32 * 0.01;

    (1.0 + 192.0 * r * (r * r * r * r + 0.3333)) / (21.3 * 44100.0)
}

const MIN_LFO_FREQUENCY: f32 = 0.005865;

/// LFO rate 0-99 to a frequency in Hz.
#[inline]
pub fn lfo_frequency(rate: u8) -> f32 {
    let mut rate_scaled = if rate == 0 {
        1
    } else {
        (rate as u32 * 165) >> 6
    };
    rate_scaled *= if rate_scaled < 160 {
        11
    } else {
        11 + ((rate_scaled - 160) >> 4)
    };

    rate_scaled as f32 * MIN_LFO_FREQUENCY
}

/// LFO delay 0-99 to the increments (in Hz) of the hold and fade-in halves
/// of the delay ramp.
#[inline]
pub fn lfo_delay(delay: u8) -> [f32; 2] {
    if delay == 0 {
        [100000.0; 2]
    } else {
        let d = (99 - delay) as i32;
        let d = (16 + (d & 15)) << (1 + (d >> 4));
        [
            d as f32 * MIN_LFO_FREQUENCY,
            i32::max(0x80, d & 0xFF80) as f32 * MIN_LFO_FREQUENCY,
        ]
    }
}

/// Velocity 0.0-1.0 to the factor applied to the velocity sensitivity.
#[inline]
pub fn normalize_velocity(velocity: f32) -> f32 {
    let cube_root = interpolate(&LUT_CUBE_ROOT, velocity, 16.0);

    16.0 * (cube_root - 0.918)
}

/// Envelope speed-up for a note, given the operator rate scaling (0-7).
#[inline]
pub fn rate_scaling(note: f32, rate_scaling: u8) -> f32 {
    pow_2_fast(rate_scaling as f32 * (note * 0.33333 - 7.0) * 0.03125, 1)
}

/// Operator amplitude modulation sensitivity (0-3).
#[inline]
pub fn amp_mod_sensitivity(amp_mod_sensitivity: u8) -> f32 {
    LUT_AMP_MOD_SENSITIVITY[(amp_mod_sensitivity & 0x03) as usize]
}

/// Pitch modulation sensitivity (0-7).
#[inline]
pub fn pitch_mod_sensitivity(pitch_mod_sensitivity: u8) -> f32 {
    LUT_PITCH_MOD_SENSITIVITY[(pitch_mod_sensitivity & 0x07) as usize]
}

/// Keyboard level scaling, in TL units.
#[inline]
pub fn keyboard_scaling(note: f32, ks: &KeyboardScaling) -> f32 {
    let x = note - ks.break_point as f32 - 15.0;
    let (curve, depth) = if x > 0.0 {
        (ks.right_curve, ks.right_depth)
    } else {
        (ks.left_curve, ks.left_depth)
    };

    let mut t = Float::abs(x);

    // Curves 1 and 2 are exponential, 0 and 3 linear. 0 and 1 are negative.
    if curve == 1 || curve == 2 {
        t = f32::min(t * 0.010467, 1.0);
        t = t * t * t * 96.0;
    }
    if curve < 2 {
        t = -t;
    }

    t * depth as f32 * 0.02677
}

/// Frequency ratio of an operator. Fixed-frequency operators return their
/// frequency in Hz as a negative number.
#[inline]
pub fn frequency_ratio(op: &Operator) -> f32 {
    let fixed = op.mode != 0;

    let detune = if !fixed && op.fine != 0 {
        1.0 + 0.01 * op.fine as f32
    } else {
        1.0
    };

    let mut base = if fixed {
        ((op.coarse & 3) as i32 * 100 + op.fine as i32) as f32 * 0.39864
    } else {
        LUT_COARSE[(op.coarse & 0x1F) as usize]
    };
    base += (op.detune as f32 - 7.0) * 0.015;

    let ratio = semitones_to_ratio(base) * detune;

    if fixed {
        -ratio
    } else {
        ratio
    }
}

const LUT_COARSE: [f32; 32] = [
    -12.000000, 0.000000, 12.000000, 19.019550, 24.000000, 27.863137, 31.019550, 33.688259,
    36.000000, 38.039100, 39.863137, 41.513180, 43.019550, 44.405276, 45.688259, 46.882687,
    48.000000, 49.049554, 50.039100, 50.975130, 51.863137, 52.707809, 53.513180, 54.282743,
    55.019550, 55.726274, 56.405276, 57.058650, 57.688259, 58.295772, 58.882687, 59.450356,
];

const LUT_AMP_MOD_SENSITIVITY: [f32; 4] = [0.0, 0.2588, 0.4274, 1.0];

const LUT_PITCH_MOD_SENSITIVITY: [f32; 8] = [
    0.0, 0.0781250, 0.1562500, 0.2578125, 0.4296875, 0.7187500, 1.1953125, 2.0,
];

const LUT_CUBE_ROOT: [f32; 17] = [
    0.0,
    0.39685062976,
    0.50000000000,
    0.57235744065,
    0.62996081605,
    0.67860466725,
    0.72112502092,
    0.75914745216,
    0.79370070937,
    0.82548197054,
    0.85498810729,
    0.88258719406,
    0.90856038354,
    0.93312785379,
    0.95646563396,
    0.97871693135,
    1.0,
];
