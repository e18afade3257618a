//! Utility functions.
//!
//! Small helpers shared between the FM engine and the resonator.

pub mod random;
pub mod sine;

#[allow(unused_imports)]
use num_traits::float::Float;

/// Width of the linear part of each interval in [`interpolate_plateau`].
/// With a value of 2, the first half of an interval is a ramp, the second
/// half holds the upper table entry.
pub const PLATEAU: f32 = 2.0;

/// Linear table lookup. An index of 1.0 reads entry `size`, which must exist.
#[inline]
pub fn interpolate(table: &[f32], mut index: f32, size: f32) -> f32 {
    index = index.clamp(0.0, 1.0);
    index *= size;
    let index_integral = index as usize;
    let index_fractional = index - (index_integral as f32);
    let a = table[index_integral];
    let b = table.get(index_integral + 1).copied().unwrap_or(a);

    a + (b - a) * index_fractional
}

/// Table lookup that ramps only over the first `1 / PLATEAU` of each interval
/// and then holds the next entry, giving stepped transitions.
///
/// `index` is clamped to `0.0..=1.0`; the table must hold at least
/// `size + 2` entries.
#[inline]
pub fn interpolate_plateau(table: &[f32], mut index: f32, size: f32) -> f32 {
    index = index.clamp(0.0, 1.0);
    index *= size;
    let index_integral = index as usize;
    let index_fractional = index - (index_integral as f32);
    let a = table[index_integral];
    let b = table[index_integral + 1];

    if index_fractional < 1.0 / PLATEAU {
        a + (b - a) * index_fractional * PLATEAU
    } else {
        b
    }
}

#[inline]
pub fn one_pole(out: &mut f32, in_: f32, coefficient: f32) {
    *out += coefficient * (in_ - *out);
}

#[inline]
pub fn clip_16(x: i32) -> i32 {
    x.clamp(-32768, 32767)
}

/// Frequency ratio of an equal-tempered interval given in semitones.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    Float::exp2(semitones * (1.0 / 12.0))
}
