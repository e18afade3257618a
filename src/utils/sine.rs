//! Sine lookup used by the FM operators.
//!
//! The table is computed once on first use and shared by all voices.

#[allow(unused_imports)]
use num_traits::float::Float;
use spin::Once;

pub const LUT_SINE_BITS: u32 = 10;
pub const LUT_SINE_SIZE: usize = 1 << LUT_SINE_BITS;

static LUT_SINE: Once<[f32; LUT_SINE_SIZE + 1]> = Once::new();

#[inline]
fn table() -> &'static [f32; LUT_SINE_SIZE + 1] {
    LUT_SINE.call_once(|| {
        let mut lut = [0.0; LUT_SINE_SIZE + 1];
        for (i, value) in lut.iter_mut().enumerate() {
            let phase = i as f32 / LUT_SINE_SIZE as f32;
            *value = Float::sin(phase * 2.0 * core::f32::consts::PI);
        }
        lut
    })
}

/// Forces the table to be built, so that the first audio callback does not
/// pay for it.
pub fn init() {
    table();
}

// With positive or negative phase modulation up to an index of 32.
#[inline]
pub fn sine_pm(mut phase: u32, pm: f32) -> f32 {
    let max_uint32 = 4294967296.0;
    let max_index = 32;
    let offset = max_index as f32;
    let scale = max_uint32 / (max_index * 2) as f32;

    phase = phase.wrapping_add((((pm + offset) * scale) as u32).wrapping_mul(max_index * 2));
    let integral = phase >> (32 - LUT_SINE_BITS);
    let fractional = (phase << LUT_SINE_BITS) as f32 / max_uint32;
    let lut = table();
    let a = lut[integral as usize];
    let b = lut[integral as usize + 1];

    a + (b - a) * fractional
}
