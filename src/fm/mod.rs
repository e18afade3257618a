//! Polyphonic 6-operator FM synthesis.
//!
//! Voices are synthesized in frames of [`N`] samples. The [`engine::FmEngine`]
//! renders any host block size on top of that, carrying surplus samples over
//! to the next call.

pub mod algorithms;
pub mod controllers;
pub mod dx_units;
pub mod engine;
pub mod envelope;
pub mod lfo;
pub mod note;
pub mod operator;
pub mod patch;
pub mod voice_pool;

/// Log2 of the synthesis frame width.
pub const LG_N: usize = 6;

/// Number of samples synthesized per voice per frame.
pub const N: usize = 1 << LG_N;

/// Number of voice slots.
pub const MAX_ACTIVE_NOTES: usize = 16;

/// Number of operators per voice.
pub const NUM_OPERATORS: usize = 6;

/// Fixed-point one in the LFO and accumulator scales.
pub const Q24_ONE: i32 = 1 << 24;

/// Right shift mapping the voice accumulator to 16-bit output samples.
pub const OUTPUT_SHIFT: u32 = 13;
