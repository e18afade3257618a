//! Real-time DSP core of an FM/resonator instrument module.
//!
//! Two independent processors are provided:
//!
//! - [`fm::engine::FmEngine`]: a polyphonic 6-operator FM voice pool with a block
//!   renderer that decouples the fixed internal frame width [`fm::N`] from the
//!   block size requested by the host.
//! - [`fx::resonator::Resonator`]: a two-voice chord resonator built from comb
//!   filters carved out of a single delay memory.
//!
//! Neither processor allocates, blocks or locks once constructed.

#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod fm;
pub mod fx;
pub mod utils;

pub use error::Error;
