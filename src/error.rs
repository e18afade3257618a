//! Error type for configuration paths.
//!
//! Nothing on the audio path returns an error. Only loading patches and laying
//! out delay memory can fail, both outside of the render callback.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A patch was supplied with the wrong number of bytes.
    PatchSize { expected: usize, actual: usize },

    /// A single patch byte was addressed outside of the patch.
    ParameterOffset { offset: usize, size: usize },

    /// The requested delay lines do not fit into the delay memory.
    DelayMemoryExhausted { requested: usize, capacity: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PatchSize { expected, actual } => {
                write!(f, "Patch size mismatch: expected {expected} bytes, got {actual}")
            }
            Error::ParameterOffset { offset, size } => {
                write!(f, "Parameter offset {offset} outside of patch ({size} bytes)")
            }
            Error::DelayMemoryExhausted {
                requested,
                capacity,
            } => write!(
                f,
                "Delay lines need {requested} samples, memory holds {capacity}"
            ),
        }
    }
}

impl core::error::Error for Error {}
