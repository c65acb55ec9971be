use std::io;

use kt_keccak::SliceValue;
use thiserror::Error;

/// Errors reported by the code generator.
///
/// Configuration and polarity errors are raised before anything is written, so a failed
/// call never leaves half-emitted code behind it.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// The interleaving factor must be at least one and divide the lane size.
    #[error("Interleaving factor {factor} does not divide the lane size {lane_size}.")]
    InvalidInterleavingFactor { factor: usize, lane_size: usize },

    /// Only schedule types 1 and 2 exist.
    #[error("Schedule type {0} is not supported, it must be 1 or 2.")]
    InvalidScheduleType(u32),

    /// The χ input polarity declared by the caller is not what θ and π make of the
    /// polarity the state currently has.
    #[error(
        "χ input complementing mask {found:#09x} does not match {expected:#09x}, the image of the round input mask through θ and π."
    )]
    PolarityMismatch {
        expected: SliceValue,
        found: SliceValue,
    },

    /// Data can only be XORed into whole lanes of the state.
    #[error("Cannot XOR {bits} bits into a {width}-bit state with {lane_size}-bit lanes.")]
    InvalidRate {
        bits: usize,
        width: usize,
        lane_size: usize,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type CodeGenResult<T> = Result<T, CodeGenError>;
