//! A generator of C code for the Keccak-f\[b\] permutations.
//!
//! [`KeccakFCodeGen`] writes the round function of a Keccak-f instance as straight-line C
//! statements (or as the bodies of `#define` macros), derived step by step from θ, ρ, π,
//! χ and ι. The emitted code can be tuned in several ways:
//!
//! - lanes can be split into several smaller words (bit interleaving), so that e.g.
//!   Keccak-f\[1600\] runs on 32-bit registers with rotations still done word by word;
//! - bitwise operations can be written as macros, for targets where they map to intrinsics;
//! - the order in which lanes go through ρ/π and χ can trade speed for register pressure;
//! - lane complementing keeps some lanes in complemented form between rounds, removing
//!   most NOTs from χ. The polarity of each lane is tracked by a [`PolarityTracker`] and
//!   checked at every round boundary.
//!
//! All emission is deterministic: the same generator and arguments always produce the same
//! bytes.

mod chi;
mod config;
mod display;
mod error;
mod generator;
mod macro_file;
mod marshal;
mod names;
mod polarity;
mod syntax;

pub use config::*;
pub use error::*;
pub use generator::*;
pub use macro_file::LANE_COMPLEMENTING_SYMBOL;
pub use names::NameBinding;
pub use polarity::*;
