//! Command line arguments.
//!
//! Enum options accept their full name or a few short aliases, matched case-insensitively.

use std::path::PathBuf;

use clap::builder::PossibleValue;
use clap::{Args, Parser, Subcommand, ValueEnum};
use kt_keccak::{SLICE_MASK, SliceValue};

#[derive(Parser, Debug)]
#[command(name = "keccak-tools", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a C header of macros implementing the rounds of a Keccak-f instance.
    Macros {
        #[command(flatten)]
        instance: InstanceArgs,

        /// Schedule of the ρ/π and χ steps within each plane.
        #[arg(short, long, ignore_case = true, value_enum, default_value_t = ScheduleOptions::One)]
        schedule: ScheduleOptions,

        /// Write the bitwise operations as macros (XOR64, ANDnu64, ...).
        #[arg(short = 'm', long)]
        output_macros: bool,

        /// Also write the lane complementing variant, selected by defining UseLaneComplementing.
        #[arg(short, long)]
        lane_complementing: bool,

        /// File to write to instead of the standard output.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the round constants, ρ offsets and π of a Keccak-f instance.
    Display {
        #[command(flatten)]
        instance: InstanceArgs,

        /// What to print.
        #[arg(short, long, ignore_case = true, value_enum, default_value_t = TableOptions::All)]
        table: TableOptions,
    },

    /// Build, or load from the cache, the lookup table of Keccak-f[25].
    Lut {
        /// Number of rounds, 0 for the nominal 12.
        #[arg(short = 'r', long, default_value_t = 0)]
        nr_rounds: usize,

        /// Directory holding cached tables.
        #[arg(short, long, default_value = "lut-cache")]
        cache_dir: PathBuf,

        /// Inputs whose images to print, in hexadecimal.
        #[arg(short, long, value_parser = parse_slice, num_args = 0..)]
        inputs: Vec<SliceValue>,
    },
}

/// Selects the Keccak-f instance and how its lanes are split.
#[derive(Args, Debug)]
pub struct InstanceArgs {
    /// Width of the permutation: 25, 50, 100, 200, 400, 800 or 1600.
    #[arg(short, long, default_value_t = 1600)]
    pub width: usize,

    /// Number of rounds, 0 for the nominal number.
    #[arg(short = 'r', long, default_value_t = 0)]
    pub nr_rounds: usize,

    /// Number of words each lane is split into.
    #[arg(short, long, default_value_t = 1)]
    pub interleaving_factor: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScheduleOptions {
    One,
    Two,
}

impl ScheduleOptions {
    pub const fn schedule_type(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl ValueEnum for ScheduleOptions {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::One, Self::Two]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            Self::One => PossibleValue::new("1").aliases(["one", "fast"]),
            Self::Two => PossibleValue::new("2").aliases(["two", "low-register"]),
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum TableOptions {
    All,
    #[value(alias = "rc")]
    RoundConstants,
    #[value(alias = "rho")]
    RhoOffsets,
    Pi,
}

/// Parses a state of Keccak-f[25], with or without a `0x` prefix.
fn parse_slice(value: &str) -> Result<SliceValue, String> {
    let digits = value.trim_start_matches("0x").trim_start_matches("0X");
    let state = SliceValue::from_str_radix(digits, 16).map_err(|err| err.to_string())?;
    if state & !SLICE_MASK != 0 {
        return Err(format!("{value} does not fit in 25 bits"));
    }
    Ok(state)
}
