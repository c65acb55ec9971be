use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

use crate::state::{LaneIndex, lane_mask};

/// Number of round constants published for Keccak-f\[1600\], and hence the largest number
/// of rounds any member of the family can be instantiated with here.
pub const MAX_ROUNDS: usize = 24;

/// The Keccak-f\[1600\] round constants. Smaller widths use the same values truncated to
/// their lane size.
pub const RC: [u64; MAX_ROUNDS] = [
    0x0000000000000001,
    0x0000000000008082,
    0x800000000000808A,
    0x8000000080008000,
    0x000000000000808B,
    0x0000000080000001,
    0x8000000080008081,
    0x8000000000008009,
    0x000000000000008A,
    0x0000000000000088,
    0x0000000080008009,
    0x000000008000000A,
    0x000000008000808B,
    0x800000000000008B,
    0x8000000000008089,
    0x8000000000008003,
    0x8000000000008002,
    0x8000000000000080,
    0x000000000000800A,
    0x800000008000000A,
    0x8000000080008081,
    0x8000000000008080,
    0x0000000080000001,
    0x8000000080008008,
];

/// ρ offsets for 64-bit lanes, indexed `R[x][y]`.
pub const R: [[u32; 5]; 5] = [
    [0, 36, 3, 41, 18],
    [1, 44, 10, 45, 2],
    [62, 6, 43, 15, 61],
    [28, 55, 25, 21, 56],
    [27, 20, 39, 8, 14],
];

/// Errors that can occur when instantiating a member of the Keccak-f family.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// The width must be 25 lanes of a power-of-two size between 1 and 64 bits.
    #[error("Width {0} is not one of 25, 50, 100, 200, 400, 800 or 1600.")]
    InvalidWidth(usize),

    /// Only the first 24 round constants are available.
    #[error("{0} rounds requested, but at most {MAX_ROUNDS} are supported.")]
    TooManyRounds(usize),
}

/// The static description of one Keccak-f\[b\] instance: width, lane size, number of
/// rounds, ρ offsets, π and the round constants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeccakFGeometry {
    width: usize,
    lane_size: usize,
    nr_rounds: usize,
    rho_offsets: [[u32; 5]; 5],
    round_constants: Vec<u64>,
}

impl KeccakFGeometry {
    /// Builds the geometry of Keccak-f\[`width`\] with `nr_rounds` rounds.
    /// A round count of zero selects the nominal number `12 + 2ℓ`.
    pub fn new(width: usize, nr_rounds: usize) -> Result<Self, GeometryError> {
        if width % 25 != 0 || !(width / 25).is_power_of_two() || width / 25 > 64 {
            return Err(GeometryError::InvalidWidth(width));
        }
        let lane_size = width / 25;
        let nominal_rounds = 12 + 2 * lane_size.trailing_zeros() as usize;
        let nr_rounds = if nr_rounds == 0 {
            nominal_rounds
        } else {
            nr_rounds
        };
        if nr_rounds > MAX_ROUNDS {
            return Err(GeometryError::TooManyRounds(nr_rounds));
        }

        let rho_offsets = R.map(|column| column.map(|r| r % lane_size as u32));
        let mask = lane_mask(lane_size);
        let round_constants = RC[..nr_rounds].iter().map(|rc| rc & mask).collect();

        Ok(Self {
            width,
            lane_size,
            nr_rounds,
            rho_offsets,
            round_constants,
        })
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn lane_size(&self) -> usize {
        self.lane_size
    }

    pub const fn nr_rounds(&self) -> usize {
        self.nr_rounds
    }

    /// The nominal number of rounds for this width.
    pub const fn nominal_rounds(&self) -> usize {
        12 + 2 * self.lane_size.trailing_zeros() as usize
    }

    /// The ρ rotation of lane `(x, y)`, already reduced modulo the lane size.
    pub const fn rho_offset(&self, lane: LaneIndex) -> u32 {
        self.rho_offsets[lane.x][lane.y]
    }

    /// The round constant for round `round`, truncated to the lane size.
    pub fn round_constant(&self, round: usize) -> u64 {
        self.round_constants[round]
    }

    pub fn round_constants(&self) -> &[u64] {
        &self.round_constants
    }

    /// π: the lane at `(x, y)` moves to `(y, 2x + 3y)`.
    pub const fn pi(&self, lane: LaneIndex) -> LaneIndex {
        LaneIndex::new(lane.y, (2 * lane.x + 3 * lane.y) % 5)
    }

    /// The inverse of π: the lane that lands at `(x, y)` comes from `(x + 3y, x)`.
    pub const fn pi_inverse(&self, lane: LaneIndex) -> LaneIndex {
        LaneIndex::new((lane.x + 3 * lane.y) % 5, lane.x)
    }

    /// Identifier-safe name of the instance, e.g. `KeccakF1600`.
    pub fn tag(&self) -> String {
        format!("KeccakF{}", self.width)
    }

    /// Human-readable name; reduced-round instances carry their round count.
    pub fn name(&self) -> String {
        if self.nr_rounds == self.nominal_rounds() {
            format!("Keccak-f[{}]", self.width)
        } else {
            format!("Keccak-f[{}, nr={}]", self.width, self.nr_rounds)
        }
    }
}
