use alloc::vec::Vec;
use core::array;

/// Number of lanes in every Keccak-f state.
pub const NUM_LANES: usize = 25;

/// One bit per lane, bit `x + 5y` for lane `(x, y)`. For Keccak-f\[25\] this is the whole state;
/// for wider instances it is a slice, or a per-lane flag set such as a complementing mask.
pub type SliceValue = u32;

/// Mask of the 25 meaningful bits of a [`SliceValue`].
pub const SLICE_MASK: SliceValue = (1 << NUM_LANES) - 1;

/// Lane coordinates. `x` selects the sheet (column), `y` the plane (row).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LaneIndex {
    pub x: usize,
    pub y: usize,
}

impl LaneIndex {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x: x % 5, y: y % 5 }
    }

    pub const fn from_index(index: usize) -> Self {
        Self::new(index % 5, index / 5)
    }

    /// Position of the lane in a `[u64; 25]` state and in a [`SliceValue`].
    pub const fn index(self) -> usize {
        self.x + 5 * self.y
    }

    /// All 25 lanes, plane by plane.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..NUM_LANES).map(Self::from_index)
    }
}

/// Mask of the bits used by a lane of `lane_size` bits.
pub const fn lane_mask(lane_size: usize) -> u64 {
    if lane_size >= 64 {
        u64::MAX
    } else {
        (1 << lane_size) - 1
    }
}

/// Rotates a lane of `lane_size` bits to the left by `amount`.
pub const fn rotate_lane(value: u64, amount: u32, lane_size: usize) -> u64 {
    let mask = lane_mask(lane_size);
    let amount = amount % lane_size as u32;
    let value = value & mask;
    if amount == 0 {
        value
    } else {
        ((value << amount) | (value >> (lane_size as u32 - amount))) & mask
    }
}

/// Splits a lane into `factor` words: bit `i` of the lane goes to bit `i / factor` of word
/// `i % factor`.
pub fn deinterleave(lane: u64, lane_size: usize, factor: usize) -> Vec<u64> {
    let word_size = lane_size / factor;
    (0..factor)
        .map(|z| {
            (0..word_size).fold(0, |word, bit| word | (((lane >> (bit * factor + z)) & 1) << bit))
        })
        .collect()
}

/// Inverse of [`deinterleave`].
pub fn interleave(words: &[u64], lane_size: usize) -> u64 {
    let factor = words.len();
    (0..lane_size).fold(0, |lane, i| lane | (((words[i % factor] >> (i / factor)) & 1) << i))
}

/// Expands a Keccak-f\[25\] state into one-bit lanes.
pub fn slice_to_lanes(value: SliceValue) -> [u64; NUM_LANES] {
    array::from_fn(|i| u64::from((value >> i) & 1))
}

/// Packs one-bit lanes into a Keccak-f\[25\] state.
pub fn lanes_to_slice(lanes: &[u64; NUM_LANES]) -> SliceValue {
    lanes
        .iter()
        .enumerate()
        .fold(0, |value, (i, lane)| value | (((*lane & 1) as SliceValue) << i))
}
