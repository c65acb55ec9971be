use core::array;

use crate::geometry::KeccakFGeometry;
use crate::state::{LaneIndex, NUM_LANES, SLICE_MASK, SliceValue, lane_mask, rotate_lane};
use crate::Permutation;

/// Bits 0, 5, 10, 15 and 20: one bit in each plane of a [`SliceValue`].
const SHEET_BROADCAST: SliceValue = 0x0010_8421;

/// The Keccak-f\[b\] permutation, computed step by step from its geometry.
#[derive(Clone, Debug)]
pub struct KeccakF {
    geometry: KeccakFGeometry,
    /// `pi_targets[i]` is the bit position lane `i` moves to under π.
    pi_targets: [usize; NUM_LANES],
}

impl KeccakF {
    pub fn new(geometry: KeccakFGeometry) -> Self {
        let pi_targets = array::from_fn(|i| geometry.pi(LaneIndex::from_index(i)).index());
        Self {
            geometry,
            pi_targets,
        }
    }

    pub const fn geometry(&self) -> &KeccakFGeometry {
        &self.geometry
    }

    /// Applies round `round` (θ, ρ, π, χ, ι) to a lane-indexed state.
    ///
    /// # Panics
    ///
    /// Panics if `round` is not one of the instance's rounds.
    pub fn round(&self, state: &mut [u64; NUM_LANES], round: usize) {
        assert!(
            round < self.geometry.nr_rounds(),
            "round {round} of {}",
            self.geometry.name()
        );
        let lane_size = self.geometry.lane_size();
        let mask = lane_mask(lane_size);

        // θ: C[x] = xor of the sheet, D[x] = C[x - 1] ^ ROL(C[x + 1], 1).
        let c: [u64; 5] = array::from_fn(|x| (0..5).fold(0, |acc, y| acc ^ state[x + 5 * y]));
        let d: [u64; 5] =
            array::from_fn(|x| c[(x + 4) % 5] ^ rotate_lane(c[(x + 1) % 5], 1, lane_size));
        for (i, lane) in state.iter_mut().enumerate() {
            *lane ^= d[i % 5];
        }

        // ρ and π.
        let mut b = [0u64; NUM_LANES];
        for lane in LaneIndex::all() {
            b[self.geometry.pi(lane).index()] = rotate_lane(
                state[lane.index()],
                self.geometry.rho_offset(lane),
                lane_size,
            );
        }

        // χ.
        for lane in LaneIndex::all() {
            let b1 = b[LaneIndex::new(lane.x + 1, lane.y).index()];
            let b2 = b[LaneIndex::new(lane.x + 2, lane.y).index()];
            state[lane.index()] = (b[lane.index()] ^ (!b1 & b2)) & mask;
        }

        // ι.
        state[0] ^= self.geometry.round_constant(round);
    }

    /// Applies all rounds of the instance to a lane-indexed state.
    pub fn permute_lanes(&self, state: &mut [u64; NUM_LANES]) {
        for round in 0..self.geometry.nr_rounds() {
            self.round(state, round);
        }
    }

    /// Keccak-f\[25\] on a packed state, bit `x + 5y` holding lane `(x, y)`.
    ///
    /// Works one plane (five bits) at a time; ρ is the identity on one-bit lanes.
    ///
    /// # Panics
    ///
    /// Panics unless the instance is Keccak-f\[25\].
    pub fn permute_slice(&self, value: SliceValue) -> SliceValue {
        assert_eq!(
            self.geometry.lane_size(),
            1,
            "{} has no packed state",
            self.geometry.name()
        );
        let mut a = value & SLICE_MASK;
        for round in 0..self.geometry.nr_rounds() {
            // θ
            let c = (0..5).fold(0, |acc, y| acc ^ plane(a, y));
            let d = rotate_plane(c, 1) ^ rotate_plane(c, 4);
            a ^= d * SHEET_BROADCAST;

            // π
            let b = self
                .pi_targets
                .iter()
                .enumerate()
                .fold(0, |b, (i, &target)| b | (((a >> i) & 1) << target));

            // χ
            a = (0..5).fold(0, |acc, y| {
                let row = plane(b, y);
                let chi = row ^ (!rotate_plane(row, 4) & rotate_plane(row, 3) & 0x1F);
                acc | (chi << (5 * y))
            });

            // ι
            a ^= (self.geometry.round_constant(round) & 1) as SliceValue;
        }
        a
    }
}

impl Permutation<[u64; NUM_LANES]> for KeccakF {
    fn permute_mut(&self, input: &mut [u64; NUM_LANES]) {
        self.permute_lanes(input);
    }
}

#[inline]
const fn plane(value: SliceValue, y: usize) -> SliceValue {
    (value >> (5 * y)) & 0x1F
}

/// Rotates a five-bit plane so that bit `x` moves to bit `x + amount`.
#[inline]
const fn rotate_plane(row: SliceValue, amount: u32) -> SliceValue {
    ((row << amount) | (row >> (5 - amount))) & 0x1F
}
