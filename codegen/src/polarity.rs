//! Lane complementing bookkeeping.
//!
//! With lane complementing some lanes are held in complemented form, which lets χ be
//! written with fewer NOTs. The polarity of every lane has to be known at two points of a
//! round: at its input (the θ input, equal to the previous round's χ output) and at the
//! χ input. θ flips whole sheets whose neighbouring sheets disagree on the parity of
//! complemented lanes, ρ leaves polarity alone and π moves it along with the lanes.

use core::fmt;

use kt_keccak::{KeccakFGeometry, LaneIndex, SLICE_MASK, SliceValue};

use crate::error::{CodeGenError, CodeGenResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LanePolarity {
    True,
    Complemented,
}

/// A per-lane polarity pattern; bit `x + 5y` is set when lane `(x, y)` is complemented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChiMask(SliceValue);

impl ChiMask {
    /// Every lane in true form.
    pub const NONE: Self = Self(0);

    /// The classical complementing pattern, at the χ output: lanes (1, 0), (2, 0), (3, 1),
    /// (2, 2), (2, 3) and (0, 4).
    pub const LANE_COMPLEMENTING: Self =
        Self((1 << 1) | (1 << 2) | (1 << 8) | (1 << 12) | (1 << 17) | (1 << 20));

    pub const fn new(bits: SliceValue) -> Self {
        Self(bits & SLICE_MASK)
    }

    pub const fn bits(self) -> SliceValue {
        self.0
    }

    pub const fn is_complemented(self, lane: LaneIndex) -> bool {
        (self.0 >> lane.index()) & 1 == 1
    }

    pub const fn polarity(self, lane: LaneIndex) -> LanePolarity {
        if self.is_complemented(lane) {
            LanePolarity::Complemented
        } else {
            LanePolarity::True
        }
    }

    #[must_use]
    pub const fn with(self, lane: LaneIndex, polarity: LanePolarity) -> Self {
        match polarity {
            LanePolarity::True => Self(self.0 & !(1 << lane.index())),
            LanePolarity::Complemented => Self(self.0 | (1 << lane.index())),
        }
    }

    /// Polarity after θ, when θ is computed on the lanes as they are represented.
    #[must_use]
    pub fn through_theta(self) -> Self {
        let odd: [bool; 5] = core::array::from_fn(|x| {
            (0..5)
                .filter(|&y| self.is_complemented(LaneIndex::new(x, y)))
                .count()
                % 2
                == 1
        });
        self.flip_sheets(|x| odd[(x + 4) % 5] != odd[(x + 1) % 5])
    }

    /// Complements every lane of the sheets selected by `flip`.
    fn flip_sheets(self, flip: impl Fn(usize) -> bool) -> Self {
        LaneIndex::all()
            .filter(|lane| flip(lane.x))
            .fold(self, |mask, lane| Self(mask.0 ^ (1 << lane.index())))
    }

    /// Polarity after π moves the lanes.
    #[must_use]
    pub fn through_pi(self, geometry: &KeccakFGeometry) -> Self {
        LaneIndex::all()
            .filter(|&lane| self.is_complemented(lane))
            .fold(Self::NONE, |mask, lane| {
                mask.with(geometry.pi(lane), LanePolarity::Complemented)
            })
    }
}

impl fmt::Display for ChiMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#09x}", self.0)
    }
}

/// Tracks the polarity of the round input from one round emission to the next.
///
/// A round is emitted against the polarity the tracker holds; the χ input mask the
/// caller declares must be the one implied by it, and once the round is written the
/// tracker moves on to the declared χ output mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolarityTracker {
    current: ChiMask,
}

impl PolarityTracker {
    /// Starts from a state whose lanes are complemented according to `initial`.
    pub const fn new(initial: ChiMask) -> Self {
        Self { current: initial }
    }

    /// Polarity of the lanes the next round reads.
    pub const fn current(&self) -> ChiMask {
        self.current
    }

    /// The χ input polarity the next round will see.
    pub fn chi_input_mask(&self, geometry: &KeccakFGeometry) -> ChiMask {
        self.current.through_theta().through_pi(geometry)
    }

    pub(crate) fn check_chi_input(
        &self,
        geometry: &KeccakFGeometry,
        declared: ChiMask,
    ) -> CodeGenResult<()> {
        let expected = self.chi_input_mask(geometry);
        if expected == declared {
            Ok(())
        } else {
            Err(CodeGenError::PolarityMismatch {
                expected: expected.bits(),
                found: declared.bits(),
            })
        }
    }

    pub(crate) fn advance(&mut self, chi_output: ChiMask) {
        self.current = chi_output;
    }
}
