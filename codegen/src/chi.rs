//! Choice of the boolean form used for one χ output lane.
//!
//! χ computes `E = B0 ^ (~B1 & B2)`. When `B0`, `B1`, `B2` and `E` may each be held in
//! complemented form, the nonlinear term can be written either as an AND of possibly
//! negated operands, or by De Morgan as the complement of an OR. Each form may also need
//! the result complemented to reach the requested output polarity. The form with the
//! fewest NOTs is used, the AND form on a tie.

/// How to write one χ output lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ChiForm {
    pub(crate) or: bool,
    pub(crate) negate_b1: bool,
    pub(crate) negate_b2: bool,
    /// Complement `B0` before the XOR, fixing the output polarity.
    pub(crate) negate_b0: bool,
}

impl ChiForm {
    /// `b0`, `b1`, `b2` tell whether the χ inputs are complemented, `e` whether the output
    /// must be.
    pub(crate) const fn choose(b0: bool, b1: bool, b2: bool, e: bool) -> Self {
        // ~B1 & B2 on the represented values.
        let and = Self {
            or: false,
            negate_b1: !b1,
            negate_b2: b2,
            negate_b0: b0 ^ e,
        };
        // ~(B1 | ~B2), the outer complement folded into the residual.
        let or = Self {
            or: true,
            negate_b1: b1,
            negate_b2: !b2,
            negate_b0: !(b0 ^ e),
        };
        if or.cost() < and.cost() { or } else { and }
    }

    /// Number of NOT operations the form needs.
    pub(crate) const fn cost(&self) -> usize {
        self.negate_b1 as usize + self.negate_b2 as usize + self.negate_b0 as usize
    }
}
