//! Spelling of the bitwise operations, either as C operators or as macros.

/// Writes expressions on words of `word_size` bits.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Syntax {
    pub(crate) word_size: usize,
    pub(crate) macros: bool,
}

impl Syntax {
    /// The smallest of `UINT8` to `UINT64` holding one word.
    pub(crate) fn word_type(&self) -> String {
        format!("UINT{}", self.word_size.max(8))
    }

    pub(crate) fn xor(&self, a: &str, b: &str) -> String {
        if self.macros {
            format!("XOR{}({a}, {b})", self.word_size)
        } else {
            format!("{a}^{b}")
        }
    }

    /// A complete statement XORing `b` into `a`.
    pub(crate) fn xor_eq(&self, a: &str, b: &str) -> String {
        if self.macros {
            format!("XOReq{}({a}, {b});", self.word_size)
        } else {
            format!("{a} ^= {b};")
        }
    }

    /// Mask of the meaningful bits when words are narrower than the `UINT8` holding them.
    pub(crate) fn word_mask(&self) -> Option<String> {
        (self.word_size < 8).then(|| format!("{:#x}", (1u32 << self.word_size) - 1))
    }

    /// `a` itself, or its complement when `complement` is set.
    ///
    /// Below 8 bits the complement is masked, so that no word ever carries bits above its
    /// size into the state.
    pub(crate) fn not(&self, a: &str, complement: bool) -> String {
        match (complement, self.macros, self.word_mask()) {
            (false, ..) => a.to_string(),
            (true, true, _) => format!("NOT{}({a})", self.word_size),
            (true, false, Some(mask)) => format!("((~{a})&{mask})"),
            (true, false, None) => format!("(~{a})"),
        }
    }

    /// `a` rotated left by `amount` bits; a zero rotation is not written at all.
    pub(crate) fn rol(&self, a: &str, amount: usize) -> String {
        if amount == 0 {
            a.to_string()
        } else {
            format!("ROL{}({a}, {amount})", self.word_size)
        }
    }

    /// `a & b` or `a | b`, each operand optionally complemented.
    ///
    /// As a macro the name carries one letter per operand, `n` for negated and `u` for
    /// unchanged, e.g. `ANDnu64(a, b)` for `(~a) & b`.
    pub(crate) fn and_or_not(
        &self,
        a: &str,
        b: &str,
        negate_a: bool,
        negate_b: bool,
        or: bool,
    ) -> String {
        let op = if or { "OR" } else { "AND" };
        if self.macros {
            let suffix = if negate_a || negate_b {
                format!("{}{}", letter(negate_a), letter(negate_b))
            } else {
                String::new()
            };
            format!("{op}{suffix}{}({a}, {b})", self.word_size)
        } else {
            let symbol = if or { '|' } else { '&' };
            format!(
                "({}{symbol}{})",
                self.not(a, negate_a),
                self.not(b, negate_b)
            )
        }
    }

    /// A constant operand; macro targets may need to broadcast or load it.
    pub(crate) fn constant(&self, a: &str) -> String {
        if self.macros {
            format!("CONST{}({a})", self.word_size)
        } else {
            a.to_string()
        }
    }
}

const fn letter(negate: bool) -> char {
    if negate { 'n' } else { 'u' }
}
