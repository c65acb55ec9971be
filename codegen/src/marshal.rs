//! Moving the state between word arrays and the lane variables of the generated code.
//!
//! The word arrays hold the state in true form, lane `x + 5y` occupying words
//! `s * (x + 5y)` to `s * (x + 5y) + s - 1` for an interleaving factor `s`. The lane
//! variables may be complemented according to a [`ChiMask`], which the copies undo.

use std::io::Write;

use kt_keccak::LaneIndex;

use crate::error::{CodeGenError, CodeGenResult};
use crate::generator::KeccakFCodeGen;
use crate::names::{NameBinding, lane_word};
use crate::polarity::ChiMask;

impl KeccakFCodeGen {
    /// Checks that `bits` covers whole lanes of the state and returns how many.
    pub(crate) fn lanes_for_rate(&self, bits: usize) -> CodeGenResult<usize> {
        let width = self.geometry.width();
        let lane_size = self.geometry.lane_size();
        if bits % lane_size != 0 || bits > width {
            return Err(CodeGenError::InvalidRate {
                bits,
                width,
                lane_size,
            });
        }
        Ok(bits / lane_size)
    }

    /// Loads the lanes `names.a` from `names.state`, XORing the first `bits_to_xor` bits of
    /// `names.input` along the way. This is where a sponge would absorb its input.
    pub fn gen_copy_from_state_and_xor<W: Write>(
        &self,
        out: &mut W,
        bits_to_xor: usize,
        polarity: ChiMask,
        names: &NameBinding,
    ) -> CodeGenResult<()> {
        let lanes_to_xor = self.lanes_for_rate(bits_to_xor)?;
        let s = self.config.interleaving_factor;
        let syntax = self.syntax();

        for lane in LaneIndex::all() {
            for z in 0..s {
                let index = lane.index() * s + z;
                let mut value = syntax.not(
                    &format!("{}[{index}]", names.state),
                    polarity.is_complemented(lane),
                );
                if lane.index() < lanes_to_xor {
                    value = syntax.xor(&value, &format!("{}[{index}]", names.input));
                }
                writeln!(out, "    {} = {value};", lane_word(&names.a, lane, z, s))?;
            }
        }
        Ok(())
    }

    /// Stores the lanes `names.a` into `names.state`.
    pub fn gen_copy_to_state<W: Write>(
        &self,
        out: &mut W,
        polarity: ChiMask,
        names: &NameBinding,
    ) -> CodeGenResult<()> {
        let s = self.config.interleaving_factor;
        let syntax = self.syntax();

        for lane in LaneIndex::all() {
            for z in 0..s {
                let index = lane.index() * s + z;
                let word = lane_word(&names.a, lane, z, s);
                writeln!(
                    out,
                    "    {}[{index}] = {};",
                    names.state,
                    syntax.not(&word, polarity.is_complemented(lane))
                )?;
            }
        }
        Ok(())
    }

    /// Copies the lanes `from.a` into the lanes `to.a`, as they are.
    pub fn gen_copy_state_variables<W: Write>(
        &self,
        out: &mut W,
        from: &NameBinding,
        to: &NameBinding,
    ) -> CodeGenResult<()> {
        let s = self.config.interleaving_factor;
        for lane in LaneIndex::all() {
            for z in 0..s {
                writeln!(
                    out,
                    "    {} = {};",
                    lane_word(&to.a, lane, z, s),
                    lane_word(&from.a, lane, z, s)
                )?;
            }
        }
        Ok(())
    }
}
