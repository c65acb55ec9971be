//! Human-readable dumps of the tables the generated code is built from.
//!
//! These only read the geometry and configuration and never influence the emitted code.

use std::io::Write;

use itertools::Itertools;
use kt_keccak::{LaneIndex, deinterleave};

use crate::error::CodeGenResult;
use crate::generator::KeccakFCodeGen;

impl KeccakFCodeGen {
    /// One line per round, with every interleaved word of the constant.
    pub fn display_round_constants<W: Write>(&self, out: &mut W) -> CodeGenResult<()> {
        let s = self.config.interleaving_factor;
        let digits = self.word_size().div_ceil(4);
        writeln!(out, "Round constants of {}:", self.geometry.name())?;
        for (round, &rc) in self.geometry.round_constants().iter().enumerate() {
            let words = deinterleave(rc, self.geometry.lane_size(), s)
                .iter()
                .map(|word| format!("0x{word:0digits$X}"))
                .join(" ");
            writeln!(out, "RC[{round:2}] = {words}")?;
        }
        Ok(())
    }

    /// The ρ rotation offsets as a grid, `y` going down and `x` going right.
    ///
    /// With `modulo_word_size`, each offset is followed by its value modulo the word size.
    pub fn display_rho_offsets<W: Write>(
        &self,
        out: &mut W,
        modulo_word_size: bool,
    ) -> CodeGenResult<()> {
        let word_size = self.word_size();
        writeln!(out, "Rho offsets of {}:", self.geometry.name())?;
        for y in 0..5 {
            let row = (0..5)
                .map(|x| {
                    let offset = self.geometry.rho_offset(LaneIndex::new(x, y)) as usize;
                    if modulo_word_size {
                        format!("{offset:3} ({:2})", offset % word_size)
                    } else {
                        format!("{offset:3}")
                    }
                })
                .join(" ");
            writeln!(out, "{row}")?;
        }
        Ok(())
    }

    /// Where π sends every lane.
    pub fn display_pi<W: Write>(&self, out: &mut W) -> CodeGenResult<()> {
        writeln!(out, "Pi of {}:", self.geometry.name())?;
        for lane in LaneIndex::all() {
            let target = self.geometry.pi(lane);
            writeln!(
                out,
                "({}, {}) -> ({}, {})",
                lane.x, lane.y, target.x, target.y
            )?;
        }
        Ok(())
    }
}
