use std::io::Write;

use itertools::Itertools;
use kt_keccak::{KeccakFGeometry, LaneIndex, deinterleave};
use tracing::debug;

use crate::chi::ChiForm;
use crate::config::{CodeGenConfig, PlaneStep, ScheduleType};
use crate::error::{CodeGenError, CodeGenResult};
use crate::names::{NameBinding, lane_word, sheet_word};
use crate::polarity::{ChiMask, PolarityTracker};
use crate::syntax::Syntax;

/// Generates C code for the rounds of one Keccak-f\[b\] instance.
///
/// The generated round code reads the state from the lanes named by `names.a`, XORs the θ
/// terms `names.d` into them, moves and rotates them into `names.b` (ρ and π), evaluates χ
/// into `names.e` and adds the round constant (ι). The sheet parities `names.c` the θ step
/// needs come either from [`gen_code_for_prepare_theta`](Self::gen_code_for_prepare_theta)
/// or from the previous round, which computes them as it produces its output.
#[derive(Clone, Debug)]
pub struct KeccakFCodeGen {
    pub(crate) geometry: KeccakFGeometry,
    pub(crate) config: CodeGenConfig,
}

impl KeccakFCodeGen {
    /// A generator with no interleaving, operators rather than macros, and schedule type 1.
    pub fn new(geometry: KeccakFGeometry) -> Self {
        Self {
            geometry,
            config: CodeGenConfig::default(),
        }
    }

    pub const fn geometry(&self) -> &KeccakFGeometry {
        &self.geometry
    }

    pub const fn config(&self) -> &CodeGenConfig {
        &self.config
    }

    /// Size in bits of the words a lane is split into.
    pub const fn word_size(&self) -> usize {
        self.geometry.lane_size() / self.config.interleaving_factor
    }

    /// Splits every lane into `factor` words, e.g. 2 for 32-bit code for Keccak-f\[1600\].
    pub fn set_interleaving_factor(&mut self, factor: usize) -> CodeGenResult<&mut Self> {
        let lane_size = self.geometry.lane_size();
        if factor == 0 || lane_size % factor != 0 {
            return Err(CodeGenError::InvalidInterleavingFactor { factor, lane_size });
        }
        debug!(factor, word_size = lane_size / factor, "interleaving factor set");
        self.config.interleaving_factor = factor;
        Ok(self)
    }

    pub fn set_output_macros(&mut self, output_macros: bool) -> &mut Self {
        self.config.output_macros = output_macros;
        self
    }

    /// Selects schedule type 1 or 2, see [`ScheduleType`].
    pub fn set_schedule_type(&mut self, schedule_type: u32) -> CodeGenResult<&mut Self> {
        self.config.schedule = ScheduleType::try_from(schedule_type)?;
        debug!(schedule = %self.config.schedule, "schedule type set");
        Ok(self)
    }

    pub(crate) const fn syntax(&self) -> Syntax {
        Syntax {
            word_size: self.word_size(),
            macros: self.config.output_macros,
        }
    }

    /// For word `z` of a lane rotated left by `amount`: the word of the unrotated lane it
    /// comes from, and the rotation to apply to that word.
    ///
    /// Bit `i` of a lane lives in word `i mod s` at position `i / s`, so a rotation of the
    /// lane moves bits across words as well as within them.
    pub(crate) fn rotation_source(&self, z: usize, amount: usize) -> (usize, usize) {
        let s = self.config.interleaving_factor;
        let source = (z + s - amount % s) % s;
        (source, ((source + amount) / s) % self.word_size())
    }

    /// Name of the round constant table holding word `z` of each constant.
    pub fn round_constants_name(&self, z: usize) -> String {
        let s = self.config.interleaving_factor;
        if s == 1 {
            format!("{}RoundConstants", self.geometry.tag())
        } else {
            format!("{}RoundConstants_int{s}_{z}", self.geometry.tag())
        }
    }

    fn lane_words(&self, prefix: &str, lane: LaneIndex) -> impl Iterator<Item = String> {
        let s = self.config.interleaving_factor;
        let prefix = prefix.to_string();
        (0..s).map(move |z| lane_word(&prefix, lane, z, s))
    }

    /// Declares the variables used by the round code: lanes for A, B and E, sheets for C
    /// and D.
    pub fn gen_declarations<W: Write>(&self, out: &mut W, names: &NameBinding) -> CodeGenResult<()> {
        let s = self.config.interleaving_factor;
        let word_type = self.syntax().word_type();
        for (prefix, lanes) in [
            (&names.a, true),
            (&names.b, true),
            (&names.c, false),
            (&names.d, false),
            (&names.e, true),
        ] {
            if lanes {
                for y in 0..5 {
                    let words = (0..5)
                        .flat_map(|x| self.lane_words(prefix, LaneIndex::new(x, y)))
                        .join(", ");
                    writeln!(out, "    {word_type} {words};")?;
                }
            } else {
                let words = (0..5)
                    .flat_map(|x| (0..s).map(move |z| sheet_word(prefix, x, z, s)))
                    .join(", ");
                writeln!(out, "    {word_type} {words};")?;
            }
        }
        Ok(())
    }

    /// Computes the sheet parities `C[x] = A[x, 0] ^ ... ^ A[x, 4]` needed by θ in the
    /// first round.
    pub fn gen_code_for_prepare_theta<W: Write>(
        &self,
        out: &mut W,
        names: &NameBinding,
    ) -> CodeGenResult<()> {
        let s = self.config.interleaving_factor;
        let syntax = self.syntax();
        for x in 0..5 {
            for z in 0..s {
                let parity = (0..5)
                    .map(|y| lane_word(&names.a, LaneIndex::new(x, y), z, s))
                    .reduce(|acc, word| syntax.xor(&acc, &word))
                    .unwrap_or_default();
                writeln!(out, "    {} = {parity};", sheet_word(&names.c, x, z, s))?;
            }
        }
        Ok(())
    }

    /// Writes the code of one round, parameterised by the round index `i`.
    ///
    /// `in_chi_mask` is the complementing pattern of the lanes entering χ and must be what
    /// θ and π make of the polarity held by `tracker`; `out_chi_mask` is the pattern χ
    /// produces. On success the tracker holds `out_chi_mask`. With `prepare_theta`, the
    /// sheet parities of the output are accumulated into `names.c` for the next round.
    pub fn gen_code_for_round<W: Write>(
        &self,
        out: &mut W,
        prepare_theta: bool,
        tracker: &mut PolarityTracker,
        in_chi_mask: ChiMask,
        out_chi_mask: ChiMask,
        names: &NameBinding,
    ) -> CodeGenResult<()> {
        tracker.check_chi_input(&self.geometry, in_chi_mask)?;

        let s = self.config.interleaving_factor;
        let syntax = self.syntax();

        // θ: D[x] = C[x - 1] ^ ROL(C[x + 1], 1)
        for x in 0..5 {
            for z in 0..s {
                let (source, amount) = self.rotation_source(z, 1);
                let c_prev = sheet_word(&names.c, x + 4, z, s);
                let c_next = sheet_word(&names.c, x + 1, source, s);
                writeln!(
                    out,
                    "    {} = {};",
                    sheet_word(&names.d, x, z, s),
                    syntax.xor(&c_prev, &syntax.rol(&c_next, amount))
                )?;
            }
        }
        writeln!(out)?;

        for y in 0..5 {
            for step in self.config.schedule.plane_steps() {
                match step {
                    PlaneStep::Load(x) => self.gen_rho_pi(out, LaneIndex::new(x, y), names)?,
                    PlaneStep::Chi(x) => self.gen_chi_iota(
                        out,
                        LaneIndex::new(x, y),
                        prepare_theta,
                        in_chi_mask,
                        out_chi_mask,
                        names,
                    )?,
                }
            }
            writeln!(out)?;
        }

        tracker.advance(out_chi_mask);
        Ok(())
    }

    /// θ on the source lane of `target`, then `B[target] = ROL(A[source], r[source])`.
    fn gen_rho_pi<W: Write>(
        &self,
        out: &mut W,
        target: LaneIndex,
        names: &NameBinding,
    ) -> CodeGenResult<()> {
        let s = self.config.interleaving_factor;
        let syntax = self.syntax();
        let source = self.geometry.pi_inverse(target);
        let offset = self.geometry.rho_offset(source) as usize;

        for z in 0..s {
            let a = lane_word(&names.a, source, z, s);
            let d = sheet_word(&names.d, source.x, z, s);
            writeln!(out, "    {}", syntax.xor_eq(&a, &d))?;
        }
        for z in 0..s {
            let (word, amount) = self.rotation_source(z, offset);
            let a = lane_word(&names.a, source, word, s);
            let b = lane_word(&names.b, target, z, s);
            writeln!(out, "    {b} = {};", syntax.rol(&a, amount))?;
        }
        Ok(())
    }

    /// χ for one lane, ι when it is lane (0, 0), and the sheet parity update.
    fn gen_chi_iota<W: Write>(
        &self,
        out: &mut W,
        lane: LaneIndex,
        prepare_theta: bool,
        in_chi_mask: ChiMask,
        out_chi_mask: ChiMask,
        names: &NameBinding,
    ) -> CodeGenResult<()> {
        let s = self.config.interleaving_factor;
        let syntax = self.syntax();
        let lane1 = LaneIndex::new(lane.x + 1, lane.y);
        let lane2 = LaneIndex::new(lane.x + 2, lane.y);
        let form = ChiForm::choose(
            in_chi_mask.is_complemented(lane),
            in_chi_mask.is_complemented(lane1),
            in_chi_mask.is_complemented(lane2),
            out_chi_mask.is_complemented(lane),
        );

        for z in 0..s {
            let b0 = lane_word(&names.b, lane, z, s);
            let b1 = lane_word(&names.b, lane1, z, s);
            let b2 = lane_word(&names.b, lane2, z, s);
            let e = lane_word(&names.e, lane, z, s);
            let nonlinear = syntax.and_or_not(&b1, &b2, form.negate_b1, form.negate_b2, form.or);
            writeln!(
                out,
                "    {e} = {};",
                syntax.xor(&syntax.not(&b0, form.negate_b0), &nonlinear)
            )?;

            if lane == LaneIndex::new(0, 0) {
                let constant = format!("{}[i]", self.round_constants_name(z));
                writeln!(out, "    {}", syntax.xor_eq(&e, &syntax.constant(&constant)))?;
            }

            if prepare_theta {
                let c = sheet_word(&names.c, lane.x, z, s);
                if lane.y == 0 {
                    writeln!(out, "    {c} = {e};")?;
                } else {
                    writeln!(out, "    {}", syntax.xor_eq(&c, &e))?;
                }
            }
        }
        Ok(())
    }

    /// The round constant tables, one entry per round, each word of an interleaved
    /// constant in its own table.
    pub fn gen_round_constants<W: Write>(&self, out: &mut W) -> CodeGenResult<()> {
        let s = self.config.interleaving_factor;
        let syntax = self.syntax();
        let word_type = syntax.word_type();
        let digits = self.word_size().div_ceil(4);
        let suffix = if self.word_size() == 64 { "ULL" } else { "" };
        let nr_rounds = self.geometry.nr_rounds();

        let words: Vec<Vec<u64>> = self
            .geometry
            .round_constants()
            .iter()
            .map(|&rc| deinterleave(rc, self.geometry.lane_size(), s))
            .collect();

        for z in 0..s {
            writeln!(
                out,
                "const {word_type} {}[{nr_rounds}] = {{",
                self.round_constants_name(z)
            )?;
            let entries = words
                .iter()
                .map(|word| format!("    0x{:0digits$X}{suffix}", word[z]))
                .join(",\n");
            writeln!(out, "{entries}")?;
            writeln!(out, "}};")?;
        }
        Ok(())
    }
}
