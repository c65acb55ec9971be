//! Assembly of a complete C header of macros implementing one Keccak-f instance.

use std::io::Write;

use tracing::{debug, instrument};

use crate::error::CodeGenResult;
use crate::generator::KeccakFCodeGen;
use crate::names::NameBinding;
use crate::polarity::{ChiMask, PolarityTracker};

/// Rates of the standard Keccak instances; those fitting the width get a copy-in macro.
const STANDARD_RATES: [usize; 6] = [576, 832, 1024, 1088, 1152, 1344];

/// Symbol selecting the lane complementing variant of the macros.
pub const LANE_COMPLEMENTING_SYMBOL: &str = "UseLaneComplementing";

impl KeccakFCodeGen {
    /// Rates for which [`gen_macro_file`](Self::gen_macro_file) writes a
    /// `copyFromStateAndXor<rate>bits` macro: the standard ones that fit the state, or the
    /// full width when none does.
    pub fn macro_rates(&self) -> Vec<usize> {
        let rates: Vec<_> = STANDARD_RATES
            .into_iter()
            .filter(|&bits| self.lanes_for_rate(bits).is_ok())
            .collect();
        if rates.is_empty() {
            vec![self.geometry.width()]
        } else {
            rates
        }
    }

    /// Writes a self-contained header: rotation and operator macros, `declareABCDE`,
    /// `prepareTheta`, the round macros `thetaRhoPiChiIotaPrepareTheta(i, A, E)` and
    /// `thetaRhoPiChiIota(i, A, E)`, the marshalling macros and the round constant tables.
    ///
    /// With `lane_complementing`, the round and marshalling macros come in two variants,
    /// the complemented one selected by defining `UseLaneComplementing`.
    #[instrument(skip_all, fields(geometry = %self.geometry.name(), lane_complementing = lane_complementing))]
    pub fn gen_macro_file<W: Write>(&self, out: &mut W, lane_complementing: bool) -> CodeGenResult<()> {
        self.gen_prelude(out)?;

        let standard = NameBinding::standard();
        let mut body = Vec::new();
        self.gen_declarations(&mut body, &standard)?;
        write_macro(out, "declareABCDE", &body)?;

        body.clear();
        self.gen_code_for_prepare_theta(&mut body, &standard)?;
        write_macro(out, "prepareTheta", &body)?;

        if lane_complementing {
            writeln!(out, "#ifdef {LANE_COMPLEMENTING_SYMBOL}")?;
            writeln!(out)?;
            self.gen_variant(out, ChiMask::LANE_COMPLEMENTING)?;
            writeln!(out, "#else /* {LANE_COMPLEMENTING_SYMBOL} */")?;
            writeln!(out)?;
            self.gen_variant(out, ChiMask::NONE)?;
            writeln!(out, "#endif /* {LANE_COMPLEMENTING_SYMBOL} */")?;
            writeln!(out)?;
        } else {
            self.gen_variant(out, ChiMask::NONE)?;
        }

        self.gen_round_constants(out)?;
        debug!(rates = ?self.macro_rates(), "macro file written");
        Ok(())
    }

    fn gen_prelude<W: Write>(&self, out: &mut W) -> CodeGenResult<()> {
        let ws = self.word_size();
        let word_type = self.syntax().word_type();
        let config = &self.config;

        writeln!(out, "/*")?;
        writeln!(out, "Code automatically generated for {}.", self.geometry.name())?;
        writeln!(
            out,
            "Interleaving factor {}, schedule type {}, {}-bit words held in {word_type}.",
            config.interleaving_factor,
            config.schedule,
            ws
        )?;
        writeln!(out, "*/")?;
        writeln!(out)?;

        writeln!(out, "#ifndef ROL{ws}")?;
        if ws < 8 {
            // Only the low bits of the word type are meaningful.
            let mask = (1u32 << ws) - 1;
            writeln!(
                out,
                "#define ROL{ws}(a, offset) (((((UINT8)(a)) << (offset)) ^ ((((UINT8)(a)) & {mask:#x}) >> ({ws}-(offset)))) & {mask:#x})"
            )?;
        } else {
            writeln!(
                out,
                "#define ROL{ws}(a, offset) ((((({word_type})(a)) << (offset)) ^ ((({word_type})(a)) >> ({ws}-(offset)))))"
            )?;
        }
        writeln!(out, "#endif")?;
        writeln!(out)?;

        if config.output_macros {
            let (not_a, not_b) = match self.syntax().word_mask() {
                Some(mask) => (format!("((~(a))&{mask})"), format!("((~(b))&{mask})")),
                None => ("(~(a))".to_string(), "(~(b))".to_string()),
            };
            writeln!(out, "#ifndef XOR{ws}")?;
            writeln!(out, "#define XOR{ws}(a, b) ((a)^(b))")?;
            writeln!(out, "#define XOReq{ws}(a, b) (a) ^= (b)")?;
            writeln!(out, "#define NOT{ws}(a) ({not_a})")?;
            for (op, symbol) in [("AND", '&'), ("OR", '|')] {
                for (suffix, left, right) in [
                    ("", "(a)", "(b)"),
                    ("nu", not_a.as_str(), "(b)"),
                    ("un", "(a)", not_b.as_str()),
                    ("nn", not_a.as_str(), not_b.as_str()),
                ] {
                    writeln!(out, "#define {op}{suffix}{ws}(a, b) ({left}{symbol}{right})")?;
                }
            }
            writeln!(out, "#define CONST{ws}(a) (a)")?;
            writeln!(out, "#endif")?;
            writeln!(out)?;
        }
        Ok(())
    }

    /// Round and marshalling macros for lanes complemented according to `mask` between
    /// rounds.
    fn gen_variant<W: Write>(&self, out: &mut W, mask: ChiMask) -> CodeGenResult<()> {
        let round_names = NameBinding::standard().with_input_output("A##", "E##");
        let in_chi_mask = PolarityTracker::new(mask).chi_input_mask(&self.geometry);
        let mut body = Vec::new();

        for (prepare_theta, name) in [
            (true, "thetaRhoPiChiIotaPrepareTheta(i, A, E)"),
            (false, "thetaRhoPiChiIota(i, A, E)"),
        ] {
            body.clear();
            let mut tracker = PolarityTracker::new(mask);
            self.gen_code_for_round(
                &mut body,
                prepare_theta,
                &mut tracker,
                in_chi_mask,
                mask,
                &round_names,
            )?;
            write_macro(out, name, &body)?;
        }

        let marshal_names = NameBinding::standard().with_input_output("X##", "E");
        for bits in self.macro_rates() {
            body.clear();
            self.gen_copy_from_state_and_xor(&mut body, bits, mask, &marshal_names)?;
            write_macro(
                out,
                &format!("copyFromStateAndXor{bits}bits(X, state, input)"),
                &body,
            )?;
        }

        body.clear();
        self.gen_copy_from_state_and_xor(&mut body, 0, mask, &marshal_names)?;
        write_macro(out, "copyFromState(X, state)", &body)?;

        body.clear();
        self.gen_copy_to_state(&mut body, mask, &marshal_names)?;
        write_macro(out, "copyToState(state, X)", &body)?;

        body.clear();
        let target = marshal_names.with_input_output("Y##", "E");
        self.gen_copy_state_variables(&mut body, &target, &marshal_names)?;
        write_macro(out, "copyStateVariables(X, Y)", &body)?;
        Ok(())
    }
}

/// Writes `body` as the replacement list of `#define signature`.
fn write_macro<W: Write>(out: &mut W, signature: &str, body: &[u8]) -> CodeGenResult<()> {
    writeln!(out, "#define {signature} \\")?;
    for line in String::from_utf8_lossy(body).lines() {
        writeln!(out, "{line} \\")?;
    }
    writeln!(out)?;
    Ok(())
}
