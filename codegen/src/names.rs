use kt_keccak::LaneIndex;

/// Letters for the x coordinate of a lane, sheet or word name.
const X_LETTERS: [char; 5] = ['a', 'e', 'i', 'o', 'u'];
/// Letters for the y coordinate of a lane name.
const Y_LETTERS: [char; 5] = ['b', 'g', 'k', 'm', 's'];

/// The identifiers the generated code uses for each role of the state.
///
/// * `a`: the round input, `b`: the lanes after ρ and π, `c`: the sheet parities,
///   `d`: the θ terms, `e`: the round output.
/// * `state` and `input`: the word arrays used by the marshalling code.
///
/// Lane words are named `{prefix}{y letter}{x letter}[z]` and sheet words
/// `{prefix}{x letter}[z]`, the word index `z` only appearing when lanes are interleaved.
/// Using a prefix ending in `##` (e.g. `A##`) yields token-pasting macro parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameBinding {
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
    pub e: String,
    pub state: String,
    pub input: String,
}

impl NameBinding {
    /// The plain names `A` to `E`, `state` and `input`.
    pub fn standard() -> Self {
        Self {
            a: "A".into(),
            b: "B".into(),
            c: "C".into(),
            d: "D".into(),
            e: "E".into(),
            state: "state".into(),
            input: "input".into(),
        }
    }

    /// Names for code reading its input from `a` and writing its output to `e`, all other
    /// roles keeping their current names.
    pub fn with_input_output(&self, a: impl Into<String>, e: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            e: e.into(),
            ..self.clone()
        }
    }

    /// The same binding with the round input and output swapped, as used by every other
    /// round of an unrolled loop.
    pub fn swapped(&self) -> Self {
        self.with_input_output(self.e.clone(), self.a.clone())
    }
}

/// Name of word `z` of lane `(x, y)`.
pub(crate) fn lane_word(prefix: &str, lane: LaneIndex, z: usize, interleaving: usize) -> String {
    let mut name = format!("{prefix}{}{}", Y_LETTERS[lane.y], X_LETTERS[lane.x]);
    if interleaving > 1 {
        name.push_str(&z.to_string());
    }
    name
}

/// Name of word `z` of sheet `x`.
pub(crate) fn sheet_word(prefix: &str, x: usize, z: usize, interleaving: usize) -> String {
    let mut name = format!("{prefix}{}", X_LETTERS[x % 5]);
    if interleaving > 1 {
        name.push_str(&z.to_string());
    }
    name
}
