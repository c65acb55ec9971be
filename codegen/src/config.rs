use core::fmt;

use crate::error::CodeGenError;

/// Order in which the five lanes of a plane go through ρ/π and χ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScheduleType {
    /// All five B lanes of the plane are computed, then the five χ outputs.
    /// Best when plenty of registers are available.
    #[default]
    One,
    /// Each B lane is computed just before the first χ output that reads it.
    /// Best when registers are scarce.
    Two,
}

impl TryFrom<u32> for ScheduleType {
    type Error = CodeGenError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            _ => Err(CodeGenError::InvalidScheduleType(value)),
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => write!(f, "1"),
            Self::Two => write!(f, "2"),
        }
    }
}

/// One step of the per-plane schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PlaneStep {
    /// Compute `B[x, y]` from the A lane that π moves there.
    Load(usize),
    /// Compute `E[x, y]` with χ.
    Chi(usize),
}

impl ScheduleType {
    /// The ten steps needed for one plane, in emission order.
    pub(crate) const fn plane_steps(self) -> [PlaneStep; 10] {
        use PlaneStep::{Chi, Load};
        match self {
            Self::One => [
                Load(0),
                Load(1),
                Load(2),
                Load(3),
                Load(4),
                Chi(0),
                Chi(1),
                Chi(2),
                Chi(3),
                Chi(4),
            ],
            // χ at x reads B at x, x + 1 and x + 2.
            Self::Two => [
                Load(0),
                Load(1),
                Load(2),
                Chi(0),
                Load(3),
                Chi(1),
                Load(4),
                Chi(2),
                Chi(3),
                Chi(4),
            ],
        }
    }
}

/// How the generated code is shaped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeGenConfig {
    /// Number of words each lane is split into. Must divide the lane size.
    pub(crate) interleaving_factor: usize,
    /// Write bitwise operations as macros such as `XOR64(a, b)` instead of C operators.
    pub(crate) output_macros: bool,
    pub(crate) schedule: ScheduleType,
}

impl Default for CodeGenConfig {
    fn default() -> Self {
        Self {
            interleaving_factor: 1,
            output_macros: false,
            schedule: ScheduleType::One,
        }
    }
}

impl CodeGenConfig {
    pub const fn interleaving_factor(&self) -> usize {
        self.interleaving_factor
    }

    pub const fn output_macros(&self) -> bool {
        self.output_macros
    }

    pub const fn schedule(&self) -> ScheduleType {
        self.schedule
    }
}
