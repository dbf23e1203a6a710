use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpu::SIZE_OF_INSTRUCTION;

/// Outcome of executing one instruction, handed back to the driver.
///
/// `next_pc` defaults to the current PC plus one instruction width and is
/// overridden only by a taken branch or branch-and-exchange. `error`
/// carries at most one error or warning; warnings do not prevent the
/// instruction from completing.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ExecResult {
    pub next_pc: u32,
    pub should_halt: bool,
    pub error: Option<ExecError>,
}

impl ExecResult {
    /// Sequential flow: the driver advances PC by one instruction width.
    #[must_use]
    pub const fn advance(pc: u32) -> Self {
        Self {
            next_pc: pc.wrapping_add(SIZE_OF_INSTRUCTION),
            should_halt: false,
            error: None,
        }
    }

    /// A taken branch: PC moves to `next_pc` directly.
    #[must_use]
    pub const fn jump(next_pc: u32) -> Self {
        Self {
            next_pc,
            should_halt: false,
            error: None,
        }
    }

    /// Execution stops after this instruction. No state was mutated.
    #[must_use]
    pub const fn halt(pc: u32) -> Self {
        Self {
            next_pc: pc,
            should_halt: true,
            error: None,
        }
    }

    /// The instruction failed; no state beyond already-completed steps
    /// was mutated. The driver decides whether to stop the run.
    #[must_use]
    pub const fn fail(pc: u32, error: ExecError) -> Self {
        Self {
            next_pc: pc,
            should_halt: false,
            error: Some(error),
        }
    }

    /// Attaches a non-fatal warning, keeping the flow already decided.
    #[must_use]
    pub fn with_warning(mut self, warning: ExecError) -> Self {
        debug_assert!(!warning.is_fatal());
        self.error.get_or_insert(warning);
        self
    }
}

/// Errors and warnings an executor can report.
///
/// `PcOperand` is the only non-fatal variant: reading the program counter
/// as a data operand is legal in ARM programs, but this simulator reads
/// it literally (no prefetch bias), so the event is surfaced for the
/// driver to log.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum ExecError {
    #[error("unknown operation in word {word:#010X}")]
    UnknownOperation { word: u32 },

    #[error("register index {index} outside [0,15]")]
    InvalidRegisterIndex { index: u32 },

    #[error("program counter (R15) used as operand register")]
    PcOperand,

    #[error("branch target {address:#010X} selects Thumb state, which is not supported")]
    UnsupportedThumbState { address: u32 },
}

impl ExecError {
    /// Fatal errors abort the instruction and are surfaced to the driver;
    /// warnings are reported but execution proceeds.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::PcOperand)
    }
}
