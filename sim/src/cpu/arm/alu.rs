use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::flags::ShiftKind;

/// The 16 data-processing operations. Discriminants match bits 24:21 of
/// the instruction word.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum AluInstruction {
    And = 0x0,
    Eor = 0x1,
    Sub = 0x2,
    Rsb = 0x3,
    Add = 0x4,
    Adc = 0x5,
    Sbc = 0x6,
    Rsc = 0x7,
    Tst = 0x8,
    Teq = 0x9,
    Cmp = 0xA,
    Cmn = 0xB,
    Orr = 0xC,
    Mov = 0xD,
    Bic = 0xE,
    Mvn = 0xF,
}

impl Display for AluInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Eor => f.write_str("EOR"),
            Self::Sub => f.write_str("SUB"),
            Self::Rsb => f.write_str("RSB"),
            Self::Add => f.write_str("ADD"),
            Self::Adc => f.write_str("ADC"),
            Self::Sbc => f.write_str("SBC"),
            Self::Rsc => f.write_str("RSC"),
            Self::Tst => f.write_str("TST"),
            Self::Teq => f.write_str("TEQ"),
            Self::Cmp => f.write_str("CMP"),
            Self::Cmn => f.write_str("CMN"),
            Self::Orr => f.write_str("ORR"),
            Self::Mov => f.write_str("MOV"),
            Self::Bic => f.write_str("BIC"),
            Self::Mvn => f.write_str("MVN"),
        }
    }
}

/// Logical operations recompute N and Z only; arithmetic ones also
/// recompute C and V.
#[derive(Eq, PartialEq, Debug)]
pub enum AluInstructionKind {
    Logical,
    Arithmetic,
}

pub trait Kind {
    fn kind(&self) -> AluInstructionKind;
}

impl Kind for AluInstruction {
    fn kind(&self) -> AluInstructionKind {
        use AluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match &self {
            And | Eor | Tst | Teq | Orr | Mov | Bic | Mvn => AluInstructionKind::Logical,
            Sub | Rsb | Add | Adc | Sbc | Rsc | Cmp | Cmn => AluInstructionKind::Arithmetic,
        }
    }
}

impl From<u32> for AluInstruction {
    fn from(alu_op_code: u32) -> Self {
        use AluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match alu_op_code {
            0x0 => And,
            0x1 => Eor,
            0x2 => Sub,
            0x3 => Rsb,
            0x4 => Add,
            0x5 => Adc,
            0x6 => Sbc,
            0x7 => Rsc,
            0x8 => Tst,
            0x9 => Teq,
            0xA => Cmp,
            0xB => Cmn,
            0xC => Orr,
            0xD => Mov,
            0xE => Bic,
            0xF => Mvn,
            _ => unreachable!(),
        }
    }
}

/// Where the barrel shifter takes its shift amount from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ShiftOperator {
    /// 5-bit amount encoded in the instruction (bits 11:7).
    Immediate(u32),

    /// Amount read from the bottom byte of a register (index in bits 11:8).
    Register(u32),
}

impl std::fmt::Display for ShiftOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate(value) => write!(f, "#{value}"),
            Self::Register(register) => write!(f, "R{register}"),
        }
    }
}

/// The flexible second operand of a data-processing instruction.
///
/// Exactly one variant applies, selected by the immediate-mode bit. The
/// immediate variant keeps the raw (base, rotate) pair from the word;
/// the effective value `base ROR (2 * rotate)` is computed at execution
/// time so decoding stays a pure bitfield split.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AluSecondOperandInfo {
    Register {
        shift_op: ShiftOperator,
        shift_kind: ShiftKind,
        register: u32,
    },
    Immediate {
        base: u32,
        rotate: u32,
    },
}

impl std::fmt::Display for AluSecondOperandInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Register {
                shift_op,
                shift_kind,
                register,
            } => {
                if let ShiftOperator::Immediate(amount) = shift_op {
                    if amount == 0 {
                        return match shift_kind {
                            ShiftKind::Lsl => write!(f, "R{register}"),
                            ShiftKind::Ror => write!(f, "R{register}, RRX"),
                            _ => write!(f, "R{register}, {shift_kind} #32"),
                        };
                    }
                }

                write!(f, "R{register}, {shift_kind} {shift_op}")
            }
            Self::Immediate { base, rotate } => {
                write!(f, "#{}", base.rotate_right(rotate * 2))
            }
        }
    }
}

/// The barrel shifter.
///
/// Returns the shifted value only: the shifter carry-out is not modeled
/// and no flag is ever touched here. `carry` feeds the value of an RRX
/// (immediate-encoded `ROR #0`), which rotates the old C flag into bit
/// 31.
///
/// An amount of 0 means the immediate encoding's special cases
/// (`LSL #0` pass-through, `LSR #0` = LSR #32, `ASR #0` = ASR #32,
/// `ROR #0` = RRX); callers resolving a register-held amount of zero
/// must pass the operand through unshifted instead.
#[must_use]
pub fn shift(kind: ShiftKind, shift_amount: u32, rm: u32, carry: bool) -> u32 {
    match kind {
        ShiftKind::Lsl => match shift_amount {
            // LSL#0: no shift performed, directly value=Rm.
            0 => rm,
            1..=31 => rm << shift_amount,
            // LSL#32 and beyond: all bits shifted out.
            _ => 0,
        },
        ShiftKind::Lsr => match shift_amount {
            // LSR#0 encodes LSR#32: zero result.
            1..=31 => rm >> shift_amount,
            _ => 0,
        },
        ShiftKind::Asr => match shift_amount {
            1..=31 => ((rm as i32) >> shift_amount) as u32,
            // ASR#0 encodes ASR#32: result filled with the sign bit.
            _ => ((rm as i32) >> 31) as u32,
        },
        ShiftKind::Ror => match shift_amount {
            // ROR#0 encodes RRX: rotate right by one through the carry.
            0 => (rm >> 1) | (u32::from(carry) << 31),
            // rotate_right reduces the amount modulo 32, which matches
            // ROR by n > 32 behaving as ROR by n - 32.
            _ => rm.rotate_right(shift_amount),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classify_logical_instruction() {
        assert_eq!(AluInstruction::from(9).kind(), AluInstructionKind::Logical);
    }

    #[test]
    fn classify_arithmetic_instruction() {
        assert_eq!(
            AluInstruction::from(2).kind(),
            AluInstructionKind::Arithmetic
        );
    }

    #[test]
    fn shift_lsl() {
        assert_eq!(shift(ShiftKind::Lsl, 0, 0xFF, false), 0xFF);
        assert_eq!(shift(ShiftKind::Lsl, 4, 0xFF, false), 0xFF0);
        assert_eq!(shift(ShiftKind::Lsl, 31, 1, false), 0x8000_0000);
        assert_eq!(shift(ShiftKind::Lsl, 32, 0xFFFF_FFFF, false), 0);
    }

    #[test]
    fn shift_lsr() {
        assert_eq!(shift(ShiftKind::Lsr, 4, 0xFF0, false), 0xFF);
        // LSR#0 encodes LSR#32.
        assert_eq!(shift(ShiftKind::Lsr, 0, 0xFFFF_FFFF, false), 0);
        assert_eq!(shift(ShiftKind::Lsr, 33, 0xFFFF_FFFF, false), 0);
    }

    #[test]
    fn shift_asr() {
        assert_eq!(shift(ShiftKind::Asr, 4, 0x8000_0000, false), 0xF800_0000);
        assert_eq!(shift(ShiftKind::Asr, 4, 0x0800_0000, false), 0x0080_0000);
        // ASR#0 encodes ASR#32: sign fill.
        assert_eq!(shift(ShiftKind::Asr, 0, 0x8000_0000, false), 0xFFFF_FFFF);
        assert_eq!(shift(ShiftKind::Asr, 0, 0x7FFF_FFFF, false), 0);
    }

    #[test]
    fn shift_ror_and_rrx() {
        assert_eq!(shift(ShiftKind::Ror, 8, 0x0000_00FF, false), 0xFF00_0000);
        // ROR#0 encodes RRX.
        assert_eq!(shift(ShiftKind::Ror, 0, 0b10, true), 0x8000_0001);
        assert_eq!(shift(ShiftKind::Ror, 0, 0b10, false), 0b1);
        // ROR by more than 32 behaves as ROR by n mod 32.
        assert_eq!(
            shift(ShiftKind::Ror, 40, 0x0000_00FF, false),
            shift(ShiftKind::Ror, 8, 0x0000_00FF, false)
        );
    }

    #[test]
    fn second_operand_display() {
        let operand = AluSecondOperandInfo::Immediate { base: 1, rotate: 0 };
        assert_eq!(operand.to_string(), "#1");

        let operand = AluSecondOperandInfo::Register {
            shift_op: ShiftOperator::Immediate(0),
            shift_kind: ShiftKind::Lsl,
            register: 2,
        };
        assert_eq!(operand.to_string(), "R2");

        let operand = AluSecondOperandInfo::Register {
            shift_op: ShiftOperator::Immediate(3),
            shift_kind: ShiftKind::Lsr,
            register: 7,
        };
        assert_eq!(operand.to_string(), "R7, LSR #3");
    }
}
