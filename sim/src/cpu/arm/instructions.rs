//! # Instruction Decoding
//!
//! Decodes 32-bit instruction words into their component fields and
//! classifies them by type. Decoding is a pure bitfield split: it never
//! reads processor state and performs no semantic register-bounds
//! validation (the execution engine validates indices before any
//! register is read).
//!
//! ## Instruction Categories
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  Bits 27-25 determine the basic category:                      │
//! │                                                                │
//! │  000 + special patterns  →  Multiply, BX                       │
//! │  00x                     →  Data Processing                    │
//! │  101                     →  Branch (B/BL)                      │
//! │                                                                │
//! │  The all-zero word is reserved as the halt marker and is       │
//! │  matched before anything else.                                 │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Patterns overlap, so the decoder checks the most constrained
//! encodings first: halt, then BX, then multiply, then branch, then data
//! processing. Anything else is `Undefined`.
//!
//! ## Instruction Encoding Example
//!
//! ```text
//! ADD R0, R1, R2, LSL #3
//!
//! 31-28  27-26  25  24-21  20  19-16  15-12  11-7   6-5  4  3-0
//! [1110] [ 00 ] [0] [0100] [0] [0001] [0000] [00011][00] [0][0010]
//!   ↑       ↑    ↑    ↑     ↑    ↑      ↑      ↑     ↑   ↑   ↑
//!   │       │    │    │     │    │      │      │     │   │   └─ Rm = R2
//!   │       │    │    │     │    │      │      │     │   └──── Shift by imm
//!   │       │    │    │     │    │      │      │     └──────── LSL
//!   │       │    │    │     │    │      │      └────────────── Shift = 3
//!   │       │    │    │     │    │      └───────────────────── Rd = R0
//!   │       │    │    │     │    └──────────────────────────── Rn = R1
//!   │       │    │    │     └───────────────────────────────── S = 0 (no flags)
//!   │       │    │    └─────────────────────────────────────── ADD opcode
//!   │       │    └──────────────────────────────────────────── Register operand
//!   │       └───────────────────────────────────────────────── Data processing
//!   └───────────────────────────────────────────────────────── Always execute
//! ```

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::arm::alu::{AluInstruction, AluSecondOperandInfo, ShiftOperator};
use crate::cpu::condition::Condition;
use crate::cpu::flags::{OperandKind, ShiftKind};

/// A fully decoded instruction.
///
/// | Variant             | Example Instructions | Description            |
/// |---------------------|----------------------|------------------------|
/// | `DataProcessing`    | AND, ADD, CMP, MOV   | ALU operations         |
/// | `Multiply`          | MUL, MLA             | 32-bit multiply        |
/// | `Branch`            | B, BL                | Branch (and link)      |
/// | `BranchAndExchange` | BX                   | Branch via register    |
/// | `Halt`              | (all-zero word)      | Stop marker            |
/// | `Undefined`         | -                    | Unrecognized encoding  |
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum ArmInstruction {
    /// Data Processing: ALU operations (AND, ADD, CMP, MOV, etc.)
    DataProcessing {
        condition: Condition,
        alu_instruction: AluInstruction,
        set_conditions: bool,
        op_kind: OperandKind,
        rn: u32,
        destination: u32,
        op2: AluSecondOperandInfo,
    },
    Multiply {
        variant: MultiplyVariant,
        condition: Condition,
        set_conditions: bool,
        rd_destination_register: u32,
        rn_accumulate_register: u32,
        rs_operand_register: u32,
        rm_operand_register: u32,
    },
    Branch {
        condition: Condition,
        link: bool,
        /// Byte offset, sign-extended from the 24-bit field and scaled
        /// by the instruction width at decode time.
        offset: i32,
    },
    BranchAndExchange {
        condition: Condition,
        register: u32,
    },
    /// The all-zero word, reserved as the simulator's stop marker. Its
    /// condition bits are not meaningful and never gate termination.
    Halt,
    Undefined,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultiplyVariant {
    Mul,
    Mla,
}

impl std::fmt::Display for MultiplyVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mul => f.write_str("MUL"),
            Self::Mla => f.write_str("MLA"),
        }
    }
}

impl From<u32> for MultiplyVariant {
    fn from(op_code: u32) -> Self {
        match op_code.get_bit(21) {
            false => Self::Mul,
            true => Self::Mla,
        }
    }
}

impl ArmInstruction {
    /// Renders an assembler-like mnemonic, used in debug logs and tests.
    #[must_use]
    pub fn disassembler(&self) -> String {
        match self {
            Self::DataProcessing {
                condition,
                alu_instruction,
                set_conditions,
                op_kind: _,
                rn,
                destination,
                op2,
            } => {
                let set_string = if *set_conditions { "S" } else { "" };
                match alu_instruction {
                    AluInstruction::And
                    | AluInstruction::Eor
                    | AluInstruction::Sub
                    | AluInstruction::Rsb
                    | AluInstruction::Add
                    | AluInstruction::Adc
                    | AluInstruction::Sbc
                    | AluInstruction::Rsc
                    | AluInstruction::Orr
                    | AluInstruction::Bic => {
                        format!(
                            "{alu_instruction}{condition}{set_string} R{destination}, R{rn}, {op2}"
                        )
                    }
                    AluInstruction::Tst
                    | AluInstruction::Teq
                    | AluInstruction::Cmp
                    | AluInstruction::Cmn => {
                        format!("{alu_instruction}{condition} R{rn}, {op2}")
                    }
                    AluInstruction::Mov | AluInstruction::Mvn => {
                        format!("{alu_instruction}{condition}{set_string} R{destination}, {op2}")
                    }
                }
            }
            Self::Multiply {
                variant,
                condition,
                set_conditions,
                rd_destination_register,
                rn_accumulate_register,
                rs_operand_register,
                rm_operand_register,
            } => {
                let set_string = if *set_conditions { "S" } else { "" };
                match variant {
                    MultiplyVariant::Mul => format!(
                        "MUL{condition}{set_string} R{rd_destination_register}, R{rm_operand_register}, R{rs_operand_register}"
                    ),
                    MultiplyVariant::Mla => format!(
                        "MLA{condition}{set_string} R{rd_destination_register}, R{rm_operand_register}, R{rs_operand_register}, R{rn_accumulate_register}"
                    ),
                }
            }
            Self::Branch {
                condition,
                link,
                offset,
            } => {
                let link = if *link { "L" } else { "" };
                format!("B{link}{condition} #{offset}")
            }
            Self::BranchAndExchange {
                condition,
                register,
            } => format!("BX{condition} R{register}"),
            Self::Halt => "HALT".to_string(),
            Self::Undefined => "UNDEFINED".to_string(),
        }
    }
}

impl From<u32> for ArmInstruction {
    fn from(op_code: u32) -> Self {
        // The halt word carries no meaningful fields, so it is matched
        // before anything else (its condition bits would read as EQ).
        if op_code == 0 {
            return Self::Halt;
        }

        let condition = Condition::from(op_code.get_bits(28..=31) as u8);

        // Most-constrained patterns first: encodings overlap and the
        // number of fixed bits decides the priority.
        if op_code.get_bits(4..=27) == 0b0001_0010_1111_1111_1111_0001 {
            let register = op_code.get_bits(0..=3);
            Self::BranchAndExchange {
                condition,
                register,
            }
        } else if op_code.get_bits(22..=27) == 0b00_0000 && op_code.get_bits(4..=7) == 0b1001 {
            let variant = MultiplyVariant::from(op_code);
            let set_conditions = op_code.get_bit(20);

            let rm_operand_register = op_code.get_bits(0..=3);
            let rs_operand_register = op_code.get_bits(8..=11);
            let rn_accumulate_register = op_code.get_bits(12..=15);
            let rd_destination_register = op_code.get_bits(16..=19);

            Self::Multiply {
                variant,
                condition,
                set_conditions,
                rd_destination_register,
                rn_accumulate_register,
                rs_operand_register,
                rm_operand_register,
            }
        } else if op_code.get_bits(25..=27) == 0b101 {
            let link = op_code.get_bit(24);
            // Sign-extend the 24-bit field, then scale instruction
            // counts to bytes.
            let offset = (op_code.get_bits(0..=23) << 2).sign_extended(26) as i32;
            Self::Branch {
                condition,
                link,
                offset,
            }
        } else if op_code.get_bits(26..=27) == 0b00 {
            let alu_instruction = op_code.get_bits(21..=24).into();
            let set_conditions = op_code.get_bit(20);
            let rn = op_code.get_bits(16..=19);
            let op_kind: OperandKind = op_code.get_bit(25).into();
            let rd = op_code.get_bits(12..=15);

            let op2 = match op_kind {
                OperandKind::Immediate => {
                    let rotate = op_code.get_bits(8..=11);
                    let base = op_code.get_bits(0..=7);
                    AluSecondOperandInfo::Immediate { base, rotate }
                }
                OperandKind::Register => {
                    let shift_kind: ShiftKind = op_code.get_bits(5..=6).into();
                    let shift_by_register_bit = op_code.get_bit(4);
                    let register = op_code.get_bits(0..=3);
                    let shift_op = if shift_by_register_bit {
                        ShiftOperator::Register(op_code.get_bits(8..=11))
                    } else {
                        ShiftOperator::Immediate(op_code.get_bits(7..=11))
                    };
                    AluSecondOperandInfo::Register {
                        shift_op,
                        shift_kind,
                        register,
                    }
                }
            };

            Self::DataProcessing {
                condition,
                alu_instruction,
                set_conditions,
                op_kind,
                rn,
                destination: rd,
                op2,
            }
        } else {
            tracing::warn!("unrecognized encoding: opcode={op_code:#010X}");
            Self::Undefined
        }
    }
}

impl std::fmt::Display for ArmInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_branch() {
        let output = ArmInstruction::from(0b1110_1011_0000_0000_0000_0000_0111_1111);
        assert_eq!(
            ArmInstruction::Branch {
                condition: Condition::AL,
                link: true,
                offset: 508,
            },
            output
        );
        assert_eq!("BL #508", output.disassembler());

        let output = ArmInstruction::from(0b0000_1010_0000_0000_0000_0000_0111_1111);
        assert_eq!(
            ArmInstruction::Branch {
                condition: Condition::EQ,
                link: false,
                offset: 508,
            },
            output
        );
        assert_eq!("BEQ #508", output.disassembler());
    }

    #[test]
    fn decode_branch_negative_offset() {
        // All-ones 24-bit field: -1 instruction = -4 bytes.
        let output = ArmInstruction::from(0b1110_1010_1111_1111_1111_1111_1111_1111);
        assert_eq!(
            ArmInstruction::Branch {
                condition: Condition::AL,
                link: false,
                offset: -4,
            },
            output
        );
    }

    #[test]
    fn decode_branch_and_exchange() {
        let output = ArmInstruction::from(0b1110_0001_0010_1111_1111_1111_0001_0001);
        assert_eq!(
            ArmInstruction::BranchAndExchange {
                condition: Condition::AL,
                register: 1
            },
            output
        );
        assert_eq!("BX R1", output.disassembler());

        let output = ArmInstruction::from(0b0000_0001_0010_1111_1111_1111_0001_0001);
        assert_eq!(
            ArmInstruction::BranchAndExchange {
                condition: Condition::EQ,
                register: 1
            },
            output
        );
        assert_eq!("BXEQ R1", output.disassembler());
    }

    #[test]
    fn decode_data_processing_register_operand() {
        // ADD R0, R1, R2, LSL #3
        let output = ArmInstruction::from(0b1110_00_0_0100_0_0001_0000_00011_00_0_0010);
        assert_eq!(
            ArmInstruction::DataProcessing {
                condition: Condition::AL,
                alu_instruction: AluInstruction::Add,
                set_conditions: false,
                op_kind: OperandKind::Register,
                rn: 1,
                destination: 0,
                op2: AluSecondOperandInfo::Register {
                    shift_op: ShiftOperator::Immediate(3),
                    shift_kind: ShiftKind::Lsl,
                    register: 2,
                },
            },
            output
        );
        assert_eq!("ADD R0, R1, R2, LSL #3", output.disassembler());
    }

    #[test]
    fn decode_data_processing_immediate_operand() {
        // MOVS R7, #255 ROR (2*2)
        let output = ArmInstruction::from(0b1110_00_1_1101_1_0000_0111_0010_11111111);
        assert_eq!(
            ArmInstruction::DataProcessing {
                condition: Condition::AL,
                alu_instruction: AluInstruction::Mov,
                set_conditions: true,
                op_kind: OperandKind::Immediate,
                rn: 0,
                destination: 7,
                op2: AluSecondOperandInfo::Immediate {
                    base: 255,
                    rotate: 2
                },
            },
            output
        );
    }

    #[test]
    fn decode_data_processing_shift_from_register() {
        // ORR R3, R4, R5, ASR R6
        let output = ArmInstruction::from(0b1110_00_0_1100_0_0100_0011_0110_0_10_1_0101);
        assert_eq!(
            ArmInstruction::DataProcessing {
                condition: Condition::AL,
                alu_instruction: AluInstruction::Orr,
                set_conditions: false,
                op_kind: OperandKind::Register,
                rn: 4,
                destination: 3,
                op2: AluSecondOperandInfo::Register {
                    shift_op: ShiftOperator::Register(6),
                    shift_kind: ShiftKind::Asr,
                    register: 5,
                },
            },
            output
        );
        assert_eq!("ORR R3, R4, R5, ASR R6", output.disassembler());
    }

    #[test]
    fn decode_multiply() {
        // MUL R2, R0, R1
        let output = ArmInstruction::from(0b1110_000000_0_0_0010_0000_0001_1001_0000);
        assert_eq!(
            ArmInstruction::Multiply {
                variant: MultiplyVariant::Mul,
                condition: Condition::AL,
                set_conditions: false,
                rd_destination_register: 2,
                rn_accumulate_register: 0,
                rs_operand_register: 1,
                rm_operand_register: 0,
            },
            output
        );
        assert_eq!("MUL R2, R0, R1", output.disassembler());

        // MLAS R4, R1, R2, R3
        let output = ArmInstruction::from(0b1110_000000_1_1_0100_0011_0010_1001_0001);
        assert_eq!(
            ArmInstruction::Multiply {
                variant: MultiplyVariant::Mla,
                condition: Condition::AL,
                set_conditions: true,
                rd_destination_register: 4,
                rn_accumulate_register: 3,
                rs_operand_register: 2,
                rm_operand_register: 1,
            },
            output
        );
    }

    #[test]
    fn decode_halt_before_condition() {
        // The zero word's condition bits would read as EQ; it must still
        // decode as the stop marker.
        assert_eq!(ArmInstruction::from(0), ArmInstruction::Halt);
    }

    #[test]
    fn decode_unrecognized_encoding() {
        // Bits 27:25 = 010 is a load/store encoding, outside this core.
        let output = ArmInstruction::from(0b1110_0101_0001_0001_0101_0000_0000_1100);
        assert_eq!(output, ArmInstruction::Undefined);
    }

    #[test]
    fn decode_is_pure() {
        let word = 0b1110_00_0_0100_1_0001_0000_00000_00_0_0010;
        assert_eq!(ArmInstruction::from(word), ArmInstruction::from(word));
    }

    #[test]
    fn encode_decode_round_trip() {
        // Every ALU opcode and register index survives encode → decode.
        let encode = |op: u32, rd: u32, rn: u32, rm: u32| -> u32 {
            // cond AL | 00 | I=0 | op | S=1 | rn | rd | no shift | rm
            (0b1110 << 28) | (op << 21) | (1 << 20) | (rn << 16) | (rd << 12) | rm
        };

        for op in 0..16_u32 {
            for reg in 0..16_u32 {
                let word = encode(op, reg, 15 - reg, reg);
                let decoded = ArmInstruction::from(word);
                assert_eq!(
                    decoded,
                    ArmInstruction::DataProcessing {
                        condition: Condition::AL,
                        alu_instruction: AluInstruction::from(op),
                        set_conditions: true,
                        op_kind: OperandKind::Register,
                        rn: 15 - reg,
                        destination: reg,
                        op2: AluSecondOperandInfo::Register {
                            shift_op: ShiftOperator::Immediate(0),
                            shift_kind: ShiftKind::Lsl,
                            register: reg,
                        },
                    }
                );
            }
        }
    }
}
