use serde::{Deserialize, Serialize};

use crate::cpu::arm::instructions::ArmInstruction;
use crate::cpu::arm::opcode::ArmOpcode;
use crate::cpu::exec::{ExecError, ExecResult};
use crate::cpu::psr::Psr;
use crate::cpu::registers::Registers;

/// The processor: sixteen general registers plus the current program
/// status register. A fresh core has every register and every flag at
/// zero.
#[derive(Default, Serialize, Deserialize)]
pub struct Cpu {
    pub registers: Registers,
    pub cpsr: Psr,
}

impl Cpu {
    pub fn decode(&self, word: u32) -> ArmOpcode {
        let op_code = ArmOpcode::from(word);
        tracing::debug!("{op_code}");
        op_code
    }

    pub fn execute_arm(&mut self, op_code: ArmOpcode) -> ExecResult {
        let pc = self.registers.program_counter();

        // The halt marker is the all-zero word: its condition bits read
        // as EQ, so it is dispatched before the condition gate.
        if matches!(op_code.instruction, ArmInstruction::Halt) {
            return ExecResult::halt(pc);
        }

        if !self.cpsr.can_execute(op_code.condition) {
            return ExecResult::advance(pc);
        }

        match op_code.instruction {
            ArmInstruction::DataProcessing {
                condition: _,
                alu_instruction,
                set_conditions,
                op_kind: _,
                rn,
                destination,
                op2,
            } => self.data_processing(alu_instruction, set_conditions, rn, destination, op2),
            ArmInstruction::Multiply {
                variant,
                condition: _,
                set_conditions,
                rd_destination_register,
                rn_accumulate_register,
                rs_operand_register,
                rm_operand_register,
            } => self.multiply(
                variant,
                set_conditions,
                rd_destination_register,
                rn_accumulate_register,
                rs_operand_register,
                rm_operand_register,
            ),
            ArmInstruction::Branch { link, offset, .. } => self.branch(link, offset),
            ArmInstruction::BranchAndExchange { register, .. } => {
                self.branch_and_exchange(register)
            }
            ArmInstruction::Halt => unreachable!(),
            ArmInstruction::Undefined => {
                ExecResult::fail(pc, ExecError::UnknownOperation { word: op_code.raw })
            }
        }
    }
}
