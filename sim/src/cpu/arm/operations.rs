//! # Execution Engine
//!
//! One executor per instruction class. Each validates every register
//! index it will touch before mutating anything, records the non-fatal
//! PC-as-operand warning, performs the operation in place on the
//! processor state and returns an [`ExecResult`] describing the control
//! flow.
//!
//! The program counter is read literally when used as a data operand:
//! no prefetch bias is applied. Flag recomputation always happens after
//! the destination write, from the operands that produced the result.

use crate::bitwise::Bits;
use crate::cpu::SIZE_OF_INSTRUCTION;
use crate::cpu::arm::alu::{AluInstruction, AluSecondOperandInfo, ShiftOperator, shift};
use crate::cpu::arm::instructions::MultiplyVariant;
use crate::cpu::core::Cpu;
use crate::cpu::exec::{ExecError, ExecResult};
use crate::cpu::registers::{REG_LINK, REG_PROGRAM_COUNTER};

impl Cpu {
    pub(crate) fn data_processing(
        &mut self,
        alu_instruction: AluInstruction,
        set_conditions: bool,
        rn: u32,
        destination: u32,
        op2: AluSecondOperandInfo,
    ) -> ExecResult {
        let pc = self.registers.program_counter();

        // All register indices are validated before anything mutates.
        let mut indices = vec![destination, rn];
        if let AluSecondOperandInfo::Register {
            shift_op, register, ..
        } = op2
        {
            indices.push(register);
            if let ShiftOperator::Register(rs) = shift_op {
                indices.push(rs);
            }
        }
        if let Some(&index) = indices.iter().find(|&&index| index > 15) {
            return ExecResult::fail(pc, ExecError::InvalidRegisterIndex { index });
        }

        // Reading PC as a source operand is legal but surprising in a
        // simulator without pipeline prefetch, so it is reported.
        let mut warning = None;
        let pc_as_source = rn == REG_PROGRAM_COUNTER
            || matches!(
                op2,
                AluSecondOperandInfo::Register { register, .. }
                    if register == REG_PROGRAM_COUNTER
            );
        if pc_as_source {
            tracing::warn!(opcode = %alu_instruction, "program counter used as operand register");
            warning = Some(ExecError::PcOperand);
        }

        let op1 = self.registers.register_at(rn as usize);
        let op2 = self.resolve_second_operand(op2);
        let rd = destination as usize;

        use AluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match alu_instruction {
            And => self.and(rd, op1, op2, set_conditions),
            Eor => self.eor(rd, op1, op2, set_conditions),
            Sub => self.sub(rd, op1, op2, set_conditions),
            Rsb => self.sub(rd, op2, op1, set_conditions),
            Add => self.add(rd, op1, op2, set_conditions),
            Adc => self.adc(rd, op1, op2, set_conditions),
            Sbc => self.sbc(rd, op1, op2, set_conditions),
            Rsc => self.sbc(rd, op2, op1, set_conditions),
            // Compare operations recompute the flags regardless of the
            // set-flags bit; that is their only effect.
            Tst => self.tst(op1, op2),
            Teq => self.teq(op1, op2),
            Cmp => self.cmp(op1, op2),
            Cmn => self.cmn(op1, op2),
            Orr => self.orr(rd, op1, op2, set_conditions),
            Mov => self.mov(rd, op2, set_conditions),
            Bic => self.bic(rd, op1, op2, set_conditions),
            Mvn => self.mvn(rd, op2, set_conditions),
        }

        let result = ExecResult::advance(pc);
        match warning {
            Some(warning) => result.with_warning(warning),
            None => result,
        }
    }

    /// Resolves the flexible second operand: the rotated immediate or
    /// the barrel-shifted register value.
    fn resolve_second_operand(&self, op2: AluSecondOperandInfo) -> u32 {
        match op2 {
            AluSecondOperandInfo::Immediate { base, rotate } => base.rotate_right(rotate * 2),
            AluSecondOperandInfo::Register {
                shift_op,
                shift_kind,
                register,
            } => {
                let rm = self.registers.register_at(register as usize);
                match shift_op {
                    ShiftOperator::Immediate(amount) => {
                        shift(shift_kind, amount, rm, self.cpsr.carry_flag())
                    }
                    ShiftOperator::Register(rs) => {
                        // Only the bottom byte of Rs is used; a zero byte
                        // leaves Rm unshifted (the RRX encoding applies
                        // only to an immediate ROR #0).
                        let amount = self.registers.register_at(rs as usize).get_bits(0..=7);
                        if amount == 0 {
                            rm
                        } else {
                            shift(shift_kind, amount, rm, self.cpsr.carry_flag())
                        }
                    }
                }
            }
        }
    }

    fn and(&mut self, rd: usize, op1: u32, op2: u32, s: bool) {
        let result = op1 & op2;

        self.registers.set_register_at(rd, result);

        if s {
            self.cpsr.extract_negative(result);
            self.cpsr.extract_zero(result);
        }
    }

    fn eor(&mut self, rd: usize, op1: u32, op2: u32, s: bool) {
        let result = op1 ^ op2;

        self.registers.set_register_at(rd, result);

        if s {
            self.cpsr.extract_negative(result);
            self.cpsr.extract_zero(result);
        }
    }

    fn orr(&mut self, rd: usize, op1: u32, op2: u32, s: bool) {
        let result = op1 | op2;

        self.registers.set_register_at(rd, result);

        if s {
            self.cpsr.extract_negative(result);
            self.cpsr.extract_zero(result);
        }
    }

    fn bic(&mut self, rd: usize, op1: u32, op2: u32, s: bool) {
        let result = op1 & !op2;

        self.registers.set_register_at(rd, result);

        if s {
            self.cpsr.extract_negative(result);
            self.cpsr.extract_zero(result);
        }
    }

    fn add(&mut self, rd: usize, op1: u32, op2: u32, s: bool) {
        let result = op1.wrapping_add(op2);

        self.registers.set_register_at(rd, result);

        if s {
            self.cpsr.extract_negative(result);
            self.cpsr.extract_zero(result);
            self.cpsr.extract_carry_add(op1, op2);
            self.cpsr.extract_overflow_add(op1, op2, result);
        }
    }

    fn sub(&mut self, rd: usize, op1: u32, op2: u32, s: bool) {
        let result = op1.wrapping_sub(op2);

        self.registers.set_register_at(rd, result);

        if s {
            self.cpsr.extract_negative(result);
            self.cpsr.extract_zero(result);
            self.cpsr.extract_carry_sub(op1, op2);
            self.cpsr.extract_overflow_sub(op1, op2, result);
        }
    }

    fn adc(&mut self, rd: usize, op1: u32, op2: u32, s: bool) {
        // The carry is folded into the second operand before computing;
        // result and flags both see the folded value.
        let op2 = op2.wrapping_add(self.cpsr.carry_flag().into());
        self.add(rd, op1, op2, s);
    }

    fn sbc(&mut self, rd: usize, op1: u32, op2: u32, s: bool) {
        // Carry clear means an outstanding borrow of one.
        let borrow = 1 - u32::from(self.cpsr.carry_flag());
        let op2 = op2.wrapping_add(borrow);
        self.sub(rd, op1, op2, s);
    }

    fn tst(&mut self, op1: u32, op2: u32) {
        let result = op1 & op2;

        self.cpsr.extract_negative(result);
        self.cpsr.extract_zero(result);
    }

    fn teq(&mut self, op1: u32, op2: u32) {
        let result = op1 ^ op2;

        self.cpsr.extract_negative(result);
        self.cpsr.extract_zero(result);
    }

    fn cmp(&mut self, op1: u32, op2: u32) {
        let result = op1.wrapping_sub(op2);

        self.cpsr.extract_negative(result);
        self.cpsr.extract_zero(result);
        self.cpsr.extract_carry_sub(op1, op2);
        self.cpsr.extract_overflow_sub(op1, op2, result);
    }

    fn cmn(&mut self, op1: u32, op2: u32) {
        let result = op1.wrapping_add(op2);

        self.cpsr.extract_negative(result);
        self.cpsr.extract_zero(result);
        self.cpsr.extract_carry_add(op1, op2);
        self.cpsr.extract_overflow_add(op1, op2, result);
    }

    fn mov(&mut self, rd: usize, op2: u32, s: bool) {
        self.registers.set_register_at(rd, op2);

        if s {
            self.cpsr.extract_negative(op2);
            self.cpsr.extract_zero(op2);
        }
    }

    fn mvn(&mut self, rd: usize, op2: u32, s: bool) {
        let result = !op2;

        self.registers.set_register_at(rd, result);

        if s {
            self.cpsr.extract_negative(result);
            self.cpsr.extract_zero(result);
        }
    }

    pub(crate) fn multiply(
        &mut self,
        variant: MultiplyVariant,
        set_conditions: bool,
        rd: u32,
        rn: u32,
        rs: u32,
        rm: u32,
    ) -> ExecResult {
        let pc = self.registers.program_counter();

        let mut indices = vec![rd, rm, rs];
        if variant == MultiplyVariant::Mla {
            indices.push(rn);
        }
        if let Some(&index) = indices.iter().find(|&&index| index > 15) {
            return ExecResult::fail(pc, ExecError::InvalidRegisterIndex { index });
        }

        let mut warning = None;
        let sources = match variant {
            MultiplyVariant::Mul => rm == REG_PROGRAM_COUNTER || rs == REG_PROGRAM_COUNTER,
            MultiplyVariant::Mla => {
                rm == REG_PROGRAM_COUNTER
                    || rs == REG_PROGRAM_COUNTER
                    || rn == REG_PROGRAM_COUNTER
            }
        };
        if sources {
            tracing::warn!(%variant, "program counter used as operand register");
            warning = Some(ExecError::PcOperand);
        }

        let multiplicand = self.registers.register_at(rm as usize);
        let multiplier = self.registers.register_at(rs as usize);

        let mut result = multiplicand.wrapping_mul(multiplier);
        if variant == MultiplyVariant::Mla {
            result = result.wrapping_add(self.registers.register_at(rn as usize));
        }

        self.registers.set_register_at(rd as usize, result);

        if set_conditions {
            self.cpsr.extract_negative(result);
            self.cpsr.extract_zero(result);
        }

        let exec = ExecResult::advance(pc);
        match warning {
            Some(warning) => exec.with_warning(warning),
            None => exec,
        }
    }

    /// Branch, condition already gated by the dispatcher.
    pub(crate) fn branch(&mut self, link: bool, offset: i32) -> ExecResult {
        let pc = self.registers.program_counter();

        if link {
            // The address of the instruction after the branch under the
            // prefetch convention, with the low 2 bits cleared for
            // word alignment.
            let return_address = pc.wrapping_sub(SIZE_OF_INSTRUCTION) & !0b11;
            self.registers.set_register_at(REG_LINK, return_address);
        }

        ExecResult::jump(pc.wrapping_add_signed(offset))
    }

    /// Branch-and-exchange, condition already gated by the dispatcher.
    ///
    /// # Panics
    ///
    /// Using R15 as the operand register is a contract precondition: no
    /// assembler emits it, so it is an assertion rather than a
    /// recoverable error.
    pub(crate) fn branch_and_exchange(&mut self, register: u32) -> ExecResult {
        assert!(
            register != REG_PROGRAM_COUNTER,
            "BX with R15 as operand is undefined"
        );

        let pc = self.registers.program_counter();

        if register > 15 {
            return ExecResult::fail(pc, ExecError::InvalidRegisterIndex { index: register });
        }

        let target = self.registers.register_at(register as usize);

        // Bit 0 of the target requests Thumb state, which this simulator
        // does not model.
        if target.get_bit(0) {
            return ExecResult::fail(pc, ExecError::UnsupportedThumbState { address: target });
        }

        ExecResult::jump(target & !0b11)
    }
}
