//! # Program Status Register
//!
//! The PSR holds the condition flags (N, Z, C, V) plus the Thumb-state
//! bit. The simulator carries the state bit but never executes in Thumb
//! state.
//!
//! ```text
//! 31 30 29 28 27       6 5 4       0
//! ┌──┬──┬──┬──┬──────────┬─┬────────┐
//! │N │Z │C │V │ Reserved │T│Reserved│
//! └──┴──┴──┴──┴──────────┴─┴────────┘
//! ```
//!
//! - **Flags (28-31)**: See [`condition`](super::condition) for how these
//!   are tested
//! - **T bit (5)**: ARM (0) or Thumb (1) state

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::condition::Condition;

/// Program Status Register.
///
/// Wraps a raw `u32` and provides type-safe accessors for each flag.
/// The `extract_*` methods fully recompute one flag from the operands of
/// the instruction just executed; they never merge stale state and never
/// touch the other flags.
///
/// # Example
///
/// ```
/// use sim::cpu::psr::Psr;
///
/// let mut cpsr = Psr::default();
///
/// cpsr.set_zero_flag(true);
/// assert!(cpsr.zero_flag());
///
/// cpsr.extract_carry_add(u32::MAX, 1);
/// assert!(cpsr.carry_flag());
/// ```
#[derive(Default, Clone, Copy, Serialize, Deserialize)]
pub struct Psr(u32);

impl Psr {
    #[must_use]
    pub fn can_execute(self, cond: Condition) -> bool {
        use Condition::{AL, CC, CS, EQ, GE, GT, HI, LE, LS, LT, MI, NE, NV, PL, VC, VS};
        match cond {
            EQ => self.zero_flag(),                         // Equal (Z=1)
            NE => !self.zero_flag(),                        // Not equal (Z=0)
            CS => self.carry_flag(),                        // Unsigned higher or same (C=1)
            CC => !self.carry_flag(),                       // Unsigned lower (C=0)
            MI => self.sign_flag(),                         // Negative (N=1)
            PL => !self.sign_flag(),                        // Positive or zero (N=0)
            VS => self.overflow_flag(),                     // Overflow (V=1)
            VC => !self.overflow_flag(),                    // No overflow (V=0)
            HI => self.carry_flag() && !self.zero_flag(),   // Unsigned higher (C=1 and Z=0)
            LS => !self.carry_flag() || self.zero_flag(),   // Unsigned lower or same (C=0 or Z=1)
            GE => self.sign_flag() == self.overflow_flag(), // Greater or equal (N=V)
            LT => self.sign_flag() != self.overflow_flag(), // Less than (N<>V)
            GT => !self.zero_flag() && (self.sign_flag() == self.overflow_flag()), // Greater than (Z=0 and N=V)
            LE => self.zero_flag() || (self.sign_flag() != self.overflow_flag()), // Less or equal (Z=1 or N<>V)
            AL => true,  // Always (the "AL" suffix can be omitted)
            NV => false, // Never (reserved)
        }
    }

    /// N => Bit 31, (0=Not Signed, 1=Signed)
    #[must_use]
    pub fn sign_flag(self) -> bool {
        self.0.get_bit(31)
    }

    /// Z => Bit 30, (0=Not Zero, 1=Zero)
    #[must_use]
    pub fn zero_flag(self) -> bool {
        self.0.get_bit(30)
    }

    /// C => Bit 29, (0=Borrow/No Carry, 1=Carry/No Borrow)
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.0.get_bit(29)
    }

    /// V => Bit 28, (0=No Overflow, 1=Overflow)
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.0.get_bit(28)
    }

    /// T => Bit 5, (0=ARM, 1=THUMB)
    #[must_use]
    pub fn state_bit(self) -> bool {
        self.0.get_bit(5)
    }

    pub fn set_sign_flag(&mut self, value: bool) {
        self.0.set_bit(31, value);
    }

    pub fn set_zero_flag(&mut self, value: bool) {
        self.0.set_bit(30, value);
    }

    pub fn set_carry_flag(&mut self, value: bool) {
        self.0.set_bit(29, value);
    }

    pub fn set_overflow_flag(&mut self, value: bool) {
        self.0.set_bit(28, value);
    }

    /// The T bit selects ARM (false) or Thumb (true) instruction state.
    /// The execution engine rejects Thumb targets, so this bit only ever
    /// records what a `BX` would have requested.
    pub fn set_state_bit(&mut self, value: bool) {
        self.0.set_bit(5, value);
    }

    /// N := bit 31 of `value`.
    pub fn extract_negative(&mut self, value: u32) {
        self.set_sign_flag(value.get_bit(31));
    }

    /// Z := `value` == 0.
    pub fn extract_zero(&mut self, value: u32) {
        self.set_zero_flag(value == 0);
    }

    /// C := the widened unsigned sum of `a` and `b` does not fit in 32
    /// bits (a carry out of bit 31 occurred).
    pub fn extract_carry_add(&mut self, a: u32, b: u32) {
        let widened = u64::from(a) + u64::from(b);
        self.set_carry_flag(widened > u64::from(u32::MAX));
    }

    /// C := `a` >= `b`, the ARM "no borrow" convention for subtraction.
    pub fn extract_carry_sub(&mut self, a: u32, b: u32) {
        self.set_carry_flag(a >= b);
    }

    /// V := `a` and `b` have the same sign and `result` has the opposite
    /// one (two's-complement overflow rule for addition).
    pub fn extract_overflow_add(&mut self, a: u32, b: u32, result: u32) {
        let same_sign = a.get_bit(31) == b.get_bit(31);
        self.set_overflow_flag(same_sign && a.get_bit(31) != result.get_bit(31));
    }

    /// V := `a` and `b` have different signs and `result`'s sign differs
    /// from `a`'s.
    pub fn extract_overflow_sub(&mut self, a: u32, b: u32, result: u32) {
        let different_sign = a.get_bit(31) != b.get_bit(31);
        self.set_overflow_flag(different_sign && a.get_bit(31) != result.get_bit(31));
    }
}

impl From<Psr> for u32 {
    fn from(p: Psr) -> Self {
        p.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn check_sign_flag() {
        let mut cpsr = Psr::default();
        cpsr.set_sign_flag(true);
        assert!(cpsr.sign_flag());
        assert!(!cpsr.zero_flag());
        assert!(!cpsr.carry_flag());
        assert!(!cpsr.overflow_flag());
    }

    #[test]
    fn check_zero_flag() {
        let mut cpsr = Psr::default();
        cpsr.set_zero_flag(true);
        assert!(cpsr.zero_flag());
    }

    #[test]
    fn check_carry_flag() {
        let mut cpsr = Psr::default();
        cpsr.set_carry_flag(true);
        assert!(cpsr.carry_flag());
    }

    #[test]
    fn check_overflow_flag() {
        let mut cpsr = Psr(0b0001_0000_0000_0000_0000_0000_0000_0000);
        assert!(cpsr.overflow_flag());
        cpsr.set_overflow_flag(false);
        assert!(!cpsr.overflow_flag());
    }

    #[test]
    fn check_state_bit() {
        let mut cpsr = Psr::default();
        cpsr.set_state_bit(true);
        assert!(cpsr.state_bit());
        assert!(!cpsr.sign_flag());
    }

    #[test]
    fn extract_negative() {
        let mut cpsr = Psr::default();
        cpsr.extract_negative(0x8000_0000);
        assert!(cpsr.sign_flag());
        cpsr.extract_negative(0x7FFF_FFFF);
        assert!(!cpsr.sign_flag());
    }

    #[test]
    fn extract_zero() {
        let mut cpsr = Psr::default();
        cpsr.extract_zero(0);
        assert!(cpsr.zero_flag());
        cpsr.extract_zero(1);
        assert!(!cpsr.zero_flag());
    }

    #[test]
    fn extract_carry_add_matches_widened_sum() {
        let mut rng = rand::rng();
        let mut cpsr = Psr::default();
        for _ in 0..1000 {
            let a: u32 = rng.random();
            let b: u32 = rng.random();
            cpsr.extract_carry_add(a, b);
            let expected = u64::from(a) + u64::from(b) >= 1 << 32;
            assert_eq!(cpsr.carry_flag(), expected, "a={a:#X} b={b:#X}");
        }
    }

    #[test]
    fn extract_carry_sub_is_no_borrow() {
        let mut rng = rand::rng();
        let mut cpsr = Psr::default();
        for _ in 0..1000 {
            let a: u32 = rng.random();
            let b: u32 = rng.random();
            cpsr.extract_carry_sub(a, b);
            assert_eq!(cpsr.carry_flag(), a >= b, "a={a:#X} b={b:#X}");
        }

        cpsr.extract_carry_sub(7, 7);
        assert!(cpsr.carry_flag());
    }

    #[test]
    fn extract_overflow_add_matches_signed_range() {
        let mut rng = rand::rng();
        let mut cpsr = Psr::default();
        for _ in 0..1000 {
            let a: u32 = rng.random();
            let b: u32 = rng.random();
            let result = a.wrapping_add(b);
            cpsr.extract_overflow_add(a, b, result);
            let wide = i64::from(a as i32) + i64::from(b as i32);
            let expected = wide < i64::from(i32::MIN) || wide > i64::from(i32::MAX);
            assert_eq!(cpsr.overflow_flag(), expected, "a={a:#X} b={b:#X}");
        }
    }

    #[test]
    fn extract_overflow_sub_matches_signed_range() {
        let mut rng = rand::rng();
        let mut cpsr = Psr::default();
        for _ in 0..1000 {
            let a: u32 = rng.random();
            let b: u32 = rng.random();
            let result = a.wrapping_sub(b);
            cpsr.extract_overflow_sub(a, b, result);
            let wide = i64::from(a as i32) - i64::from(b as i32);
            let expected = wide < i64::from(i32::MIN) || wide > i64::from(i32::MAX);
            assert_eq!(cpsr.overflow_flag(), expected, "a={a:#X} b={b:#X}");
        }
    }

    #[test]
    fn extraction_leaves_other_flags_alone() {
        let mut cpsr = Psr::default();
        cpsr.set_sign_flag(true);
        cpsr.set_carry_flag(true);

        cpsr.extract_zero(0);

        assert!(cpsr.sign_flag());
        assert!(cpsr.carry_flag());
        assert!(cpsr.zero_flag());
        assert!(!cpsr.overflow_flag());
    }

    #[test]
    fn condition_table_both_directions() {
        use Condition::*;

        let flags = |n: bool, z: bool, c: bool, v: bool| {
            let mut psr = Psr::default();
            psr.set_sign_flag(n);
            psr.set_zero_flag(z);
            psr.set_carry_flag(c);
            psr.set_overflow_flag(v);
            psr
        };

        // (condition, passing flags, failing flags) as (N, Z, C, V)
        let table = [
            (EQ, (false, true, false, false), (false, false, false, false)),
            (NE, (false, false, false, false), (false, true, false, false)),
            (CS, (false, false, true, false), (false, false, false, false)),
            (CC, (false, false, false, false), (false, false, true, false)),
            (MI, (true, false, false, false), (false, false, false, false)),
            (PL, (false, false, false, false), (true, false, false, false)),
            (VS, (false, false, false, true), (false, false, false, false)),
            (VC, (false, false, false, false), (false, false, false, true)),
            (HI, (false, false, true, false), (false, true, true, false)),
            (LS, (false, true, true, false), (false, false, true, false)),
            (GE, (true, false, false, true), (true, false, false, false)),
            (LT, (true, false, false, false), (true, false, false, true)),
            (GT, (false, false, false, false), (false, true, false, false)),
            (LE, (true, false, false, false), (false, false, false, false)),
        ];

        for (cond, pass, fail) in table {
            let (n, z, c, v) = pass;
            assert!(flags(n, z, c, v).can_execute(cond), "{cond:?} should pass");
            let (n, z, c, v) = fail;
            assert!(!flags(n, z, c, v).can_execute(cond), "{cond:?} should fail");
        }

        assert!(flags(false, false, false, false).can_execute(AL));
        assert!(flags(true, true, true, true).can_execute(AL));
        assert!(!flags(true, true, true, true).can_execute(NV));
    }
}
