//! # Register File
//!
//! The 16 general-purpose 32-bit registers.
//!
//! - **R0-R13**: General purpose
//! - **R14 (LR)**: Link register (return address)
//! - **R15 (PC)**: Program counter

use serde::{Deserialize, Serialize};

/// Link Register index (return address for linked branches).
pub const REG_LINK: usize = 0xE;

/// Program Counter register index.
pub const REG_PROGRAM_COUNTER: u32 = 0xF;

/// The 16 general-purpose registers.
///
/// R15 (index 15) is the Program Counter: it holds the address of the
/// instruction being fetched and is written by taken branches.
#[derive(Default, Clone, Serialize, Deserialize)]
pub struct Registers([u32; 16]);

impl Registers {
    #[must_use]
    pub const fn program_counter(&self) -> u32 {
        self.0[15]
    }

    pub const fn set_program_counter(&mut self, new_value: u32) {
        self.0[15] = new_value;
    }

    pub const fn advance_program_counter(&mut self, bytes: u32) {
        self.0[15] = self.0[15].wrapping_add(bytes);
    }

    pub fn set_register_at(&mut self, reg: usize, new_value: u32) {
        assert!(reg <= 15, "Invalid register index: {reg} (0x{reg:X})");
        self.0[reg] = new_value;
    }

    #[must_use]
    pub const fn register_at(&self, reg: usize) -> u32 {
        self.0[reg]
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<u32> {
        self.0.as_slice().to_vec()
    }
}
