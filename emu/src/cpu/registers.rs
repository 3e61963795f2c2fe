//! # Register File
//!
//! - **R0-R3**: Arguments, R0 also carries the return value
//! - **R4-R12**: General purpose
//! - **R13 (SP)**: Stack pointer (by convention)
//! - **R14 (LR)**: Link register (return address)
//! - **R15 (PC)**: Program counter
//!
//! Unlike the hardware, reading R15 returns the address of the instruction
//! being executed: the +8 pipeline lookahead is applied by branches only.

use serde::{Deserialize, Serialize};

/// Stack Pointer register index.
pub const REG_SP: usize = 0xD;

/// Link Register index (return address for subroutines).
pub const REG_LR: usize = 0xE;

/// Program Counter register index.
pub const REG_PROGRAM_COUNTER: usize = 0xF;

/// The 16 general-purpose registers.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers([u32; 16]);

impl Registers {
    #[must_use]
    pub const fn program_counter(&self) -> u32 {
        self.0[REG_PROGRAM_COUNTER]
    }

    pub const fn set_program_counter(&mut self, new_value: u32) {
        self.0[REG_PROGRAM_COUNTER] = new_value;
    }

    pub const fn advance_program_counter(&mut self, bytes: u32) {
        self.0[REG_PROGRAM_COUNTER] = self.0[REG_PROGRAM_COUNTER].wrapping_add(bytes);
    }

    /// # Panics
    /// If `reg` is not in `0..=15`. Decoded register fields are four bits wide.
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
        self.0.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn advance_wraps() {
        let mut regs = Registers::default();
        regs.set_program_counter(u32::MAX - 1);
        regs.advance_program_counter(4);
        assert_eq!(regs.program_counter(), 2);
        assert_eq!(regs.register_at(REG_PROGRAM_COUNTER), 2);
    }

    #[test]
    #[should_panic(expected = "Invalid register index")]
    fn register_out_of_range() {
        let mut regs = Registers::default();
        regs.set_register_at(16, 0);
    }
}
