//! # Program Status Register
//!
//! Only the condition flags of the CPSR are modeled.
//!
//! ```text
//! 31 30 29 28 27                          0
//! ┌──┬──┬──┬──┬────────────────────────────┐
//! │N │Z │C │V │ Unused                     │
//! └──┴──┴──┴──┴────────────────────────────┘
//! ```
//!
//! The flags are written by `cmp` only and read by conditional branches.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::alu_instruction::CompareResult;
use crate::cpu::condition::Condition;

/// The condition flags packed the way the hardware CPSR holds them.
///
/// ```
/// use emu::cpu::psr::Psr;
///
/// let mut cpsr = Psr::default();
/// cpsr.set_zero_flag(true);
/// assert!(cpsr.zero_flag());
/// assert!(!cpsr.carry_flag());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Psr(u32);

impl Psr {
    /// Evaluates a branch condition against the flags.
    ///
    /// Returns `None` for codes the emulator does not model.
    #[must_use]
    pub fn check(self, cond: Condition) -> Option<bool> {
        use Condition::{AL, EQ, GT, LT, NE};
        match cond {
            EQ => Some(self.zero_flag()),                         // Equal (Z=1)
            NE => Some(!self.zero_flag()),                        // Not equal (Z=0)
            LT => Some(self.sign_flag() != self.overflow_flag()), // Less than (N<>V)
            GT => Some(!self.zero_flag() && (self.sign_flag() == self.overflow_flag())), // Greater than (Z=0 and N=V)
            AL => Some(true),
            _ => None,
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

    /// C => Bit 29, set when the compare borrowed (second operand larger, unsigned)
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.0.get_bit(29)
    }

    /// V => Bit 28, (0=No Overflow, 1=Overflow)
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.0.get_bit(28)
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

    pub fn set_flags(&mut self, result: &CompareResult) {
        self.set_carry_flag(result.carry);
        self.set_zero_flag(result.zero);
        self.set_sign_flag(result.sign);
        self.set_overflow_flag(result.overflow);
    }
}

impl From<Psr> for u32 {
    fn from(p: Psr) -> Self {
        p.0
    }
}

impl std::fmt::Display for Psr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "N={} Z={} C={} V={}",
            u8::from(self.sign_flag()),
            u8::from(self.zero_flag()),
            u8::from(self.carry_flag()),
            u8::from(self.overflow_flag())
        )
    }
}
