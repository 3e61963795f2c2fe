//! # Condition Field
//!
//! The top four bits (31-28) of every ARM instruction word hold a condition
//! code. This emulator honours it on branches only; every other category
//! executes unconditionally.
//!
//! ```text
//! ┌───────┬────────┬─────────────────────┬───────────────┬───────────┐
//! │ Code  │ Suffix │     Meaning         │ Flags Tested  │ Modeled   │
//! ├───────┼────────┼─────────────────────┼───────────────┼───────────┤
//! │ 0000  │   EQ   │ Equal               │ Z=1           │ yes       │
//! │ 0001  │   NE   │ Not equal           │ Z=0           │ yes       │
//! │ 1011  │   LT   │ < (signed)          │ N≠V           │ yes       │
//! │ 1100  │   GT   │ > (signed)          │ Z=0 AND N=V   │ yes       │
//! │ 1110  │   AL   │ Always              │ -             │ yes       │
//! │ other │        │                     │               │ no        │
//! └───────┴────────┴─────────────────────┴───────────────┴───────────┘
//! ```
//!
//! Evaluation against the flags lives in [`Psr::check`](super::psr::Psr::check).

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// Condition codes as encoded in bits 31-28.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Condition {
    /// Equal (Z=1)
    EQ = 0x0,
    /// Not equal (Z=0)
    NE = 0x1,
    /// Carry set / unsigned higher or same (C=1)
    CS = 0x2,
    /// Carry clear / unsigned lower (C=0)
    CC = 0x3,
    /// Minus / negative (N=1)
    MI = 0x4,
    /// Plus / positive or zero (N=0)
    PL = 0x5,
    /// Overflow set (V=1)
    VS = 0x6,
    /// Overflow clear (V=0)
    VC = 0x7,
    /// Unsigned higher (C=1 AND Z=0)
    HI = 0x8,
    /// Unsigned lower or same (C=0 OR Z=1)
    LS = 0x9,
    /// Signed greater or equal (N=V)
    GE = 0xA,
    /// Signed less than (N≠V)
    LT = 0xB,
    /// Signed greater than (Z=0 AND N=V)
    GT = 0xC,
    /// Signed less than or equal (Z=1 OR N≠V)
    LE = 0xD,
    /// Always (unconditional)
    AL = 0xE,
    /// Never (reserved)
    NV = 0xF,
}

impl Condition {
    /// Reads the condition field of an instruction word.
    #[must_use]
    pub fn of(op_code: u32) -> Self {
        Self::from(op_code.get_bits(28..=31) as u8)
    }
}

impl From<u8> for Condition {
    fn from(item: u8) -> Self {
        match item & 0xF {
            0x0 => Self::EQ,
            0x1 => Self::NE,
            0x2 => Self::CS,
            0x3 => Self::CC,
            0x4 => Self::MI,
            0x5 => Self::PL,
            0x6 => Self::VS,
            0x7 => Self::VC,
            0x8 => Self::HI,
            0x9 => Self::LS,
            0xA => Self::GE,
            0xB => Self::LT,
            0xC => Self::GT,
            0xD => Self::LE,
            0xE => Self::AL,
            _ => Self::NV,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EQ => f.write_str("EQ"),
            Self::NE => f.write_str("NE"),
            Self::CS => f.write_str("CS"),
            Self::CC => f.write_str("CC"),
            Self::MI => f.write_str("MI"),
            Self::PL => f.write_str("PL"),
            Self::VS => f.write_str("VS"),
            Self::VC => f.write_str("VC"),
            Self::HI => f.write_str("HI"),
            Self::LS => f.write_str("LS"),
            Self::GE => f.write_str("GE"),
            Self::LT => f.write_str("LT"),
            Self::GT => f.write_str("GT"),
            Self::LE => f.write_str("LE"),
            Self::AL => Ok(()),
            Self::NV => f.write_str("_NEVER"),
        }
    }
}
