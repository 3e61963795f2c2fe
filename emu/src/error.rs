//! Errors that abort an emulation session.
//!
//! Every variant is fatal for the session that produced it: the driver loop
//! stops at the first one and hands it back to the caller unchanged.

use thiserror::Error;

use crate::cpu::condition::Condition;
use crate::memory::AccessKind;

/// Addressing modes and condition codes that decode but are not executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedMode {
    /// `strb`: byte stores have no handler.
    ByteStore,

    /// A branch condition other than EQ, NE, LT, GT or AL.
    Condition(Condition),
}

impl std::fmt::Display for UnsupportedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ByteStore => f.write_str("byte store"),
            Self::Condition(cond) => write!(f, "condition code {:#06b}", *cond as u8),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmuError {
    #[error("unknown instruction 0x{raw:08X} at 0x{address:08X}")]
    UnknownInstruction { address: u32, raw: u32 },

    #[error("{kind} of {width} byte(s) at 0x{address:08X} is outside the memory image")]
    OutOfBounds {
        address: u32,
        width: u32,
        kind: AccessKind,
    },

    #[error("unsupported {mode} in instruction 0x{raw:08X} at 0x{address:08X}")]
    UnsupportedAddressingMode {
        address: u32,
        raw: u32,
        mode: UnsupportedMode,
    },

    #[error("no halt after {limit} instructions, program counter at 0x{pc:08X}")]
    NonTerminating { limit: u64, pc: u32 },

    #[error("cache size {size} is not a power of two between 1 and {max}")]
    InvalidCacheSize { size: u32, max: u32 },

    #[error("invalid memory layout: {reason}")]
    InvalidLayout { reason: String },
}

impl EmuError {
    /// The address of the instruction or access that failed, when there is one.
    #[must_use]
    pub const fn address(&self) -> Option<u32> {
        match self {
            Self::UnknownInstruction { address, .. }
            | Self::OutOfBounds { address, .. }
            | Self::UnsupportedAddressingMode { address, .. } => Some(*address),
            Self::NonTerminating { pc, .. } => Some(*pc),
            Self::InvalidCacheSize { .. } | Self::InvalidLayout { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn messages() {
        let err = EmuError::UnsupportedAddressingMode {
            address: 0x8010,
            raw: 0xAA00_0001,
            mode: UnsupportedMode::Condition(Condition::GE),
        };
        assert_eq!(
            err.to_string(),
            "unsupported condition code 0b1010 in instruction 0xAA000001 at 0x00008010"
        );
        assert_eq!(err.address(), Some(0x8010));

        let err = EmuError::OutOfBounds {
            address: 0x8400,
            width: 4,
            kind: AccessKind::Fetch,
        };
        assert_eq!(
            err.to_string(),
            "instruction fetch of 4 byte(s) at 0x00008400 is outside the memory image"
        );
        assert_eq!(EmuError::InvalidCacheSize { size: 3, max: 1024 }.address(), None);
    }
}
