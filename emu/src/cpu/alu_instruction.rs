use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Data processing opcodes, bits 24-21.
///
/// All sixteen decode; only `Sub`, `Add`, `Cmp` and `Mov` have an effect,
/// the rest execute as no-ops that still count as computation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum ArmModeAluInstruction {
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

impl ArmModeAluInstruction {
    #[must_use]
    pub const fn is_modeled(self) -> bool {
        matches!(self, Self::Sub | Self::Add | Self::Cmp | Self::Mov)
    }
}

impl Display for ArmModeAluInstruction {
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

impl From<u32> for ArmModeAluInstruction {
    fn from(alu_op_code: u32) -> Self {
        use ArmModeAluInstruction::{
            Adc, Add, And, Bic, Cmn, Cmp, Eor, Mov, Mvn, Orr, Rsb, Rsc, Sbc, Sub, Teq, Tst,
        };
        match alu_op_code & 0xF {
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
            _ => Mvn,
        }
    }
}

/// Flags produced by `cmp`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompareResult {
    pub result: u32,
    pub carry: bool,
    pub overflow: bool,
    pub sign: bool,
    pub zero: bool,
}

/// Computes the flags of `first_op - second_op`.
///
/// Carry is set when `second_op > first_op` (unsigned), i.e. when the
/// subtraction borrowed. Overflow can only happen when the operands have
/// different signs; the exact difference is computed in 64 bits and compared
/// against the i32 range.
#[must_use]
pub fn compare(first_op: u32, second_op: u32) -> CompareResult {
    let a = first_op as i32;
    let b = second_op as i32;
    let result = a.wrapping_sub(b);

    let wide = i64::from(a) - i64::from(b);
    let overflow = if a >= 0 && b < 0 {
        wide > i64::from(i32::MAX)
    } else if a < 0 && b >= 0 {
        wide < i64::from(i32::MIN)
    } else {
        false
    };

    CompareResult {
        result: result as u32,
        carry: second_op > first_op,
        overflow,
        sign: result < 0,
        zero: result == 0,
    }
}
