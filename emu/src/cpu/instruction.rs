//! # Instruction Decoding
//!
//! A 32-bit word is classified into one of five categories. Encodings
//! overlap, so the checks run in a fixed priority order and the first match
//! wins:
//!
//! 1. Branch and Exchange (BX) - bits 27-4 are `0001_0010_1111_1111_1111_0001`
//! 2. Branch (B, BL) - bits 27-25 are `101`
//! 3. Multiply (MUL) - bits 27-22 are `000000` and bits 7-4 are `1001`
//! 4. Data Processing (SUB, ADD, CMP, MOV) - bits 27-26 are `00`
//! 5. Single Data Transfer (LDR, LDRB, STR) - bits 27-26 are `01`
//!
//! Anything else is rejected with [`UnknownOpcode`].
//!
//! ## Encoding Example
//!
//! ```text
//! LDR R3, [R0, #4]
//!
//! 31-28  27-26  25  24  23  22  21  20  19-16  15-12  11-0
//! [1110] [ 01 ] [0] [1] [1] [0] [0] [1] [0000] [0011] [000000000100]
//!   ↑       ↑    ↑           ↑       ↑    ↑      ↑       ↑
//!   │       │    │           │       │    │      │       └─ 12-bit offset
//!   │       │    │           │       │    │      └───────── Rd = R3
//!   │       │    │           │       │    └──────────────── Rn = R0
//!   │       │    │           │       └───────────────────── L = 1 (load)
//!   │       │    │           └───────────────────────────── B = 0 (word)
//!   │       │    └───────────────────────────────────────── I = 0 (literal)
//!   │       └────────────────────────────────────────────── Single data transfer
//!   └────────────────────────────────────────────────────── Always execute
//! ```

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;
use crate::cpu::alu_instruction::ArmModeAluInstruction;
use crate::cpu::condition::Condition;
use crate::cpu::flags::{LoadStoreKind, OperandKind, ReadWriteKind};

/// Bits 27-4 of every `BX Rn`.
pub const BX_PATTERN: u32 = 0b0001_0010_1111_1111_1111_0001;

/// Added to every taken branch: the hardware reads PC two instructions ahead.
pub const PIPELINE_OFFSET: i32 = 8;

/// A word that matches none of the modeled categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownOpcode(pub u32);

impl std::fmt::Display for UnknownOpcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown opcode 0x{:08X}", self.0)
    }
}

impl std::error::Error for UnknownOpcode {}

/// Offset added to the base register of a single data transfer.
///
/// The I bit (25) picks between the two: set selects the register form,
/// clear selects the 12-bit literal.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SingleDataTransferOffsetInfo {
    Immediate { offset: u32 },
    Register { reg_offset: usize },
}

impl std::fmt::Display for SingleDataTransferOffsetInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Immediate { offset } => write!(f, "#{offset}"),
            Self::Register { reg_offset } => write!(f, "R{reg_offset}"),
        }
    }
}

/// All modeled instructions after decoding.
///
/// | Variant              | Example Instructions | Counter bumped          |
/// |----------------------|----------------------|-------------------------|
/// | `BranchAndExchange`  | BX                   | branch taken            |
/// | `Branch`             | B, BL                | branch taken/not taken  |
/// | `Multiply`           | MUL                  | computation             |
/// | `DataProcessing`     | SUB, ADD, CMP, MOV   | computation             |
/// | `SingleDataTransfer` | LDR, LDRB, STR       | memory                  |
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum ArmModeInstruction {
    BranchAndExchange {
        register: usize,
    },
    Branch {
        condition: Condition,
        link: bool,
        /// Sign-extended word offset, before the pipeline adjustment.
        offset: i32,
    },
    Multiply {
        rd_destination_register: usize,
        rs_operand_register: usize,
        rm_operand_register: usize,
    },
    DataProcessing {
        alu_instruction: ArmModeAluInstruction,
        op_kind: OperandKind,
        rn: usize,
        destination: usize,
        /// The 8-bit immediate, or the index of the operand register.
        op2: u32,
    },
    SingleDataTransfer {
        kind: LoadStoreKind,
        quantity: ReadWriteKind,
        rd: usize,
        base_register: usize,
        offset_info: SingleDataTransferOffsetInfo,
    },
}

impl ArmModeInstruction {
    /// Byte distance from the branch instruction to its target.
    #[must_use]
    pub const fn branch_byte_offset(offset: i32) -> i32 {
        offset.wrapping_mul(4).wrapping_add(PIPELINE_OFFSET)
    }

    #[must_use]
    pub fn disassembler(&self) -> String {
        match self {
            Self::BranchAndExchange { register } => format!("BX R{register}"),
            Self::Branch {
                condition,
                link,
                offset,
            } => {
                let link = if *link { "L" } else { "" };
                let byte_offset = Self::branch_byte_offset(*offset);
                format!("B{link}{condition} PC{byte_offset:+}")
            }
            Self::Multiply {
                rd_destination_register,
                rs_operand_register,
                rm_operand_register,
            } => format!(
                "MUL R{rd_destination_register}, R{rm_operand_register}, R{rs_operand_register}"
            ),
            Self::DataProcessing {
                alu_instruction,
                op_kind,
                rn,
                destination,
                op2,
            } => {
                let op2 = match op_kind {
                    OperandKind::Immediate => format!("#{op2}"),
                    OperandKind::Register => format!("R{op2}"),
                };
                match alu_instruction {
                    ArmModeAluInstruction::Tst
                    | ArmModeAluInstruction::Teq
                    | ArmModeAluInstruction::Cmp
                    | ArmModeAluInstruction::Cmn => format!("{alu_instruction} R{rn}, {op2}"),
                    ArmModeAluInstruction::Mov | ArmModeAluInstruction::Mvn => {
                        format!("{alu_instruction} R{destination}, {op2}")
                    }
                    _ => format!("{alu_instruction} R{destination}, R{rn}, {op2}"),
                }
            }
            Self::SingleDataTransfer {
                kind,
                quantity,
                rd,
                base_register,
                offset_info,
            } => {
                let op = match kind {
                    LoadStoreKind::Load => "LDR",
                    LoadStoreKind::Store => "STR",
                };
                let b = match quantity {
                    ReadWriteKind::Word => "",
                    ReadWriteKind::Byte => "B",
                };
                match offset_info {
                    SingleDataTransferOffsetInfo::Immediate { offset: 0 } => {
                        format!("{op}{b} R{rd}, [R{base_register}]")
                    }
                    _ => format!("{op}{b} R{rd}, [R{base_register}, {offset_info}]"),
                }
            }
        }
    }
}

impl TryFrom<u32> for ArmModeInstruction {
    type Error = UnknownOpcode;

    fn try_from(op_code: u32) -> Result<Self, Self::Error> {
        if op_code.get_bits(4..=27) == BX_PATTERN {
            Ok(Self::BranchAndExchange {
                register: op_code.get_bits(0..=3) as usize,
            })
        } else if op_code.get_bits(25..=27) == 0b101 {
            Ok(Self::Branch {
                condition: Condition::of(op_code),
                link: op_code.get_bit(24),
                offset: op_code.get_bits(0..=23).sign_extended(24) as i32,
            })
        } else if op_code.get_bits(22..=27) == 0b00_0000 && op_code.get_bits(4..=7) == 0b1001 {
            Ok(Self::Multiply {
                rd_destination_register: op_code.get_bits(16..=19) as usize,
                rs_operand_register: op_code.get_bits(8..=11) as usize,
                rm_operand_register: op_code.get_bits(0..=3) as usize,
            })
        } else if op_code.get_bits(26..=27) == 0b00 {
            let op_kind: OperandKind = op_code.get_bit(25).into();
            let op2 = match op_kind {
                OperandKind::Immediate => op_code.get_bits(0..=7),
                OperandKind::Register => op_code.get_bits(0..=3),
            };

            Ok(Self::DataProcessing {
                alu_instruction: ArmModeAluInstruction::from(op_code.get_bits(21..=24)),
                op_kind,
                rn: op_code.get_bits(16..=19) as usize,
                destination: op_code.get_bits(12..=15) as usize,
                op2,
            })
        } else if op_code.get_bits(26..=27) == 0b01 {
            let offset_info = if op_code.get_bit(25) {
                SingleDataTransferOffsetInfo::Register {
                    reg_offset: op_code.get_bits(0..=3) as usize,
                }
            } else {
                SingleDataTransferOffsetInfo::Immediate {
                    offset: op_code.get_bits(0..=11),
                }
            };

            Ok(Self::SingleDataTransfer {
                kind: op_code.get_bit(20).into(),
                quantity: op_code.get_bit(22).into(),
                rd: op_code.get_bits(12..=15) as usize,
                base_register: op_code.get_bits(16..=19) as usize,
                offset_info,
            })
        } else {
            Err(UnknownOpcode(op_code))
        }
    }
}
