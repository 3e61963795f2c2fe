//! Encoders for the supported instruction subset.
//!
//! Every function returns the raw 32-bit word; all of them use the `AL`
//! condition except the branches, which take one. Immediates must fit the
//! field they are encoded in and panic otherwise.

use crate::cpu::alu_instruction::ArmModeAluInstruction;
use crate::cpu::condition::Condition;
use crate::cpu::instruction::BX_PATTERN;

const AL: u32 = (Condition::AL as u32) << 28;

const fn reg(r: usize) -> u32 {
    assert!(r < 16, "register index out of range");
    r as u32
}

const fn data_processing(
    alu: ArmModeAluInstruction,
    immediate: bool,
    rd: usize,
    rn: usize,
    op2: u32,
) -> u32 {
    let limit = if immediate { 0xFF } else { 0xF };
    assert!(op2 <= limit, "operand 2 does not fit");
    AL | ((immediate as u32) << 25)
        | ((alu as u32) << 21)
        | (reg(rn) << 16)
        | (reg(rd) << 12)
        | op2
}

#[must_use]
pub const fn mov_imm(rd: usize, imm: u32) -> u32 {
    data_processing(ArmModeAluInstruction::Mov, true, rd, 0, imm)
}

#[must_use]
pub const fn mov_reg(rd: usize, rm: usize) -> u32 {
    data_processing(ArmModeAluInstruction::Mov, false, rd, 0, reg(rm))
}

#[must_use]
pub const fn add_imm(rd: usize, rn: usize, imm: u32) -> u32 {
    data_processing(ArmModeAluInstruction::Add, true, rd, rn, imm)
}

#[must_use]
pub const fn add_reg(rd: usize, rn: usize, rm: usize) -> u32 {
    data_processing(ArmModeAluInstruction::Add, false, rd, rn, reg(rm))
}

#[must_use]
pub const fn sub_imm(rd: usize, rn: usize, imm: u32) -> u32 {
    data_processing(ArmModeAluInstruction::Sub, true, rd, rn, imm)
}

#[must_use]
pub const fn sub_reg(rd: usize, rn: usize, rm: usize) -> u32 {
    data_processing(ArmModeAluInstruction::Sub, false, rd, rn, reg(rm))
}

#[must_use]
pub const fn cmp_imm(rn: usize, imm: u32) -> u32 {
    data_processing(ArmModeAluInstruction::Cmp, true, 0, rn, imm) | (1 << 20)
}

#[must_use]
pub const fn cmp_reg(rn: usize, rm: usize) -> u32 {
    data_processing(ArmModeAluInstruction::Cmp, false, 0, rn, reg(rm)) | (1 << 20)
}

/// `MUL rd, rm, rs`
#[must_use]
pub const fn mul(rd: usize, rm: usize, rs: usize) -> u32 {
    AL | (reg(rd) << 16) | (reg(rs) << 8) | (0b1001 << 4) | reg(rm)
}

const fn branch(condition: Condition, link: bool, offset: i32) -> u32 {
    assert!(
        offset >= -(1 << 23) && offset < (1 << 23),
        "branch offset does not fit"
    );
    ((condition as u32) << 28)
        | (0b101 << 25)
        | ((link as u32) << 24)
        | (offset as u32 & 0x00FF_FFFF)
}

/// Branch by `offset` words, counted from two instructions past this one.
#[must_use]
pub const fn b(condition: Condition, offset: i32) -> u32 {
    branch(condition, false, offset)
}

#[must_use]
pub const fn bl(condition: Condition, offset: i32) -> u32 {
    branch(condition, true, offset)
}

#[must_use]
pub const fn bx(rm: usize) -> u32 {
    AL | (BX_PATTERN << 4) | reg(rm)
}

const fn single_data_transfer(load: bool, byte: bool, rd: usize, rn: usize, offset: u32) -> u32 {
    AL | (0b01 << 26)
        | (1 << 24)
        | (1 << 23)
        | ((byte as u32) << 22)
        | ((load as u32) << 20)
        | (reg(rn) << 16)
        | (reg(rd) << 12)
        | offset
}

const fn immediate_offset(offset: u32) -> u32 {
    assert!(offset <= 0xFFF, "offset does not fit");
    offset
}

const fn register_offset(rm: usize) -> u32 {
    (1 << 25) | reg(rm)
}

/// `LDR rd, [rn, #offset]`
#[must_use]
pub const fn ldr_imm(rd: usize, rn: usize, offset: u32) -> u32 {
    single_data_transfer(true, false, rd, rn, immediate_offset(offset))
}

/// `LDR rd, [rn, rm]`
#[must_use]
pub const fn ldr_reg(rd: usize, rn: usize, rm: usize) -> u32 {
    single_data_transfer(true, false, rd, rn, register_offset(rm))
}

#[must_use]
pub const fn ldrb_imm(rd: usize, rn: usize, offset: u32) -> u32 {
    single_data_transfer(true, true, rd, rn, immediate_offset(offset))
}

#[must_use]
pub const fn ldrb_reg(rd: usize, rn: usize, rm: usize) -> u32 {
    single_data_transfer(true, true, rd, rn, register_offset(rm))
}

#[must_use]
pub const fn str_imm(rd: usize, rn: usize, offset: u32) -> u32 {
    single_data_transfer(false, false, rd, rn, immediate_offset(offset))
}

#[must_use]
pub const fn str_reg(rd: usize, rn: usize, rm: usize) -> u32 {
    single_data_transfer(false, false, rd, rn, register_offset(rm))
}

/// Lays instruction words out as little-endian bytes.
#[must_use]
pub fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}
