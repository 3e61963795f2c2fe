//! # Execution
//!
//! One handler per instruction category. Every handler either commits all of
//! its register, flag and memory writes or returns an error before touching
//! anything. All of them advance PC by one instruction except taken branches
//! and `bx`, which set it explicitly.

use crate::cpu::alu_instruction::{ArmModeAluInstruction, compare};
use crate::cpu::condition::Condition;
use crate::cpu::flags::{LoadStoreKind, OperandKind, ReadWriteKind};
use crate::cpu::instruction::{ArmModeInstruction, SingleDataTransferOffsetInfo};
use crate::cpu::opcode::ArmModeOpcode;
use crate::cpu::registers::REG_LR;
use crate::cpu::state::MachineState;
use crate::error::{EmuError, UnsupportedMode};
use crate::memory::MemoryImage;

pub const SIZE_OF_INSTRUCTION: u32 = 4;

impl MachineState {
    /// Executes an already fetched and decoded instruction.
    ///
    /// # Errors
    /// Whatever the category handler reports; the state is unchanged then.
    pub fn execute_arm(
        &mut self,
        op_code: &ArmModeOpcode,
        memory: &mut MemoryImage,
    ) -> Result<(), EmuError> {
        use ArmModeInstruction::{
            Branch, BranchAndExchange, DataProcessing, Multiply, SingleDataTransfer,
        };
        match op_code.instruction {
            BranchAndExchange { register } => {
                self.branch_and_exchange(register);
                Ok(())
            }
            Branch {
                condition,
                link,
                offset,
            } => self.branch(op_code.raw, condition, link, offset),
            Multiply {
                rd_destination_register,
                rs_operand_register,
                rm_operand_register,
            } => {
                self.multiply(
                    rd_destination_register,
                    rm_operand_register,
                    rs_operand_register,
                );
                Ok(())
            }
            DataProcessing {
                alu_instruction,
                op_kind,
                rn,
                destination,
                op2,
            } => {
                self.data_processing(alu_instruction, op_kind, rn, destination, op2);
                Ok(())
            }
            SingleDataTransfer {
                kind,
                quantity,
                rd,
                base_register,
                offset_info,
            } => self.single_data_transfer(
                memory,
                op_code.raw,
                kind,
                quantity,
                rd,
                base_register,
                offset_info,
            ),
        }
    }

    pub fn data_processing(
        &mut self,
        alu_instruction: ArmModeAluInstruction,
        op_kind: OperandKind,
        rn: usize,
        destination: usize,
        op2: u32,
    ) {
        let op1 = self.registers.register_at(rn);
        let op2 = match op_kind {
            OperandKind::Immediate => op2,
            OperandKind::Register => self.registers.register_at(op2 as usize),
        };

        use ArmModeAluInstruction::{Add, Cmp, Mov, Sub};
        match alu_instruction {
            Sub => self
                .registers
                .set_register_at(destination, op1.wrapping_sub(op2)),
            Add => self
                .registers
                .set_register_at(destination, op1.wrapping_add(op2)),
            Cmp => self.cpsr.set_flags(&compare(op1, op2)),
            Mov => self.registers.set_register_at(destination, op2),
            _ => {}
        }

        self.counters.computation += 1;
        self.registers.advance_program_counter(SIZE_OF_INSTRUCTION);
    }

    /// `rd = rm * rs`, keeping the low 32 bits.
    pub fn multiply(&mut self, rd: usize, rm: usize, rs: usize) {
        let rm_operand_value = self.registers.register_at(rm);
        let rs_operand_value = self.registers.register_at(rs);

        self.registers
            .set_register_at(rd, rm_operand_value.wrapping_mul(rs_operand_value));

        self.counters.computation += 1;
        self.registers.advance_program_counter(SIZE_OF_INSTRUCTION);
    }

    /// `B`/`BL`. A taken branch moves PC by `offset * 4 + 8` bytes and, when
    /// linked, first stores the address of the next instruction in LR.
    ///
    /// # Errors
    /// [`EmuError::UnsupportedAddressingMode`] for a condition that is not modeled.
    pub fn branch(
        &mut self,
        raw: u32,
        condition: Condition,
        link: bool,
        offset: i32,
    ) -> Result<(), EmuError> {
        let old_pc = self.registers.program_counter();
        let taken = self
            .cpsr
            .check(condition)
            .ok_or_else(|| EmuError::UnsupportedAddressingMode {
                address: old_pc,
                raw,
                mode: UnsupportedMode::Condition(condition),
            })?;

        if taken {
            if link {
                self.registers
                    .set_register_at(REG_LR, old_pc.wrapping_add(SIZE_OF_INSTRUCTION));
            }
            let byte_offset = ArmModeInstruction::branch_byte_offset(offset);
            self.registers
                .set_program_counter(old_pc.wrapping_add_signed(byte_offset));
            self.counters.branch_taken += 1;
        } else {
            self.registers.advance_program_counter(SIZE_OF_INSTRUCTION);
            self.counters.branch_not_taken += 1;
        }

        Ok(())
    }

    /// `BX Rn`: PC takes the register value as is.
    pub fn branch_and_exchange(&mut self, register: usize) {
        let target = self.registers.register_at(register);
        self.registers.set_program_counter(target);
        self.counters.branch_taken += 1;
    }

    /// `LDR`, `LDRB` and `STR` at `base + offset`. There is no write-back and
    /// the offset is always added.
    ///
    /// # Errors
    /// [`EmuError::OutOfBounds`] if the address is outside the image,
    /// [`EmuError::UnsupportedAddressingMode`] for `STRB`.
    #[allow(clippy::too_many_arguments)]
    pub fn single_data_transfer(
        &mut self,
        memory: &mut MemoryImage,
        raw: u32,
        kind: LoadStoreKind,
        quantity: ReadWriteKind,
        rd: usize,
        base_register: usize,
        offset_info: SingleDataTransferOffsetInfo,
    ) -> Result<(), EmuError> {
        let amount = match offset_info {
            SingleDataTransferOffsetInfo::Immediate { offset } => offset,
            SingleDataTransferOffsetInfo::Register { reg_offset } => {
                self.registers.register_at(reg_offset)
            }
        };
        let address = self
            .registers
            .register_at(base_register)
            .wrapping_add(amount);

        match (kind, quantity) {
            (LoadStoreKind::Load, ReadWriteKind::Byte) => {
                let value = memory.read_byte(address)?;
                self.registers.set_register_at(rd, u32::from(value));
            }
            (LoadStoreKind::Load, ReadWriteKind::Word) => {
                let value = memory.read_word(address)?;
                self.registers.set_register_at(rd, value);
            }
            (LoadStoreKind::Store, ReadWriteKind::Word) => {
                memory.write_word(address, self.registers.register_at(rd))?;
            }
            (LoadStoreKind::Store, ReadWriteKind::Byte) => {
                return Err(EmuError::UnsupportedAddressingMode {
                    address: self.registers.program_counter(),
                    raw,
                    mode: UnsupportedMode::ByteStore,
                });
            }
        }

        self.counters.memory += 1;
        self.registers.advance_program_counter(SIZE_OF_INSTRUCTION);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm;
    use crate::cpu::psr::Psr;
    use crate::cpu::registers::{REG_PROGRAM_COUNTER, REG_SP};
    use crate::cpu::state::InstructionCounters;
    use crate::memory::AccessKind;
    use pretty_assertions::assert_eq;

    const PC: u32 = 0x8000;

    fn setup() -> (MachineState, MemoryImage) {
        let memory = MemoryImage::new(PC, &[0; 64], &[0; 16], 64).unwrap();
        let state = MachineState::new(PC, memory.stack_top(), [0; 4]);
        (state, memory)
    }

    fn run(state: &mut MachineState, memory: &mut MemoryImage, raw: u32) -> Result<(), EmuError> {
        let op_code = ArmModeOpcode::try_from(raw).unwrap();
        state.execute_arm(&op_code, memory)
    }

    #[test]
    fn check_sub_add_mov() {
        let (mut cpu, mut mem) = setup();
        run(&mut cpu, &mut mem, asm::mov_imm(1, 10)).unwrap();
        run(&mut cpu, &mut mem, asm::mov_imm(2, 3)).unwrap();
        run(&mut cpu, &mut mem, asm::sub_reg(3, 1, 2)).unwrap();
        run(&mut cpu, &mut mem, asm::add_imm(4, 3, 255)).unwrap();
        run(&mut cpu, &mut mem, asm::sub_imm(5, 2, 4)).unwrap();
        run(&mut cpu, &mut mem, asm::mov_reg(6, 4)).unwrap();

        assert_eq!(cpu.registers.register_at(3), 7);
        assert_eq!(cpu.registers.register_at(4), 262);
        assert_eq!(cpu.registers.register_at(5), u32::MAX);
        assert_eq!(cpu.registers.register_at(6), 262);
        assert_eq!(cpu.registers.program_counter(), PC + 24);
        assert_eq!(cpu.counters.computation, 6);
        // Only CMP writes flags.
        assert_eq!(cpu.cpsr, Psr::default());
    }

    #[test]
    fn check_cmp() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_register_at(1, 5);
        run(&mut cpu, &mut mem, asm::cmp_imm(1, 5)).unwrap();
        assert!(cpu.cpsr.zero_flag());
        assert!(!cpu.cpsr.sign_flag());
        assert!(!cpu.cpsr.carry_flag());
        assert!(!cpu.cpsr.overflow_flag());

        cpu.registers.set_register_at(1, 0);
        cpu.registers.set_register_at(2, 1);
        run(&mut cpu, &mut mem, asm::cmp_reg(1, 2)).unwrap();
        assert!(!cpu.cpsr.zero_flag());
        assert!(cpu.cpsr.sign_flag());
        assert!(cpu.cpsr.carry_flag());

        cpu.registers.set_register_at(1, 0x7FFF_FFFF);
        cpu.registers.set_register_at(2, u32::MAX);
        run(&mut cpu, &mut mem, asm::cmp_reg(1, 2)).unwrap();
        assert!(cpu.cpsr.overflow_flag());

        // CMP does not write its destination field.
        assert_eq!(cpu.registers.register_at(0), 0);
        assert_eq!(cpu.registers.program_counter(), PC + 12);
    }

    #[test]
    fn unmodeled_alu_is_a_counted_no_op() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_register_at(1, 0xF0);
        // ORR R0, R1, #0x0F
        let orr = 0b1110_00_1_1100_0_0001_0000_0000_0000_1111;
        run(&mut cpu, &mut mem, orr).unwrap();
        assert_eq!(cpu.registers.register_at(0), 0);
        assert_eq!(cpu.counters.computation, 1);
        assert_eq!(cpu.registers.program_counter(), PC + 4);
    }

    #[test]
    fn check_mul() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_register_at(0, 7);
        cpu.registers.set_register_at(1, (-6_i32) as u32);
        run(&mut cpu, &mut mem, asm::mul(12, 0, 1)).unwrap();
        assert_eq!(cpu.registers.register_at(12) as i32, -42);

        cpu.registers.set_register_at(2, 0x1_0000);
        run(&mut cpu, &mut mem, asm::mul(3, 2, 2)).unwrap();
        assert_eq!(cpu.registers.register_at(3), 0);

        assert_eq!(cpu.counters.computation, 2);
        assert_eq!(cpu.registers.program_counter(), PC + 8);
    }

    #[test]
    fn branch_taken_and_not_taken() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_program_counter(PC + 16);

        // Z clear: BEQ falls through, BNE jumps.
        run(&mut cpu, &mut mem, asm::b(Condition::EQ, 3)).unwrap();
        assert_eq!(cpu.registers.program_counter(), PC + 20);

        run(&mut cpu, &mut mem, asm::b(Condition::NE, -2)).unwrap();
        assert_eq!(cpu.registers.program_counter(), PC + 20);

        run(&mut cpu, &mut mem, asm::b(Condition::AL, -4)).unwrap();
        assert_eq!(cpu.registers.program_counter(), PC + 12);

        assert_eq!(
            cpu.counters,
            InstructionCounters {
                branch_taken: 2,
                branch_not_taken: 1,
                ..Default::default()
            }
        );
        // Unlinked branches leave LR alone.
        assert_eq!(cpu.registers.register_at(REG_LR), 0);
    }

    #[test]
    fn branch_with_link() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_program_counter(PC + 8);
        run(&mut cpu, &mut mem, asm::bl(Condition::AL, 5)).unwrap();
        assert_eq!(cpu.registers.register_at(REG_LR), PC + 12);
        assert_eq!(cpu.registers.program_counter(), PC + 8 + 28);

        // A linked branch that is not taken does not touch LR.
        cpu.registers.set_register_at(REG_LR, 0x1234);
        cpu.cpsr.set_zero_flag(false);
        run(&mut cpu, &mut mem, asm::bl(Condition::EQ, 5)).unwrap();
        assert_eq!(cpu.registers.register_at(REG_LR), 0x1234);
        assert_eq!(cpu.registers.program_counter(), PC + 8 + 28 + 4);
    }

    #[test]
    fn signed_branch_conditions() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_register_at(1, (-3_i32) as u32);
        cpu.registers.set_register_at(2, 4);

        run(&mut cpu, &mut mem, asm::cmp_reg(1, 2)).unwrap();
        let pc = cpu.registers.program_counter();
        run(&mut cpu, &mut mem, asm::b(Condition::LT, 0)).unwrap();
        assert_eq!(cpu.registers.program_counter(), pc + 8);

        run(&mut cpu, &mut mem, asm::cmp_reg(2, 1)).unwrap();
        let pc = cpu.registers.program_counter();
        run(&mut cpu, &mut mem, asm::b(Condition::GT, 1)).unwrap();
        assert_eq!(cpu.registers.program_counter(), pc + 12);
    }

    #[test]
    fn unsupported_condition() {
        let (mut cpu, mut mem) = setup();
        let bge = asm::b(Condition::GE, 1);
        let before = cpu.clone();
        assert_eq!(
            run(&mut cpu, &mut mem, bge),
            Err(EmuError::UnsupportedAddressingMode {
                address: PC,
                raw: bge,
                mode: UnsupportedMode::Condition(Condition::GE),
            })
        );
        assert_eq!(cpu, before);
    }

    #[test]
    fn check_bx() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_register_at(3, PC + 0x20);
        run(&mut cpu, &mut mem, asm::bx(3)).unwrap();
        assert_eq!(cpu.registers.program_counter(), PC + 0x20);

        run(&mut cpu, &mut mem, asm::bx(REG_LR)).unwrap();
        assert!(cpu.is_halted());
        assert_eq!(cpu.counters.branch_taken, 2);
    }

    #[test]
    fn check_ldr_str() {
        let (mut cpu, mut mem) = setup();
        let sp = cpu.registers.register_at(REG_SP);

        cpu.registers.set_register_at(1, 0xCAFE_F00D);
        run(&mut cpu, &mut mem, asm::sub_imm(REG_SP, REG_SP, 8)).unwrap();
        run(&mut cpu, &mut mem, asm::str_imm(1, REG_SP, 4)).unwrap();
        assert_eq!(mem.read_word(sp - 4).unwrap(), 0xCAFE_F00D);

        run(&mut cpu, &mut mem, asm::ldr_imm(2, REG_SP, 4)).unwrap();
        assert_eq!(cpu.registers.register_at(2), 0xCAFE_F00D);

        cpu.registers.set_register_at(3, 7);
        run(&mut cpu, &mut mem, asm::ldrb_reg(4, REG_SP, 3)).unwrap();
        // Byte at sp - 1 is the top byte of the stored word, zero-extended.
        assert_eq!(cpu.registers.register_at(4), 0xCA);

        assert_eq!(cpu.counters.memory, 3);
        assert_eq!(cpu.counters.computation, 1);
        assert_eq!(cpu.registers.program_counter(), PC + 16);
    }

    #[test]
    fn ldrb_zero_extends() {
        let (mut cpu, mut mem) = setup();
        let data = mem.data_base();
        mem.write_byte(data, 0xFF).unwrap();
        cpu.registers.set_register_at(0, data);
        run(&mut cpu, &mut mem, asm::ldrb_imm(1, 0, 0)).unwrap();
        assert_eq!(cpu.registers.register_at(1), 0xFF);
    }

    #[test]
    fn load_out_of_bounds() {
        let (mut cpu, mut mem) = setup();
        let top = mem.stack_top();
        cpu.registers.set_register_at(0, top);
        let before = cpu.clone();

        assert_eq!(
            run(&mut cpu, &mut mem, asm::ldr_imm(1, 0, 0)),
            Err(EmuError::OutOfBounds {
                address: top,
                width: 4,
                kind: AccessKind::Load,
            })
        );
        assert_eq!(cpu, before);
        assert_eq!(cpu.registers.register_at(REG_PROGRAM_COUNTER), PC);
    }

    #[test]
    fn byte_store_is_unsupported() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_register_at(0, mem.data_base());
        let strb = 0b1110_01_0_1_1_1_0_0_0000_0001_0000_0000_0000;
        let before_mem = mem.clone();
        assert_eq!(
            run(&mut cpu, &mut mem, strb),
            Err(EmuError::UnsupportedAddressingMode {
                address: PC,
                raw: strb,
                mode: UnsupportedMode::ByteStore,
            })
        );
        assert_eq!(mem, before_mem);
        assert_eq!(cpu.counters.memory, 0);
    }
}
