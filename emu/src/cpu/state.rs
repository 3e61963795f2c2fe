use serde::{Deserialize, Serialize};

use crate::cache::ratio;
use crate::cpu::psr::Psr;
use crate::cpu::registers::{REG_LR, REG_SP, Registers};

/// Value of LR on entry. Returning through it puts 0 in PC, which halts.
pub const HALT_SENTINEL: u32 = 0;

/// How many instructions of each kind were executed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionCounters {
    /// Data processing and multiply.
    pub computation: u64,
    /// Single data transfers.
    pub memory: u64,
    /// Taken branches, including every `bx`.
    pub branch_taken: u64,
    pub branch_not_taken: u64,
}

impl InstructionCounters {
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.computation + self.memory + self.branch_taken + self.branch_not_taken
    }

    #[must_use]
    pub const fn branches(&self) -> u64 {
        self.branch_taken + self.branch_not_taken
    }

    #[must_use]
    pub fn branch_taken_ratio(&self) -> Option<f64> {
        ratio(self.branch_taken, self.branches())
    }

    #[must_use]
    pub fn branch_not_taken_ratio(&self) -> Option<f64> {
        ratio(self.branch_not_taken, self.branches())
    }
}

/// Registers, flags and counters of one emulated call.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineState {
    pub registers: Registers,
    pub cpsr: Psr,
    pub counters: InstructionCounters,
}

impl MachineState {
    /// State on entry to a function at `entry` called with `args`, with the
    /// stack pointer at `stack_top` and LR holding the halt sentinel.
    #[must_use]
    pub fn new(entry: u32, stack_top: u32, args: [u32; 4]) -> Self {
        let mut s = Self::default();

        for (reg, value) in args.into_iter().enumerate() {
            s.registers.set_register_at(reg, value);
        }
        s.registers.set_register_at(REG_SP, stack_top);
        s.registers.set_register_at(REG_LR, HALT_SENTINEL);
        s.registers.set_program_counter(entry);

        s
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.registers.program_counter() == HALT_SENTINEL
    }

    /// R0, the return value register.
    #[must_use]
    pub const fn return_value(&self) -> u32 {
        self.registers.register_at(0)
    }
}
