//! # Emulation Session
//!
//! Owns everything one emulated call needs and drives the
//! fetch, cache lookup, decode and execute cycle until the function returns
//! through the halt sentinel.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::cache::{CacheSize, CacheStats, DirectMappedCache};
use crate::cpu::opcode::ArmModeOpcode;
use crate::cpu::state::{InstructionCounters, MachineState};
use crate::error::EmuError;
use crate::memory::MemoryImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Bytes reserved for the stack, placed after code and data.
    pub stack_size: u32,
    pub cache_size: CacheSize,
    /// Executed instructions after which the run fails as non-terminating.
    pub max_instructions: u64,
    /// Address of the first code byte.
    pub code_base: u32,
}

impl SessionConfig {
    pub const DEFAULT_STACK_SIZE: u32 = 1024;
    pub const DEFAULT_MAX_INSTRUCTIONS: u64 = 10_000_000;
    pub const DEFAULT_CODE_BASE: u32 = 0x0000_8000;

    /// Lays out `code` and `data` the way this configuration says.
    ///
    /// # Errors
    /// See [`MemoryImage::new`].
    pub fn image(&self, code: &[u8], data: &[u8]) -> Result<MemoryImage, EmuError> {
        if self.stack_size % 4 != 0 {
            return Err(EmuError::InvalidLayout {
                reason: format!("stack size {} is not a whole number of words", self.stack_size),
            });
        }
        MemoryImage::new(self.code_base, code, data, self.stack_size)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stack_size: Self::DEFAULT_STACK_SIZE,
            cache_size: CacheSize::DEFAULT,
            max_instructions: Self::DEFAULT_MAX_INSTRUCTIONS,
            code_base: Self::DEFAULT_CODE_BASE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Continue,
    Halted,
}

/// What a finished run hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// R0 at halt.
    pub return_value: u32,
    pub state: MachineState,
    pub cache: DirectMappedCache,
    pub memory: MemoryImage,
}

impl RunOutcome {
    #[must_use]
    pub const fn counters(&self) -> InstructionCounters {
        self.state.counters
    }

    #[must_use]
    pub const fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub state: MachineState,
    pub memory: MemoryImage,
    pub cache: DirectMappedCache,
    max_instructions: u64,
    executed: u64,
}

impl Session {
    /// Sets up a call to the code at the start of `memory` with `args` in
    /// R0-R3, SP at the top of the stack and LR at the halt sentinel.
    #[must_use]
    pub fn new(config: &SessionConfig, memory: MemoryImage, args: [u32; 4]) -> Self {
        let state = MachineState::new(memory.base(), memory.stack_top(), args);
        debug!(
            entry = format_args!("{:#010X}", memory.base()),
            stack_top = format_args!("{:#010X}", memory.stack_top()),
            cache_size = config.cache_size.get(),
            ?args,
            "session created"
        );

        Self {
            state,
            memory,
            cache: DirectMappedCache::new(config.cache_size),
            max_instructions: config.max_instructions,
            executed: 0,
        }
    }

    /// Number of instructions executed so far.
    #[must_use]
    pub const fn executed(&self) -> u64 {
        self.executed
    }

    /// Reads the word at PC and records the fetch in the cache.
    ///
    /// # Errors
    /// [`EmuError::OutOfBounds`] if PC is outside the code region.
    pub fn fetch_arm(&mut self) -> Result<u32, EmuError> {
        let pc = self.state.registers.program_counter();
        let raw = self.memory.fetch(pc)?;
        self.cache.access(pc);
        Ok(raw)
    }

    /// # Errors
    /// [`EmuError::UnknownInstruction`] if `raw` matches no category.
    pub fn decode(&self, raw: u32) -> Result<ArmModeOpcode, EmuError> {
        ArmModeOpcode::try_from(raw).map_err(|_| EmuError::UnknownInstruction {
            address: self.state.registers.program_counter(),
            raw,
        })
    }

    /// Executes one instruction.
    ///
    /// # Errors
    /// Any [`EmuError`] raised by fetch, decode or the instruction itself.
    /// The failing instruction leaves registers and memory untouched.
    pub fn step(&mut self) -> Result<StepResult, EmuError> {
        if self.state.is_halted() {
            return Ok(StepResult::Halted);
        }

        let raw = self.fetch_arm()?;
        let op_code = self.decode(raw)?;
        trace!(
            pc = format_args!("{:#010X}", self.state.registers.program_counter()),
            raw = format_args!("{raw:#010X}"),
            "{}",
            op_code.instruction.disassembler()
        );

        self.state.execute_arm(&op_code, &mut self.memory)?;
        self.executed += 1;

        if self.state.is_halted() {
            Ok(StepResult::Halted)
        } else {
            Ok(StepResult::Continue)
        }
    }

    /// Steps until the halt sentinel is reached.
    ///
    /// # Errors
    /// The first error raised by [`Session::step`], or
    /// [`EmuError::NonTerminating`] once `max_instructions` have executed
    /// without halting.
    pub fn run(mut self) -> Result<RunOutcome, EmuError> {
        loop {
            if self.executed >= self.max_instructions && !self.state.is_halted() {
                let err = EmuError::NonTerminating {
                    limit: self.max_instructions,
                    pc: self.state.registers.program_counter(),
                };
                warn!(%err, "emulation aborted");
                return Err(err);
            }

            match self.step() {
                Ok(StepResult::Continue) => {}
                Ok(StepResult::Halted) => break,
                Err(err) => {
                    warn!(
                        %err,
                        address = ?err.address(),
                        executed = self.executed,
                        "emulation aborted"
                    );
                    return Err(err);
                }
            }
        }

        let return_value = self.state.return_value();
        debug!(
            return_value,
            executed = self.executed,
            cache_hits = self.cache.stats().hits,
            cache_misses = self.cache.stats().misses,
            "session halted"
        );

        Ok(RunOutcome {
            return_value,
            state: self.state,
            cache: self.cache,
            memory: self.memory,
        })
    }
}
