pub mod alu_instruction;
pub mod condition;
pub mod flags;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
pub mod instruction;
pub mod opcode;

pub mod operations;
pub mod psr;

#[allow(clippy::missing_panics_doc)]
pub mod registers;
pub mod state;
