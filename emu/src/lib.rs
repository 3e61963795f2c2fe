#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::cast_possible_wrap)]
mod bitwise;

#[allow(clippy::missing_panics_doc)]
#[allow(clippy::cast_possible_truncation)]
pub mod asm;
#[allow(clippy::module_name_repetitions)]
pub mod cache;
pub mod cpu;
pub mod error;
#[allow(clippy::cast_possible_truncation)]
pub mod memory;
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
pub mod programs;
#[allow(clippy::module_name_repetitions)]
pub mod session;

pub use error::EmuError;
pub use session::{RunOutcome, Session, SessionConfig, StepResult};
