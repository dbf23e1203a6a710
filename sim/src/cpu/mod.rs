pub mod arm;
pub mod condition;

#[allow(clippy::cast_lossless)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::module_name_repetitions)]
pub mod core;
pub mod exec;

#[allow(clippy::cast_possible_truncation)]
pub mod flags;
pub mod psr;
pub mod registers;

/// Width in bytes of every instruction word.
pub const SIZE_OF_INSTRUCTION: u32 = 4;
