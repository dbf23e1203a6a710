use thiserror::Error;

use crate::cpu::core::Cpu;
use crate::cpu::exec::ExecError;
use crate::memory::{Memory, MemoryError};

/// The simulated machine: one [`Cpu`] wired to a flat [`Memory`].
///
/// The driver loop owns the program counter transition: each step
/// fetches the word at PC, decodes it, executes it, then installs the
/// `next_pc` chosen by the executor. A fatal execution error stops the
/// run with PC still pointing at the offending instruction.
pub struct Machine {
    pub cpu: Cpu,
    pub memory: Memory,
}

/// What a single step did.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Step {
    Executed,
    Halted,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("fetch at {pc:#010X} failed: {source}")]
    Fetch { pc: u32, source: MemoryError },

    #[error("execution at {pc:#010X} failed: {source}")]
    Exec { pc: u32, source: ExecError },
}

impl Machine {
    #[must_use]
    pub fn new(memory_size: usize) -> Self {
        Self {
            cpu: Cpu::default(),
            memory: Memory::new(memory_size),
        }
    }

    /// Loads a program image at `origin` and points PC at it.
    pub fn load_program(&mut self, origin: u32, program: &[u8]) -> Result<(), MemoryError> {
        self.memory.load(origin, program)?;
        self.cpu.registers.set_program_counter(origin);
        Ok(())
    }

    pub fn step(&mut self) -> Result<Step, MachineError> {
        let pc = self.cpu.registers.program_counter();

        let word = self
            .memory
            .read_word(pc)
            .map_err(|source| MachineError::Fetch { pc, source })?;

        let op_code = self.cpu.decode(word);
        let result = self.cpu.execute_arm(op_code);

        if let Some(error) = result.error {
            if error.is_fatal() {
                return Err(MachineError::Exec { pc, source: error });
            }
            tracing::debug!(pc = format_args!("{pc:#010X}"), %error, "warning");
        }

        self.cpu.registers.set_program_counter(result.next_pc);

        if result.should_halt {
            Ok(Step::Halted)
        } else {
            Ok(Step::Executed)
        }
    }

    /// Runs until the halt marker or a fatal error, returning how many
    /// instructions executed. The halt marker itself is not counted.
    pub fn run(&mut self) -> Result<u64, MachineError> {
        let mut executed = 0;
        loop {
            match self.step()? {
                Step::Halted => return Ok(executed),
                Step::Executed => executed += 1,
            }
        }
    }
}
