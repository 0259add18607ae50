use std::io;

/// Everything that can stop the interpreter, or stop a program getting into it.
///
/// Running code raises the program counter, stack and reserved-write
/// variants; they are terminal and leave the interpreter halted. Indexed
/// memory access wraps, so `MemoryOutOfBounds` only comes from direct
/// accesses through the memory map.
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("program counter {pc:#06x} is outside of memory")]
    ProgramCounterOutOfBounds { pc: u16 },

    #[error("call stack overflow: CALL at {pc:#06x} with every frame in use")]
    StackOverflow { pc: u16 },

    #[error("call stack underflow: RET at {pc:#06x} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("memory access out of bounds at address {address:#06x}")]
    MemoryOutOfBounds { address: usize },

    #[error("write to reserved interpreter memory at address {address:#06x}")]
    ReservedWrite { address: usize },

    #[error("program is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Chip8Error {
    /// true for errors that a running program can cause, i.e. ones that halt
    /// the interpreter rather than failing before it starts
    pub fn is_fatal_fault(&self) -> bool {
        !matches!(self, Chip8Error::RomTooLarge { .. } | Chip8Error::Io(_))
    }
}
