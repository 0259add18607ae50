use crate::display::FrameBuffer;
use crate::error::Chip8Error;
use crate::memory::{Chip8MemoryMap, CHIP8_PROGRAM_ADDR};

pub const REGISTER_COUNT: usize = 16;
pub const STACK_DEPTH: usize = 16;
pub const KEY_COUNT: usize = 16;

/// index of VF, the carry/borrow/collision flag
pub const VF: usize = 0xf;

/// Everything a CHIP-8 program can see. Owned by the interpreter and handed
/// to instructions by `&mut`.
pub struct Machine {
    pub memory: Chip8MemoryMap,
    /// V0..VF
    pub v: [u8; REGISTER_COUNT],
    /// the I address register
    pub i: u16,
    pub pc: u16,
    stack: [u16; STACK_DEPTH],
    /// next free stack slot
    sp: usize,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub display: FrameBuffer,
    keys: [bool; KEY_COUNT],
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            memory: Chip8MemoryMap::new(),
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: CHIP8_PROGRAM_ADDR,
            stack: [0; STACK_DEPTH],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            display: FrameBuffer::new(),
            keys: [false; KEY_COUNT],
        }
    }

    pub fn stack_pointer(&self) -> usize {
        self.sp
    }

    /// return addresses, oldest first
    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.sp]
    }

    pub fn push_return(&mut self, addr: u16) -> Result<(), Chip8Error> {
        if self.sp == STACK_DEPTH {
            return Err(Chip8Error::StackOverflow {
                pc: self.pc.wrapping_sub(2),
            });
        }
        self.stack[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    pub fn pop_return(&mut self) -> Result<u16, Chip8Error> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow {
                pc: self.pc.wrapping_sub(2),
            });
        }
        self.sp -= 1;
        Ok(self.stack[self.sp])
    }

    /// is virtual key `key` (low nibble) held down
    pub fn key_down(&self, key: u8) -> bool {
        self.keys[(key & 0xf) as usize]
    }

    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        &self.keys
    }

    pub(crate) fn set_key(&mut self, key: u8, down: bool) {
        self.keys[(key & 0xf) as usize] = down;
    }

    /// count both timers down by one, stopping at zero
    pub(crate) fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
