//! # interpreter
//!
//! Fetch/decode/execute for one CHIP-8 instruction at a time. The interpreter
//! owns the machine state; the scheduler drives it, feeds it key events and
//! ticks its timers.
//!
//! It is a small state machine:
//!  Running          -- `cycle()` runs the instruction at PC
//!  WaitingForKey(x) -- after Fx0A; `cycle()` does nothing until a key goes
//!                      down, which lands in Vx
//!  Halted           -- after a fatal error; `cycle()` does nothing, forever

use crate::decode::Instruction;
use crate::error::Chip8Error;
use crate::instructions::{self, Flow};
use crate::machine::Machine;
use crate::memory::{MemoryMap, CHIP8_RAM_SIZE_BYTES};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::io;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    WaitingForKey(u8),
    Halted,
}

/// What a call to `cycle()` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Executed {
        opcode: u16,
        instruction: Instruction,
    },
    /// the word at PC means nothing; it was skipped over
    Unrecognised(u16),
    WaitingForKey,
    Halted,
}

impl Step {
    /// whether the frame buffer may have changed
    pub fn changes_display(&self) -> bool {
        match self {
            Step::Executed { instruction, .. } => instruction.changes_display(),
            _ => false,
        }
    }
}

pub struct Chip8Interpreter {
    machine: Machine,
    state: RunState,
    rng: StdRng,
    /// unrecognised words already warned about
    reported: HashSet<u16>,
}

impl Chip8Interpreter {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// RND results are reproducible for a given seed
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Chip8Interpreter {
            machine: Machine::new(),
            state: RunState::Running,
            rng,
            reported: HashSet::new(),
        }
    }

    /// load a chip8 program at 0x200, returning its size
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        self.machine.memory.load_program(reader)
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == RunState::Halted
    }

    /// run the instruction at PC, unless waiting or halted
    pub fn cycle(&mut self) -> Result<Step, Chip8Error> {
        match self.state {
            RunState::Halted => return Ok(Step::Halted),
            RunState::WaitingForKey(_) => return Ok(Step::WaitingForKey),
            RunState::Running => {}
        }

        let pc = self.machine.pc;
        // the whole word has to fit
        if pc as usize + 1 >= CHIP8_RAM_SIZE_BYTES {
            return Err(self.halt(Chip8Error::ProgramCounterOutOfBounds { pc }));
        }
        let opcode = match self.machine.memory.get_word(pc) {
            Ok(opcode) => opcode,
            Err(e) => return Err(self.halt(e)),
        };
        self.machine.pc = pc + 2;

        let instruction = match Instruction::decode(opcode) {
            Some(instruction) => instruction,
            None => {
                if self.reported.insert(opcode) {
                    log::warn!("Unrecognised opcode {:04X} at {:#05x}, skipping", opcode, pc);
                }
                return Ok(Step::Unrecognised(opcode));
            }
        };
        log::trace!("{:#05x}: {:04X}  {}", pc, opcode, instruction);
        if let Instruction::Sys(addr) = instruction {
            log::debug!("Ignoring machine code call to {:#05x} at {:#05x}", addr, pc);
        }

        match instructions::execute(instruction, &mut self.machine, &mut self.rng) {
            Ok(Flow::Continue) => {}
            Ok(Flow::WaitForKey(x)) => {
                log::debug!("Waiting for a key for V{:X}", x);
                self.state = RunState::WaitingForKey(x);
            }
            Err(e) => return Err(self.halt(e)),
        }
        Ok(Step::Executed {
            opcode,
            instruction,
        })
    }

    fn halt(&mut self, e: Chip8Error) -> Chip8Error {
        self.state = RunState::Halted;
        e
    }

    /// a key went down; completes a pending Fx0A on the press edge
    pub fn key_down(&mut self, key: u8) {
        let key = key & 0xf;
        let was_down = self.machine.key_down(key);
        self.machine.set_key(key, true);
        if was_down {
            return;
        }
        if let RunState::WaitingForKey(x) = self.state {
            log::debug!("Key {:X} pressed, resuming with V{:X}", key, x);
            self.machine.v[x as usize] = key;
            self.state = RunState::Running;
        }
    }

    pub fn key_up(&mut self, key: u8) {
        self.machine.set_key(key, false);
    }

    /// one 60Hz timer tick
    pub fn tick_timers(&mut self) {
        self.machine.tick_timers();
    }
}

impl Default for Chip8Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
