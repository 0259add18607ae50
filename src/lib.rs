//! A CHIP-8 interpreter.
//!
//! ## Design
//!
//! * the interpreter core knows nothing about terminals, keyboards or
//!   speakers; those sit behind the `Display`, `Input` and `Sound` traits
//! * one owned `Machine` holds all program-visible state and is passed by
//!   `&mut` to each instruction
//! * instructions are a closed enum, so an opcode either decodes to exactly
//!   one of them or to nothing
//! * the 60Hz timers only move in the scheduler's frame tick
//! * Fx0A (wait for key) is a state of the interpreter, not a loop inside it
//!
//! Model
//!
//! FrameScheduler
//!  |-- display, input, sound (host adapters)
//!  |-- interpreter
//!  |    |-- machine: memory(font + program), V0..VF, I, PC, stack, timers,
//!  |    |   frame buffer, key state
//!  |    `-- run state: Running | WaitingForKey(x) | Halted
//!  `-- per frame
//!       |-- drain input into the key state
//!       |-- interpreter.cycle() x N
//!       |     `-- fetch word at PC, PC += 2, decode, execute
//!       |-- tick timers, gate sound
//!       |-- draw if CLS/DRW ran
//!       `-- sleep out the rest of the 1/60s
pub mod config;
pub mod decode;
pub mod display;
pub mod error;
pub mod input;
pub mod instructions;
pub mod interpreter;
pub mod machine;
pub mod memory;
pub mod scheduler;
pub mod sound;

pub use error::Chip8Error;
pub use interpreter::Chip8Interpreter;
pub use scheduler::FrameScheduler;
