//! Execution of decoded instructions against the machine state.
//!
//! By the time an instruction runs the program counter already points past
//! it, so jumps overwrite it and skips add another 2.

use crate::decode::Instruction;
use crate::error::Chip8Error;
use crate::machine::{Machine, VF};
use crate::memory::{Chip8MemoryMap, MemoryMap};
use rand::Rng;

/// What the interpreter should do after an instruction completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// stop executing until a key goes down, then put it in this register
    WaitForKey(u8),
}

fn skip_if(machine: &mut Machine, condition: bool) {
    if condition {
        machine.pc = machine.pc.wrapping_add(2);
    }
}

/// Run one instruction to completion. Errors are fatal to the program.
pub fn execute<R: Rng>(
    instruction: Instruction,
    machine: &mut Machine,
    rng: &mut R,
) -> Result<Flow, Chip8Error> {
    use Instruction::*;

    let v = &mut machine.v;
    match instruction {
        Sys(_) => {}
        ClearScreen => machine.display.clear(),
        Return => machine.pc = machine.pop_return()?,
        Jump(addr) => machine.pc = addr,
        Call(addr) => {
            machine.push_return(machine.pc)?;
            machine.pc = addr;
        }
        SkipIfEqualImm(x, kk) => {
            let c = v[x as usize] == kk;
            skip_if(machine, c)
        }
        SkipIfNotEqualImm(x, kk) => {
            let c = v[x as usize] != kk;
            skip_if(machine, c)
        }
        SkipIfEqual(x, y) => {
            let c = v[x as usize] == v[y as usize];
            skip_if(machine, c)
        }
        SkipIfNotEqual(x, y) => {
            let c = v[x as usize] != v[y as usize];
            skip_if(machine, c)
        }
        LoadImm(x, kk) => v[x as usize] = kk,
        AddImm(x, kk) => v[x as usize] = v[x as usize].wrapping_add(kk),
        Load(x, y) => v[x as usize] = v[y as usize],
        Or(x, y) => v[x as usize] |= v[y as usize],
        And(x, y) => v[x as usize] &= v[y as usize],
        Xor(x, y) => v[x as usize] ^= v[y as usize],
        // the flag is always written last, so it wins when x is VF
        Add(x, y) => {
            let (sum, carry) = v[x as usize].overflowing_add(v[y as usize]);
            v[x as usize] = sum;
            v[VF] = carry as u8;
        }
        Sub(x, y) => {
            let (vx, vy) = (v[x as usize], v[y as usize]);
            v[x as usize] = vx.wrapping_sub(vy);
            v[VF] = (vx > vy) as u8;
        }
        SubN(x, y) => {
            let (vx, vy) = (v[x as usize], v[y as usize]);
            v[x as usize] = vy.wrapping_sub(vx);
            v[VF] = (vy > vx) as u8;
        }
        ShiftRight(x) => {
            let vx = v[x as usize];
            v[x as usize] = vx >> 1;
            v[VF] = vx & 0x1;
        }
        ShiftLeft(x) => {
            let vx = v[x as usize];
            v[x as usize] = vx << 1;
            v[VF] = vx >> 7;
        }
        LoadIndex(addr) => machine.i = addr,
        JumpOffset(addr) => machine.pc = addr + v[0] as u16,
        Random(x, kk) => v[x as usize] = rng.gen::<u8>() & kk,
        Draw(x, y, n) => {
            let (col, row) = (v[x as usize], v[y as usize]);
            let mut rows = [0u8; 15];
            let sprite = &mut rows[..n as usize];
            machine.memory.load(machine.i, sprite)?;
            let collision = machine.display.draw_sprite(col, row, sprite);
            machine.v[VF] = collision as u8;
        }
        SkipIfKey(x) => {
            let key = v[x as usize];
            let c = machine.key_down(key);
            skip_if(machine, c)
        }
        SkipIfNotKey(x) => {
            let key = v[x as usize];
            let c = !machine.key_down(key);
            skip_if(machine, c)
        }
        GetDelayTimer(x) => v[x as usize] = machine.delay_timer,
        WaitForKey(x) => return Ok(Flow::WaitForKey(x)),
        SetDelayTimer(x) => machine.delay_timer = v[x as usize],
        SetSoundTimer(x) => machine.sound_timer = v[x as usize],
        AddToIndex(x) => machine.i = machine.i.wrapping_add(v[x as usize] as u16),
        LoadGlyph(x) => machine.i = Chip8MemoryMap::glyph_addr(v[x as usize]),
        StoreBcd(x) => {
            let vx = v[x as usize];
            machine
                .memory
                .store(&[vx / 100, (vx / 10) % 10, vx % 10], machine.i)?;
        }
        StoreRegisters(x) => {
            machine.memory.store(&machine.v[..=x as usize], machine.i)?;
        }
        LoadRegisters(x) => {
            machine.memory.load(machine.i, &mut machine.v[..=x as usize])?;
        }
    }
    Ok(Flow::Continue)
}
