use crate::error::Chip8Error;
use std::io;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents memory map: interpreter area and font, then program RAM
pub trait MemoryMap {
    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], Chip8Error>;

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Chip8Error>;

    /// get a single byte
    fn get_byte(&self, addr: u16) -> Result<u8, Chip8Error> {
        Ok(self.get_ro_slice(addr, 1)?[0])
    }

    /// get a big-endian two-byte word (instruction fetch)
    fn get_word(&self, addr: u16) -> Result<u16, Chip8Error> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    /// write a chunk of bytes anywhere in memory; only for setup and loading
    fn write(&mut self, data: &[u8], addr: u16) -> Result<(), Chip8Error> {
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// read on behalf of a running program; addresses wrap at the end of memory
    fn load(&self, addr: u16, buf: &mut [u8]) -> Result<(), Chip8Error> {
        for (offset, b) in buf.iter_mut().enumerate() {
            *b = self.get_byte(wrap_addr(addr, offset))?;
        }
        Ok(())
    }

    /// write on behalf of a running program; addresses wrap at the end of
    /// memory but may not land in the interpreter area. Nothing is written
    /// if any byte would.
    fn store(&mut self, data: &[u8], addr: u16) -> Result<(), Chip8Error> {
        let addrs = (0..data.len()).map(|offset| wrap_addr(addr, offset));
        if let Some(reserved) = addrs.clone().find(|a| *a < CHIP8_PROGRAM_ADDR) {
            return Err(Chip8Error::ReservedWrite {
                address: reserved as usize,
            });
        }
        for (a, b) in addrs.zip(data) {
            self.write(&[*b], a)?;
        }
        Ok(())
    }
}

/// `addr + offset`, modulo the size of memory
fn wrap_addr(addr: u16, offset: usize) -> u16 {
    ((addr as usize + offset) % CHIP8_RAM_SIZE_BYTES) as u16
}

/// Defines the CHIP-8 standard 4K memory map:
///   0x0000-0x004f  font, 16 glyphs of 5 bytes
///   0x0050-0x01ff  rest of the interpreter area (unused)
///   0x0200-0x0fff  program and its working data
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
}

impl MemoryMap for Chip8MemoryMap {
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], Chip8Error> {
        let a = addr as usize;
        check_range(a, len)?;
        Ok(&self.bytes[a..(a + len)])
    }

    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Chip8Error> {
        let a = addr as usize;
        check_range(a, len)?;
        Ok(&mut self.bytes[a..(a + len)])
    }
}

/// first address that falls off the end of memory, if any does
fn check_range(addr: usize, len: usize) -> Result<(), Chip8Error> {
    if addr + len > CHIP8_RAM_SIZE_BYTES {
        return Err(Chip8Error::MemoryOutOfBounds {
            address: addr.max(CHIP8_RAM_SIZE_BYTES),
        });
    }
    Ok(())
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// largest program image that fits above the interpreter area
pub const CHIP8_MAX_PROGRAM_BYTES: usize = CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR as usize;

pub const CHIP8_FONT_ADDR: u16 = 0x000;
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

impl Chip8MemoryMap {
    /// zeroed memory with the font baked in
    pub fn new() -> Self {
        let mut bytes = vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice();
        let font = CHIP8_FONT_ADDR as usize;
        bytes[font..font + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        Chip8MemoryMap { bytes }
    }

    /// load a CHIP-8 program at 0x200; oversized images are refused whole
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        let mut buf = Vec::new();
        let len = reader.read_to_end(&mut buf)?;
        if len > CHIP8_MAX_PROGRAM_BYTES {
            return Err(Chip8Error::RomTooLarge {
                size: len,
                max_size: CHIP8_MAX_PROGRAM_BYTES,
            });
        }
        self.write(&buf, CHIP8_PROGRAM_ADDR)?;
        Ok(len)
    }

    /// where the glyph for a hex digit lives; only the low nibble counts
    pub fn glyph_addr(digit: u8) -> u16 {
        CHIP8_FONT_ADDR + CHIP8_FONT_GLYPH_BYTES * (digit & 0x0f) as u16
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

#[rustfmt::skip]
const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
