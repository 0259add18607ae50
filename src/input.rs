use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::str::FromStr;
use std::time::Duration;

use crate::machine::KEY_COUNT;

/// left-hand side of a qwerty keyboard laid out like the COSMAC VIP hex pad:
///   1 2 3 C        1 2 3 4
///   4 5 6 D   <=   q w e r
///   7 8 9 E        a s d f
///   A 0 B F        z x c v
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// keys 0-F straight along the rows, left to right:
///   1 2 3 4   =>   0 1 2 3
///   q w e r        4 5 6 7
///   a s d f        8 9 A B
///   z x c v        C D E F
const CHIP8_LINEAR_KEYMAP: [(char, u8); 16] = [
    ('1', 0x00),
    ('2', 0x01),
    ('3', 0x02),
    ('4', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('r', 0x07),
    ('a', 0x08),
    ('s', 0x09),
    ('d', 0x0a),
    ('f', 0x0b),
    ('z', 0x0c),
    ('x', 0x0d),
    ('c', 0x0e),
    ('v', 0x0f),
];

/// Which host keys stand in for the hex pad.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Keymap {
    #[default]
    Cosmac,
    Linear,
}

impl Keymap {
    fn table(self) -> [(char, u8); 16] {
        match self {
            Keymap::Cosmac => CHIP8_CONVENTIONAL_KEYMAP,
            Keymap::Linear => CHIP8_LINEAR_KEYMAP,
        }
    }
}

impl FromStr for Keymap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosmac" => Ok(Keymap::Cosmac),
            "linear" => Ok(Keymap::Linear),
            other => Err(format!("no such keymap '{}'", other)),
        }
    }
}

/// Something that happened on the host side since the last poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(u8),
    KeyUp(u8),
    Quit,
}

/// reads keypresses
pub trait Input {
    /// everything that happened since the last call, oldest first; never blocks
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error>;
}

/// Terminals only report presses (and autorepeats), never releases, so a
/// press holds its key down for a number of frames, refreshed by repeats.
struct KeyHold {
    frames: u32,
    remaining: [u32; KEY_COUNT],
}

impl KeyHold {
    fn new(frames: u32) -> Self {
        KeyHold {
            frames: frames.max(1),
            remaining: [0; KEY_COUNT],
        }
    }

    /// true if the key was up before this press
    fn press(&mut self, key: u8) -> bool {
        let slot = &mut self.remaining[key as usize & 0xf];
        let fresh = *slot == 0;
        *slot = self.frames;
        fresh
    }

    /// age every held key by one frame; returns the ones that let go
    fn expire(&mut self) -> Vec<u8> {
        let mut released = Vec::new();
        for (key, slot) in self.remaining.iter_mut().enumerate() {
            if *slot > 0 {
                *slot -= 1;
                if *slot == 0 {
                    released.push(key as u8);
                }
            }
        }
        released
    }
}

/// keyboard input from the terminal, using crossterm in raw mode
pub struct TerminalInput {
    keymap: HashMap<char, u8>,
    hold: KeyHold,
}

impl TerminalInput {
    pub fn new(key_hold_frames: u32, keymap: Keymap) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TerminalInput {
            keymap: HashMap::from(keymap.table()),
            hold: KeyHold::new(key_hold_frames),
        })
    }

    fn translate(&mut self, evt: KeyEvent, events: &mut Vec<InputEvent>) {
        match evt.code {
            KeyCode::Esc => events.push(InputEvent::Quit),
            KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                events.push(InputEvent::Quit)
            }
            KeyCode::Char(c) => match self.keymap.get(&c.to_ascii_lowercase()) {
                Some(&key) => {
                    if self.hold.press(key) {
                        events.push(InputEvent::KeyDown(key));
                    }
                }
                None => log::debug!("Can't map {:?} to a CHIP-8 key", c),
            },
            other => log::debug!("Ignoring key {:?}", other),
        }
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for TerminalInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        let mut events: Vec<_> = self
            .hold
            .expire()
            .into_iter()
            .map(InputEvent::KeyUp)
            .collect();
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                self.translate(evt, &mut events);
            }
        }
        Ok(events)
    }
}

/// Input that replays a script, one batch of events per poll; for testing
#[derive(Default)]
pub struct ScriptedInput {
    batches: VecDeque<Vec<InputEvent>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// queue up what the next-but-n poll will return
    pub fn then(mut self, batch: Vec<InputEvent>) -> Self {
        self.batches.push_back(batch);
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.batches.is_empty()
    }
}

impl Input for ScriptedInput {
    fn poll_events(&mut self) -> Result<Vec<InputEvent>, io::Error> {
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}
