//! # scheduler
//!
//! Ties the interpreter to wall-clock time. Every 1/60s frame:
//!
//!  |-- drain host input into the key state
//!  |-- run up to N interpreter cycles (fewer if it halts or waits for a key)
//!  |-- count the timers down once
//!  |-- switch the buzzer to follow the sound timer
//!  |-- hand the frame buffer to the display if CLS or DRW ran
//!  `-- sleep whatever is left of the frame
//!
//! A frame that overruns its budget is not made up for; the time is lost.

use crate::display::Display;
use crate::error::Chip8Error;
use crate::input::{Input, InputEvent};
use crate::interpreter::{Chip8Interpreter, Step};
use crate::sound::Sound;
use std::time::{Duration, Instant};

pub const FRAME_RATE_HZ: u64 = 60;
pub const FRAME_BUDGET: Duration = Duration::from_nanos(1_000_000_000 / FRAME_RATE_HZ);

/// What happened during one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tick {
    pub cycles: u32,
    pub display_changed: bool,
    pub quit: bool,
}

/// Why `main_loop` stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Quit,
    FrameLimit,
}

/// how long to sleep after a frame that took `elapsed`; None if it overran
pub fn frame_budget_remaining(elapsed: Duration) -> Option<Duration> {
    FRAME_BUDGET
        .checked_sub(elapsed)
        .filter(|rest| !rest.is_zero())
}

pub struct FrameScheduler<'a> {
    interpreter: Chip8Interpreter,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    cycles_per_frame: u32,
    frames: u64,
}

impl<'a> FrameScheduler<'a> {
    pub fn new(
        interpreter: Chip8Interpreter,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
        cycles_per_frame: u32,
    ) -> Self {
        FrameScheduler {
            interpreter,
            display,
            input,
            sound,
            cycles_per_frame: cycles_per_frame.max(1),
            frames: 0,
        }
    }

    pub fn interpreter(&self) -> &Chip8Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Chip8Interpreter {
        &mut self.interpreter
    }

    /// frames completed so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame's worth of work without sleeping. A fatal interpreter
    /// error ends the cycles for this frame, but the timers still tick and
    /// anything already drawn is still rendered before the error is returned.
    /// The interpreter stays halted after that and later ticks only count the
    /// timers down.
    pub fn tick(&mut self) -> Result<Tick, Chip8Error> {
        let mut tick = Tick::default();

        for event in self.input.poll_events()? {
            match event {
                InputEvent::KeyDown(key) => self.interpreter.key_down(key),
                InputEvent::KeyUp(key) => self.interpreter.key_up(key),
                InputEvent::Quit => tick.quit = true,
            }
        }
        if tick.quit {
            return Ok(tick);
        }

        let mut fault = None;
        for _ in 0..self.cycles_per_frame {
            match self.interpreter.cycle() {
                Ok(Step::Halted | Step::WaitingForKey) => break,
                Ok(step) => {
                    tick.cycles += 1;
                    tick.display_changed |= step.changes_display();
                }
                Err(e) => {
                    fault = Some(e);
                    break;
                }
            }
        }

        self.interpreter.tick_timers();
        let sounding = self.interpreter.machine().sound_timer > 0;
        if let Err(e) = self.sound.set_active(sounding) {
            log::warn!("Audio device failed: {}", e);
        }

        if tick.display_changed {
            self.display.draw(&self.interpreter.machine().display)?;
        }
        self.frames += 1;
        match fault {
            Some(e) => Err(e),
            None => Ok(tick),
        }
    }

    /// tick at 60Hz until the user quits or `max_frames` have run
    pub fn main_loop(&mut self, max_frames: Option<u64>) -> Result<Outcome, Chip8Error> {
        loop {
            if max_frames.map_or(false, |max| self.frames >= max) {
                return Ok(Outcome::FrameLimit);
            }
            let start = Instant::now();
            if self.tick()?.quit {
                return Ok(Outcome::Quit);
            }
            match frame_budget_remaining(start.elapsed()) {
                Some(rest) => spin_sleep::sleep(rest),
                None => log::trace!("Frame {} overran its budget", self.frames),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::input::ScriptedInput;
    use crate::interpreter::RunState;
    use crate::sound::Mute;

    fn interpreter(prog: &[u8]) -> Chip8Interpreter {
        let mut i = Chip8Interpreter::with_seed(1);
        let mut prog: &[u8] = prog;
        i.load_program(&mut prog).unwrap();
        i
    }

    // JP 0x200, forever
    const SPIN: [u8; 2] = [0x12, 0x00];

    #[test]
    fn test_budget_remaining() {
        assert_eq!(
            frame_budget_remaining(Duration::from_millis(5)),
            Some(FRAME_BUDGET - Duration::from_millis(5))
        );
        assert_eq!(frame_budget_remaining(FRAME_BUDGET), None);
        assert_eq!(frame_budget_remaining(Duration::from_millis(40)), None);
        assert_eq!(frame_budget_remaining(Duration::ZERO), Some(FRAME_BUDGET));
    }

    #[test]
    fn test_frame_budget_is_a_sixtieth() {
        assert_eq!(FRAME_BUDGET.as_micros(), 16_666);
    }

    #[test]
    fn test_delay_timer_decays_once_per_tick() -> Result<(), Chip8Error> {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), ScriptedInput::new(), Mute::new());
        let mut sched = FrameScheduler::new(interpreter(&SPIN), &mut d, &mut i, &mut s, 10);
        sched.interpreter_mut().machine_mut().delay_timer = 5;
        for expected in [4, 3, 2, 1, 0] {
            let tick = sched.tick()?;
            assert_eq!(tick.cycles, 10);
            assert_eq!(sched.interpreter().machine().delay_timer, expected);
        }
        sched.tick()?;
        sched.tick()?;
        assert_eq!(sched.interpreter().machine().delay_timer, 0);
        assert_eq!(sched.frames(), 7);
        Ok(())
    }

    #[test]
    fn test_renders_only_after_display_change() -> Result<(), Chip8Error> {
        // CLS; JP 0x202
        let prog = [0x00, 0xe0, 0x12, 0x02];
        let (mut d, mut i, mut s) = (DummyDisplay::new(), ScriptedInput::new(), Mute::new());
        {
            let mut sched = FrameScheduler::new(interpreter(&prog), &mut d, &mut i, &mut s, 4);
            assert!(sched.tick()?.display_changed);
            assert!(!sched.tick()?.display_changed);
            assert!(!sched.tick()?.display_changed);
        }
        assert_eq!(d.frames_drawn, 1);
        Ok(())
    }

    #[test]
    fn test_drawn_frame_matches_machine() -> Result<(), Chip8Error> {
        // LD I,0x206; DRW V0,V0,1; JP 0x204; sprite 0xF0
        let prog = [0xa2, 0x06, 0xd0, 0x01, 0x12, 0x04, 0xf0];
        let (mut d, mut i, mut s) = (DummyDisplay::new(), ScriptedInput::new(), Mute::new());
        {
            let mut sched = FrameScheduler::new(interpreter(&prog), &mut d, &mut i, &mut s, 10);
            sched.tick()?;
        }
        let frame = d.last_frame.expect("a frame was drawn");
        assert_eq!(frame.lit_count(), 4);
        assert_eq!(frame.pixel(3, 0), 1);
        Ok(())
    }

    #[test]
    fn test_quit_stops_before_running() -> Result<(), Chip8Error> {
        let (mut d, mut s) = (DummyDisplay::new(), Mute::new());
        let mut i = ScriptedInput::new().then(vec![InputEvent::Quit]);
        let mut sched = FrameScheduler::new(interpreter(&SPIN), &mut d, &mut i, &mut s, 10);
        let tick = sched.tick()?;
        assert!(tick.quit);
        assert_eq!(tick.cycles, 0);
        Ok(())
    }

    #[test]
    fn test_key_wait_spans_ticks() -> Result<(), Chip8Error> {
        // LD V3,K; LD V0,1; JP 0x204
        let prog = [0xf3, 0x0a, 0x60, 0x01, 0x12, 0x04];
        let (mut d, mut s) = (DummyDisplay::new(), Mute::new());
        let mut i = ScriptedInput::new()
            .then(vec![])
            .then(vec![])
            .then(vec![InputEvent::KeyDown(7)]);
        let mut sched = FrameScheduler::new(interpreter(&prog), &mut d, &mut i, &mut s, 10);
        sched.interpreter_mut().machine_mut().delay_timer = 10;

        assert_eq!(sched.tick()?.cycles, 1);
        assert_eq!(sched.interpreter().state(), RunState::WaitingForKey(3));
        assert_eq!(sched.tick()?.cycles, 0);
        // timers keep going while suspended
        assert_eq!(sched.interpreter().machine().delay_timer, 8);

        sched.tick()?;
        let m = sched.interpreter().machine();
        assert_eq!(m.v[3], 7);
        assert_eq!(m.v[0], 1);
        assert!(m.key_down(7));
        Ok(())
    }

    #[test]
    fn test_key_events_reach_key_state() -> Result<(), Chip8Error> {
        let (mut d, mut s) = (DummyDisplay::new(), Mute::new());
        let mut i = ScriptedInput::new()
            .then(vec![InputEvent::KeyDown(0xa), InputEvent::KeyDown(2)])
            .then(vec![InputEvent::KeyUp(0xa)]);
        let mut sched = FrameScheduler::new(interpreter(&SPIN), &mut d, &mut i, &mut s, 1);
        sched.tick()?;
        assert!(sched.interpreter().machine().key_down(0xa));
        sched.tick()?;
        assert!(!sched.interpreter().machine().key_down(0xa));
        assert!(sched.interpreter().machine().key_down(2));
        Ok(())
    }

    #[test]
    fn test_sound_follows_timer() -> Result<(), Chip8Error> {
        // LD V0,10; LD ST,V0; JP 0x204
        let prog = [0x60, 0x0a, 0xf0, 0x18, 0x12, 0x04];
        let (mut d, mut i, mut s) = (DummyDisplay::new(), ScriptedInput::new(), Mute::new());
        {
            let mut sched = FrameScheduler::new(interpreter(&prog), &mut d, &mut i, &mut s, 10);
            for _ in 0..9 {
                sched.tick()?;
            }
            assert_eq!(sched.interpreter().machine().sound_timer, 1);
            sched.tick()?;
            assert_eq!(sched.interpreter().machine().sound_timer, 0);
        }
        assert_eq!(s.beeps, 1);
        assert!(!s.is_beeping());
        Ok(())
    }

    #[test]
    fn test_fatal_error_halts() -> Result<(), Chip8Error> {
        // RET with nothing to return to
        let (mut d, mut i, mut s) = (DummyDisplay::new(), ScriptedInput::new(), Mute::new());
        let mut sched = FrameScheduler::new(interpreter(&[0x00, 0xee]), &mut d, &mut i, &mut s, 10);
        assert!(matches!(sched.tick(), Err(Chip8Error::StackUnderflow { .. })));
        assert!(sched.interpreter().is_halted());
        assert_eq!(sched.tick()?.cycles, 0);
        Ok(())
    }

    #[test]
    fn test_fatal_frame_still_finishes() {
        // LD I,0x208; DRW V0,V0,1; RET with nothing to return to; sprite 0x80
        let prog = [0xa2, 0x08, 0xd0, 0x01, 0x00, 0xee, 0x00, 0x00, 0x80];
        let (mut d, mut i, mut s) = (DummyDisplay::new(), ScriptedInput::new(), Mute::new());
        {
            let mut sched = FrameScheduler::new(interpreter(&prog), &mut d, &mut i, &mut s, 10);
            sched.interpreter_mut().machine_mut().delay_timer = 3;
            assert!(matches!(sched.tick(), Err(Chip8Error::StackUnderflow { pc: 0x204 })));
            assert_eq!(sched.interpreter().machine().delay_timer, 2);
            assert_eq!(sched.frames(), 1);
        }
        // the sprite drawn before the fault reached the display
        assert_eq!(d.frames_drawn, 1);
        assert_eq!(d.last_frame.expect("a frame was drawn").pixel(0, 0), 1);
    }

    #[test]
    fn test_main_loop_frame_limit() -> Result<(), Chip8Error> {
        let (mut d, mut i, mut s) = (DummyDisplay::new(), ScriptedInput::new(), Mute::new());
        let mut sched = FrameScheduler::new(interpreter(&SPIN), &mut d, &mut i, &mut s, 10);
        let start = Instant::now();
        assert_eq!(sched.main_loop(Some(3))?, Outcome::FrameLimit);
        assert_eq!(sched.frames(), 3);
        // paced, so three frames take roughly three budgets
        assert!(start.elapsed() >= FRAME_BUDGET * 2);
        Ok(())
    }

    #[test]
    fn test_main_loop_quit() -> Result<(), Chip8Error> {
        let (mut d, mut s) = (DummyDisplay::new(), Mute::new());
        let mut i = ScriptedInput::new().then(vec![]).then(vec![InputEvent::Quit]);
        let mut sched = FrameScheduler::new(interpreter(&SPIN), &mut d, &mut i, &mut s, 10);
        assert_eq!(sched.main_loop(None)?, Outcome::Quit);
        assert_eq!(sched.frames(), 1);
        Ok(())
    }
}
