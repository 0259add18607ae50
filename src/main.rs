use std::error::Error;
use std::fs::File;

use chip8::config::Config;
use chip8::display::MonoTermDisplay;
use chip8::input::TerminalInput;
use chip8::scheduler::{FrameScheduler, Outcome};
use chip8::sound::{Mute, SimpleBeep, Sound};
use chip8::Chip8Interpreter;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::load()?;

    // load the program before touching the terminal, so errors print cleanly
    let mut interpreter = match config.seed {
        Some(seed) => Chip8Interpreter::with_seed(seed),
        None => Chip8Interpreter::new(),
    };
    let mut f = File::open(&config.rom)?;
    let size = interpreter.load_program(&mut f)?;
    log::info!("Loaded {} ({} bytes)", config.rom.display(), size);

    let mut display = MonoTermDisplay::new()?;
    let mut input = TerminalInput::new(config.key_hold_frames, config.keymap)?;
    let mut sound: Box<dyn Sound> = if config.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };

    let result = {
        let mut scheduler = FrameScheduler::new(
            interpreter,
            &mut display,
            &mut input,
            sound.as_mut(),
            config.cycles_per_frame,
        );
        scheduler.main_loop(config.max_frames)
    };

    // put the terminal back before saying anything
    drop(input);
    drop(display);
    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..12 {
        println!();
    }

    match result {
        Ok(Outcome::Quit) => log::info!("Quit"),
        Ok(Outcome::FrameLimit) => log::info!("Frame limit reached"),
        Err(e) => {
            if e.is_fatal_fault() {
                log::error!("Program halted: {}", e);
            }
            return Err(e.into());
        }
    }
    Ok(())
}
