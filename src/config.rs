//! Runtime configuration for the emulator binary.
//!
//! Settings come from, highest priority first:
//! 1. Environment variables (`CHIP8_CYCLES_PER_FRAME`, `CHIP8_SEED`, `CHIP8_MUTE`)
//! 2. Command-line arguments
//! 3. Built-in defaults
//!
//! ```text
//! chip8 [--cycles N] [--seed N] [--key-hold N] [--keymap cosmac|linear] [--frames N] [--mute] <rom>
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use crate::input::Keymap;

/// instructions run per 60Hz frame; 10 gives the usual ~600 instructions/s
pub const DEFAULT_CYCLES_PER_FRAME: u32 = 10;

/// frames a terminal keypress is held down for, since terminals never report
/// the release
pub const DEFAULT_KEY_HOLD_FRAMES: u32 = 6;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no ROM given\nusage: chip8 [--cycles N] [--seed N] [--key-hold N] [--keymap cosmac|linear] [--frames N] [--mute] <rom>")]
    MissingRom,

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("option '{0}' needs a value")]
    MissingValue(String),

    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rom: PathBuf,
    pub cycles_per_frame: u32,
    /// fixed seed for RND; entropy when unset
    pub seed: Option<u64>,
    pub mute: bool,
    pub key_hold_frames: u32,
    pub keymap: Keymap,
    /// stop after this many frames; run until quit when unset
    pub max_frames: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rom: PathBuf::new(),
            cycles_per_frame: DEFAULT_CYCLES_PER_FRAME,
            seed: None,
            mute: false,
            key_hold_frames: DEFAULT_KEY_HOLD_FRAMES,
            keymap: Keymap::default(),
            max_frames: None,
        }
    }
}

impl Config {
    /// build the config from the process arguments and environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_args(std::env::args().skip(1))?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// parse arguments, excluding the program name
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Config::default();
        let mut rom = None;
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--mute" => config.mute = true,
                "--cycles" => config.cycles_per_frame = parse_value(&arg, args.next())?,
                "--seed" => config.seed = Some(parse_value(&arg, args.next())?),
                "--key-hold" => config.key_hold_frames = parse_value(&arg, args.next())?,
                "--keymap" => config.keymap = parse_value(&arg, args.next())?,
                "--frames" => config.max_frames = Some(parse_value(&arg, args.next())?),
                opt if opt.starts_with('-') => return Err(ConfigError::UnknownOption(arg)),
                _ => rom = Some(PathBuf::from(arg)),
            }
        }

        config.rom = rom.ok_or(ConfigError::MissingRom)?;
        config.validate()?;
        Ok(config)
    }

    /// environment variables win over the command line
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CHIP8_CYCLES_PER_FRAME") {
            self.cycles_per_frame = parse_named("CHIP8_CYCLES_PER_FRAME", &v)?;
        }
        if let Some(v) = lookup("CHIP8_SEED") {
            self.seed = Some(parse_named("CHIP8_SEED", &v)?);
        }
        if let Some(v) = lookup("CHIP8_MUTE") {
            self.mute = matches!(v.as_str(), "1" | "true" | "yes");
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cycles_per_frame == 0 {
            return Err(ConfigError::InvalidValue {
                name: "cycles per frame".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(option: &str, value: Option<String>) -> Result<T, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::MissingValue(option.to_string()))?;
    parse_named(option, &value)
}

fn parse_named<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_with_rom_only() {
        let c = Config::from_args(["roms/pong.ch8"]).unwrap();
        assert_eq!(c.rom, PathBuf::from("roms/pong.ch8"));
        assert_eq!(c.cycles_per_frame, DEFAULT_CYCLES_PER_FRAME);
        assert_eq!(c.key_hold_frames, DEFAULT_KEY_HOLD_FRAMES);
        assert_eq!(c.seed, None);
        assert!(!c.mute);
        assert_eq!(c.max_frames, None);
        assert_eq!(c.keymap, Keymap::Cosmac);
    }

    #[test]
    fn test_all_options() {
        let c = Config::from_args([
            "--cycles", "20", "--seed", "42", "--mute", "--key-hold", "3", "--frames", "600",
            "--keymap", "linear", "game.ch8",
        ])
        .unwrap();
        assert_eq!(c.keymap, Keymap::Linear);
        assert_eq!(c.cycles_per_frame, 20);
        assert_eq!(c.seed, Some(42));
        assert!(c.mute);
        assert_eq!(c.key_hold_frames, 3);
        assert_eq!(c.max_frames, Some(600));
        assert_eq!(c.rom, PathBuf::from("game.ch8"));
    }

    #[test]
    fn test_missing_rom() {
        assert_eq!(Config::from_args(["--mute"]), Err(ConfigError::MissingRom));
    }

    #[test]
    fn test_bad_options() {
        assert_eq!(
            Config::from_args(["--turbo", "a.ch8"]),
            Err(ConfigError::UnknownOption("--turbo".to_string()))
        );
        assert_eq!(
            Config::from_args(["a.ch8", "--cycles"]),
            Err(ConfigError::MissingValue("--cycles".to_string()))
        );
        assert!(matches!(
            Config::from_args(["--cycles", "lots", "a.ch8"]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            Config::from_args(["--keymap", "dvorak", "a.ch8"]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            Config::from_args(["--cycles", "0", "a.ch8"]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_env_overrides_args() {
        let mut c = Config::from_args(["--cycles", "20", "a.ch8"]).unwrap();
        c.apply_env_overrides(|name| match name {
            "CHIP8_CYCLES_PER_FRAME" => Some("7".to_string()),
            "CHIP8_MUTE" => Some("1".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(c.cycles_per_frame, 7);
        assert!(c.mute);
        assert_eq!(c.seed, None);
    }

    #[test]
    fn test_env_bad_seed() {
        let mut c = Config::from_args(["a.ch8"]).unwrap();
        let r = c.apply_env_overrides(|name| {
            (name == "CHIP8_SEED").then(|| "-1".to_string())
        });
        assert!(matches!(r, Err(ConfigError::InvalidValue { .. })));
    }
}
