//! Command-line configuration for the `famicore` binary.

use std::path::PathBuf;

use clap::Parser;

/// NES emulator
#[derive(Parser, Debug, Clone)]
#[command(name = "famicore")]
#[command(about = "A cycle-timed NES emulator", long_about = None)]
pub struct Config {
    /// Path to the iNES ROM file
    pub rom: PathBuf,

    /// Window scale factor (1, 2, 4 or 8)
    #[arg(short, long, default_value_t = 2)]
    pub scale: u8,

    /// Target frame rate for the window
    #[arg(long, default_value_t = 60)]
    pub fps: usize,

    /// Log one line per executed instruction (needs RUST_LOG=trace)
    #[arg(short, long)]
    pub trace: bool,

    /// Run this many frames without a window, then exit
    #[arg(short, long)]
    pub frames: Option<u64>,
}

impl Config {
    /// Nearest window scale minifb supports.
    pub fn window_scale(&self) -> minifb::Scale {
        match self.scale {
            0 | 1 => minifb::Scale::X1,
            2 | 3 => minifb::Scale::X2,
            4..=7 => minifb::Scale::X4,
            _ => minifb::Scale::X8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["famicore", "game.nes"]).unwrap();
        assert_eq!(config.rom, PathBuf::from("game.nes"));
        assert_eq!(config.scale, 2);
        assert_eq!(config.fps, 60);
        assert!(!config.trace);
        assert_eq!(config.frames, None);
    }

    #[test]
    fn headless_run_with_trace() {
        let config =
            Config::try_parse_from(["famicore", "--trace", "--frames", "120", "-s", "4", "a.nes"])
                .unwrap();
        assert!(config.trace);
        assert_eq!(config.frames, Some(120));
        assert!(matches!(config.window_scale(), minifb::Scale::X4));
    }

    #[test]
    fn rom_is_required() {
        assert!(Config::try_parse_from(["famicore"]).is_err());
    }
}
