//! NES emulator entry point.
//!
//! Loads a cartridge and runs the console with a display window, or headless for a fixed
//! number of frames with `--frames`.
//! Usage: famicore [--scale N] [--fps N] [--trace] [--frames N] path/to/game.nes

use std::cell::{Cell, RefCell};
use std::process;
use std::rc::Rc;

use ansi_term::Colour::Red;
use clap::Parser;
use famicore::{
    Console,
    config::Config,
    controller::{
        BUTTON_A, BUTTON_B, BUTTON_DOWN, BUTTON_LEFT, BUTTON_RIGHT, BUTTON_SELECT, BUTTON_START,
        BUTTON_UP,
    },
    ppu::{HEIGHT, WIDTH},
};
use minifb::{Key, Window, WindowOptions};

const KEYMAP: [(Key, u8); 9] = [
    (Key::Z, BUTTON_A),
    (Key::X, BUTTON_B),
    (Key::RightShift, BUTTON_SELECT),
    (Key::Backspace, BUTTON_SELECT),
    (Key::Enter, BUTTON_START),
    (Key::Up, BUTTON_UP),
    (Key::Down, BUTTON_DOWN),
    (Key::Left, BUTTON_LEFT),
    (Key::Right, BUTTON_RIGHT),
];

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    if let Err(message) = run(&config) {
        eprintln!("{} {}", Red.bold().paint("error:"), message);
        process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), String> {
    match config.frames {
        Some(frames) => run_headless(config, frames),
        None => run_windowed(config),
    }
}

fn load(console: &mut Console, config: &Config) -> Result<(), String> {
    console
        .load(&config.rom)
        .map_err(|e| format!("{}: {}", config.rom.display(), e))?;
    console.set_trace(config.trace);
    Ok(())
}

fn run_headless(config: &Config, frames: u64) -> Result<(), String> {
    let mut console = Console::headless();
    load(&mut console, config)?;
    for _ in 0..frames {
        console.run_frame();
    }
    let cpu = console.cpu();
    log::info!(
        "ran {} frames: PC:{:04X} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
        console.frames(),
        cpu.pc,
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.status,
        cpu.sp,
        cpu.cycles
    );
    Ok(())
}

fn run_windowed(config: &Config) -> Result<(), String> {
    let frame = Rc::new(RefCell::new(vec![0u32; WIDTH * HEIGHT]));
    let buttons = Rc::new(Cell::new(0u8));

    let sink = {
        let frame = Rc::clone(&frame);
        move |pixels: &[u32]| frame.borrow_mut().copy_from_slice(pixels)
    };
    let input = {
        let buttons = Rc::clone(&buttons);
        move || buttons.get()
    };

    let mut console = Console::new(Box::new(sink), Box::new(input));
    load(&mut console, config)?;

    let mut window = Window::new(
        "famicore",
        WIDTH,
        HEIGHT,
        WindowOptions {
            resize: true,
            scale: config.window_scale(),
            ..WindowOptions::default()
        },
    )
    .map_err(|e| format!("failed to create window: {}", e))?;
    window.set_target_fps(config.fps);

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let held = KEYMAP
            .iter()
            .filter(|(key, _)| window.is_key_down(*key))
            .fold(0, |acc, (_, bit)| acc | bit);
        buttons.set(held);

        console.run_frame();

        window
            .update_with_buffer(&frame.borrow(), WIDTH, HEIGHT)
            .map_err(|e| format!("failed to update window: {}", e))?;
    }
    Ok(())
}
