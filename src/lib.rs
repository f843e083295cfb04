//! Famicore: a cycle-timed NES (Nintendo Entertainment System) emulator core.
//!
//! Implements the NES chipset as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): the Ricoh 2A03 CPU core,
//! the 2C02 PPU, and cartridge mappers. Every CPU bus access costs one CPU cycle and steps
//! the PPU three dots, so mid-frame register writes land on the same dot they would on
//! hardware.
//!
//! ## Modules (NESdev references)
//!
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map): RAM, PPU window,
//!   IO stub, controller, cartridge
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading; [Mapper](https://www.nesdev.org/wiki/Mapper)
//!   NROM (0), MMC1 (1), MMC3 (4)
//! - **console** – the machine aggregate: load, power, run one frame
//! - **controller** – [Controller reading](https://www.nesdev.org/wiki/Controller_reading): $4016 strobe, shift-out
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) / 2A03: official + commonly tested unofficial opcodes
//! - **io** – hooks for the presentation layer (frame delivery, button state)
//! - **ppu** – [PPU rendering](https://www.nesdev.org/wiki/PPU_rendering), [PPU scrolling](https://www.nesdev.org/wiki/PPU_scrolling),
//!   sprite evaluation, 256×240 framebuffer

pub mod bus;
pub mod cartridge;
pub mod config;
pub mod console;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod io;
pub mod ppu;

pub use console::Console;
pub use error::LoadError;
