//! 6502 CPU emulation for the NES.
//!
//! Official instruction set plus the commonly tested undocumented opcodes. Every memory
//! access ticks the bus once, so instruction timing falls out of the access pattern of each
//! addressing mode. Instructions dispatch through a 256-entry table.

pub mod cpu;
pub mod flags;

mod addressing;
mod instructions;
mod table;

pub use cpu::{CYCLES_PER_FRAME, Cpu};

#[cfg(test)]
mod tests;
