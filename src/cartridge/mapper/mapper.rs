//! Mapper trait: PRG/CHR memory access and mirroring.

use crate::cartridge::mapper::Mirroring;

/// Trait for NES cartridge mappers. CPU/PPU use these for all cartridge address space.
pub trait Mapper {
    /// Read CPU cartridge space ($4020–$FFFF): PRG RAM at $6000–$7FFF, PRG ROM at $8000.
    fn prg_read(&self, addr: u16) -> u8;
    /// Write CPU cartridge space: PRG RAM or mapper registers (PRG ROM is read-only).
    /// Returns the new mirroring when the write changed it, so the PPU can be told.
    fn prg_write(&mut self, addr: u16, data: u8) -> Option<Mirroring>;
    /// Read PPU pattern space ($0000–$1FFF). Takes `&mut self` so mappers can watch PPU A12.
    fn chr_read(&mut self, addr: u16) -> u8;
    /// Write PPU pattern space; ignored unless the cartridge carries CHR RAM.
    fn chr_write(&mut self, addr: u16, data: u8);
    /// Current nametable mirroring.
    fn mirroring(&self) -> Mirroring;
    /// Level of the cartridge IRQ line.
    fn irq_pending(&self) -> bool {
        false
    }
}
