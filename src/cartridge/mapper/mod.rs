//! NES mappers for PRG/CHR memory mapping.
//!
//! Mapper0 (NROM), Mapper1 (MMC1), Mapper4 (MMC3), and the types they share.

/// Nametable mirroring mode for the PPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mirroring {
    /// $2000/$2400 share bank 0, $2800/$2C00 share bank 1.
    Horizontal,
    /// $2000/$2800 share bank 0, $2400/$2C00 share bank 1.
    Vertical,
    /// All four nametables show bank 0.
    SingleLow,
    /// All four nametables show bank 1.
    SingleHigh,
}

impl Mirroring {
    /// Map a PPU nametable address ($2000–$3EFF) to an index into the 2 KiB nametable RAM.
    pub fn nametable_index(self, addr: u16) -> usize {
        let addr = addr & 0x0FFF;
        let table = addr / 0x400;
        let offset = (addr & 0x3FF) as usize;
        let bank = match self {
            Mirroring::Horizontal => table >> 1,
            Mirroring::Vertical => table & 1,
            Mirroring::SingleLow => 0,
            Mirroring::SingleHigh => 1,
        };
        bank as usize * 0x400 + offset
    }
}

/// Raw cartridge contents handed to a mapper constructor.
pub struct Rom {
    pub prg: Vec<u8>,
    /// CHR ROM, or 8 KiB of zeroed CHR RAM when the header declares none.
    pub chr: Vec<u8>,
    pub chr_is_ram: bool,
    pub prg_ram_size: usize,
    pub mirroring: Mirroring,
}

/// Byte at `offset` within bank `bank` of `size` bytes; bank numbers wrap at the end of `mem`.
pub(crate) fn banked(mem: &[u8], bank: usize, size: usize, offset: usize) -> u8 {
    mem[(bank * size + offset) % mem.len()]
}

pub mod mapper;

pub mod mapper0;
pub mod mapper1;
pub mod mapper4;
