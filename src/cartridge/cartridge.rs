//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mapper, byte 8 PRG RAM size),
//! an optional 512-byte trainer, then PRG ROM, then CHR ROM. CHR is RAM when the header declares
//! none. [Mapper](https://www.nesdev.org/wiki/Mapper) implements CPU PRG ($4020–$FFFF) and PPU CHR
//! ($0000–$1FFF) address decoding and bank switching.

use std::fs;
use std::path::Path;

use crate::cartridge::mapper::mapper::Mapper;
use crate::cartridge::mapper::mapper0::Mapper0;
use crate::cartridge::mapper::mapper1::Mapper1;
use crate::cartridge::mapper::mapper4::Mapper4;
use crate::cartridge::mapper::{Mirroring, Rom};
use crate::error::LoadError;

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;

/// Fields decoded from the 16-byte iNES header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    /// PRG ROM size in 16 KiB units.
    pub prg_banks: u8,
    /// CHR ROM size in 8 KiB units (0 → 8 KiB CHR RAM).
    pub chr_banks: u8,
    pub mapper_id: u8,
    pub mirroring: Mirroring,
    pub has_trainer: bool,
    /// PRG RAM size in 8 KiB units, with 0 already defaulted to 1.
    pub prg_ram_banks: u8,
}

impl Header {
    pub fn parse(data: &[u8]) -> Result<Self, LoadError> {
        if data.len() < HEADER_LEN {
            return Err(LoadError::Truncated {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        if &data[0..4] != b"NES\x1A" {
            return Err(LoadError::BadMagic);
        }
        if data[4] == 0 {
            return Err(LoadError::EmptyPrg);
        }

        // Mirroring from byte 6 bit 0: 0 = horizontal, 1 = vertical (board solder pads for NROM).
        let mirroring = if data[6] & 1 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        Ok(Header {
            prg_banks: data[4],
            chr_banks: data[5],
            mapper_id: (data[6] >> 4) | (data[7] & 0xF0),
            mirroring,
            has_trainer: data[6] & 0x04 != 0,
            prg_ram_banks: data[8].max(1),
        })
    }

    pub fn prg_len(&self) -> usize {
        self.prg_banks as usize * 0x4000
    }

    pub fn chr_len(&self) -> usize {
        self.chr_banks as usize * 0x2000
    }
}

/// Cartridge: the mapper that owns PRG/CHR and implements reads, writes, and mirroring.
/// CPU reads PRG via the bus at $4020–$FFFF; the PPU reads CHR at $0000–$1FFF (pattern tables).
pub struct Cartridge {
    mapper: Box<dyn Mapper>,
    header: Option<Header>,
}

impl Cartridge {
    /// Load a cartridge from an iNES file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let data = fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Build a cartridge from an in-memory iNES image.
    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        let header = Header::parse(data)?;

        let prg_start = HEADER_LEN + if header.has_trainer { TRAINER_LEN } else { 0 };
        let chr_start = prg_start + header.prg_len();
        let end = chr_start + header.chr_len();
        if data.len() < end {
            return Err(LoadError::Truncated {
                expected: end,
                actual: data.len(),
            });
        }

        let prg = data[prg_start..chr_start].to_vec();
        let (chr, chr_is_ram) = if header.chr_banks > 0 {
            (data[chr_start..end].to_vec(), false)
        } else {
            (vec![0; 0x2000], true)
        };
        let rom = Rom {
            prg,
            chr,
            chr_is_ram,
            prg_ram_size: header.prg_ram_banks as usize * 0x2000,
            mirroring: header.mirroring,
        };

        let mapper: Box<dyn Mapper> = match header.mapper_id {
            0 => Box::new(Mapper0::new(rom)),
            1 => Box::new(Mapper1::new(rom)),
            4 => Box::new(Mapper4::new(rom)),
            id => return Err(LoadError::UnsupportedMapper(id)),
        };

        log::info!(
            "loaded cartridge: mapper {}, PRG {} KiB, CHR {} KiB{}, {:?} mirroring",
            header.mapper_id,
            header.prg_len() / 1024,
            header.chr_len().max(0x2000) / 1024,
            if chr_is_ram { " (RAM)" } else { "" },
            header.mirroring
        );

        Ok(Self {
            mapper,
            header: Some(header),
        })
    }

    /// An empty cartridge slot: reads return 0, writes are ignored.
    pub fn empty() -> Self {
        Self {
            mapper: Box::new(EmptySlot),
            header: None,
        }
    }

    pub fn is_present(&self) -> bool {
        self.header.is_some()
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn prg_read(&self, addr: u16) -> u8 {
        self.mapper.prg_read(addr)
    }

    /// Returns the new nametable mirroring when the write changed it.
    pub fn prg_write(&mut self, addr: u16, data: u8) -> Option<Mirroring> {
        self.mapper.prg_write(addr, data)
    }

    pub fn chr_read(&mut self, addr: u16) -> u8 {
        self.mapper.chr_read(addr)
    }

    pub fn chr_write(&mut self, addr: u16, data: u8) {
        self.mapper.chr_write(addr, data);
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }

    pub fn irq_pending(&self) -> bool {
        self.mapper.irq_pending()
    }
}

struct EmptySlot;

impl Mapper for EmptySlot {
    fn prg_read(&self, _addr: u16) -> u8 {
        0
    }

    fn prg_write(&mut self, _addr: u16, _data: u8) -> Option<Mirroring> {
        None
    }

    fn chr_read(&mut self, _addr: u16) -> u8 {
        0
    }

    fn chr_write(&mut self, _addr: u16, _data: u8) {}

    fn mirroring(&self) -> Mirroring {
        Mirroring::Horizontal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(b"NES\x1A");
        data[4] = prg_banks;
        data[5] = chr_banks;
        data[6] = flags6;
        data[7] = flags7;
        data.resize(16 + prg_banks as usize * 0x4000 + chr_banks as usize * 0x2000, 0);
        data
    }

    #[test]
    fn parses_mapper_and_mirroring() {
        let header = Header::parse(&image(2, 1, 0x11, 0x00)).unwrap();
        assert_eq!(header.mapper_id, 1);
        assert_eq!(header.mirroring, Mirroring::Vertical);
        assert_eq!(header.prg_ram_banks, 1);

        let header = Header::parse(&image(1, 0, 0x40, 0x00)).unwrap();
        assert_eq!(header.mapper_id, 4);
        assert_eq!(header.mirroring, Mirroring::Horizontal);
    }

    #[test]
    fn loaded_cartridge_keeps_its_header() {
        let mut data = image(2, 0, 0x41, 0x00);
        data[8] = 2;
        let cart = Cartridge::from_bytes(&data).unwrap();
        let header = cart.header().unwrap();
        assert_eq!(header.mapper_id, 4);
        assert_eq!(header.prg_len(), 0x8000);
        assert_eq!(header.chr_len(), 0);
        assert_eq!(header.prg_ram_banks, 2);
        assert_eq!(header.mirroring, Mirroring::Vertical);
    }

    #[test]
    fn high_mapper_nibble_comes_from_byte_7() {
        let err = Cartridge::from_bytes(&image(1, 1, 0x20, 0x10)).err().unwrap();
        assert!(matches!(err, LoadError::UnsupportedMapper(0x12)));
    }

    #[test]
    fn prg_follows_header_and_chr_follows_prg() {
        let mut data = image(1, 1, 0x00, 0x00);
        data[16] = 0xA9;
        data[16 + 0x4000] = 0x3C;
        let mut cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.prg_read(0x8000), 0xA9);
        assert_eq!(cart.chr_read(0x0000), 0x3C);
    }

    #[test]
    fn trainer_is_skipped() {
        let mut data = image(1, 1, 0x04, 0x00);
        data.splice(16..16, std::iter::repeat_n(0xEEu8, 512));
        data[16 + 512] = 0x4C;
        let cart = Cartridge::from_bytes(&data).unwrap();
        assert_eq!(cart.prg_read(0x8000), 0x4C);
    }

    #[test]
    fn zero_chr_banks_give_writable_chr_ram() {
        let mut cart = Cartridge::from_bytes(&image(1, 0, 0x00, 0x00)).unwrap();
        cart.chr_write(0x0123, 0x77);
        assert_eq!(cart.chr_read(0x0123), 0x77);
    }

    #[test]
    fn rejects_bad_magic_and_truncation() {
        let mut data = image(1, 1, 0, 0);
        data[3] = 0;
        assert!(matches!(Cartridge::from_bytes(&data), Err(LoadError::BadMagic)));

        let mut data = image(2, 1, 0, 0);
        data.truncate(0x4000);
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(LoadError::Truncated { .. })
        ));

        assert!(matches!(Cartridge::from_bytes(&data[..10]), Err(LoadError::Truncated { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Cartridge::load("/nonexistent/rom.nes").err().unwrap();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn empty_slot_is_not_present() {
        let cart = Cartridge::empty();
        assert!(!cart.is_present());
        assert!(cart.header().is_none());
        assert_eq!(cart.prg_read(0xFFFC), 0);
    }
}
