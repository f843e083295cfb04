//! Mapper 0 (NROM): no bank switching, 16/32 KiB PRG, 8 KiB CHR ROM or RAM.

use crate::cartridge::mapper::{Mirroring, Rom, mapper::Mapper};

/// NROM mapper: fixed PRG and CHR; a 16 KiB PRG image is mirrored into $C000–$FFFF.
pub struct Mapper0 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    mirroring: Mirroring,
}

impl Mapper0 {
    pub fn new(rom: Rom) -> Self {
        Self {
            prg_rom: rom.prg,
            chr: rom.chr,
            chr_is_ram: rom.chr_is_ram,
            prg_ram: vec![0; rom.prg_ram_size],
            mirroring: rom.mirroring,
        }
    }
}

impl Mapper for Mapper0 {
    fn prg_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[(addr as usize - 0x6000) % self.prg_ram.len()],
            // PRG ROM: $8000-$FFFF, directly indexed modulo the image size
            0x8000..=0xFFFF => self.prg_rom[(addr as usize - 0x8000) % self.prg_rom.len()],
            _ => 0,
        }
    }

    fn prg_write(&mut self, addr: u16, data: u8) -> Option<Mirroring> {
        if let 0x6000..=0x7FFF = addr {
            let len = self.prg_ram.len();
            self.prg_ram[(addr as usize - 0x6000) % len] = data;
        }
        None
    }

    fn chr_read(&mut self, addr: u16) -> u8 {
        self.chr[addr as usize % self.chr.len()]
    }

    fn chr_write(&mut self, addr: u16, data: u8) {
        if self.chr_is_ram {
            let len = self.chr.len();
            self.chr[addr as usize % len] = data;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nrom(prg_kib: usize, chr_is_ram: bool) -> Mapper0 {
        let prg = (0..prg_kib * 1024).map(|i| (i >> 8) as u8).collect();
        Mapper0::new(Rom {
            prg,
            chr: vec![0x11; 0x2000],
            chr_is_ram,
            prg_ram_size: 0x2000,
            mirroring: Mirroring::Vertical,
        })
    }

    #[test]
    fn sixteen_kib_prg_is_mirrored_at_c000() {
        let m = nrom(16, false);
        assert_eq!(m.prg_read(0x8123), m.prg_read(0xC123));
        assert_eq!(m.prg_read(0x8100), 0x01);
    }

    #[test]
    fn thirty_two_kib_prg_is_linear() {
        let m = nrom(32, false);
        assert_eq!(m.prg_read(0xC000), 0x40);
        assert_eq!(m.prg_read(0xFFFF), 0x7F);
    }

    #[test]
    fn prg_rom_ignores_writes() {
        let mut m = nrom(16, false);
        let before = m.prg_read(0x8000);
        assert_eq!(m.prg_write(0x8000, 0xAA), None);
        assert_eq!(m.prg_read(0x8000), before);
    }

    #[test]
    fn chr_rom_is_read_only_and_chr_ram_is_writable() {
        let mut rom = nrom(16, false);
        rom.chr_write(0x0010, 0x99);
        assert_eq!(rom.chr_read(0x0010), 0x11);

        let mut ram = nrom(16, true);
        ram.chr_write(0x0010, 0x99);
        assert_eq!(ram.chr_read(0x0010), 0x99);
    }

    #[test]
    fn prg_ram_round_trips() {
        let mut m = nrom(16, false);
        m.prg_write(0x6005, 0x42);
        assert_eq!(m.prg_read(0x6005), 0x42);
    }
}
