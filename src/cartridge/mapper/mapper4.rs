//! Mapper 4 (MMC3): bank switching, switchable mirroring, PRG RAM, scanline IRQ.
//!
//! [MMC3](https://www.nesdev.org/wiki/MMC3): Bank select at $8000–$9FFE (even), bank data at
//! $8001–$9FFF (odd). R0/R1 = 2 KiB CHR, R2–R5 = 1 KiB CHR, R6/R7 = 8 KiB PRG. Mirroring at
//! $A000–$BFFE (even). IRQ latch $C000, reload $C001, disable $E000, enable $E001. The IRQ counter
//! clocks on each rising edge of PPU A12 seen on pattern fetches.

use crate::cartridge::mapper::{Mirroring, Rom, mapper::Mapper};

/// MMC3 state: bank registers, resolved bank windows, mirroring, PRG RAM, IRQ counter.
pub struct Mapper4 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    /// Bank select ($8000): bits 0–2 = register index, bit 6 = PRG mode, bit 7 = CHR A12 invert.
    bank_select: u8,
    regs: [u8; 8],
    /// Physical offsets of the four 8 KiB PRG windows at $8000/$A000/$C000/$E000.
    prg_windows: [usize; 4],
    /// Physical offsets of the eight 1 KiB CHR windows.
    chr_windows: [usize; 8],
    mirroring: Mirroring,
    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,
    last_a12: bool,
}

impl Mapper4 {
    pub fn new(rom: Rom) -> Self {
        let mut m = Self {
            prg_rom: rom.prg,
            chr: rom.chr,
            chr_is_ram: rom.chr_is_ram,
            prg_ram: vec![0; rom.prg_ram_size],
            bank_select: 0,
            regs: [0, 2, 4, 5, 6, 7, 0, 1],
            prg_windows: [0; 4],
            chr_windows: [0; 8],
            mirroring: rom.mirroring,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
            last_a12: false,
        };
        m.update_windows();
        m
    }

    /// Recompute the PRG/CHR windows from the bank registers and bank-select modes.
    fn update_windows(&mut self) {
        let prg_banks = (self.prg_rom.len() / 0x2000).max(1);
        let bank8 = |b: usize| (b % prg_banks) * 0x2000;
        let r6 = bank8((self.regs[6] & 0x3F) as usize);
        let r7 = bank8((self.regs[7] & 0x3F) as usize);
        let second_last = bank8(prg_banks.saturating_sub(2));
        let last = bank8(prg_banks - 1);
        self.prg_windows = if self.bank_select & 0x40 == 0 {
            [r6, r7, second_last, last]
        } else {
            [second_last, r7, r6, last]
        };

        let chr_banks = (self.chr.len() / 0x400).max(1);
        let bank1 = |b: u8| (b as usize % chr_banks) * 0x400;
        let r = self.regs;
        let two_k = [bank1(r[0] & 0xFE), bank1(r[0] | 1), bank1(r[1] & 0xFE), bank1(r[1] | 1)];
        let one_k = [bank1(r[2]), bank1(r[3]), bank1(r[4]), bank1(r[5])];
        let mut windows = [0; 8];
        if self.bank_select & 0x80 == 0 {
            windows[..4].copy_from_slice(&two_k);
            windows[4..].copy_from_slice(&one_k);
        } else {
            windows[..4].copy_from_slice(&one_k);
            windows[4..].copy_from_slice(&two_k);
        }
        self.chr_windows = windows;
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let addr = addr as usize & 0x1FFF;
        (self.chr_windows[addr / 0x400] + (addr & 0x3FF)) % self.chr.len()
    }

    /// Clock the scanline counter; raises the IRQ line when it reaches zero while enabled.
    fn clock_irq(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    fn watch_a12(&mut self, addr: u16) {
        let a12 = addr & 0x1000 != 0;
        if a12 && !self.last_a12 {
            self.clock_irq();
        }
        self.last_a12 = a12;
    }
}

impl Mapper for Mapper4 {
    fn prg_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.prg_ram[(addr as usize - 0x6000) % self.prg_ram.len()],
            0x8000..=0xFFFF => {
                let addr = addr as usize - 0x8000;
                let phys = self.prg_windows[addr / 0x2000] + (addr & 0x1FFF);
                self.prg_rom[phys % self.prg_rom.len()]
            }
            _ => 0,
        }
    }

    fn prg_write(&mut self, addr: u16, data: u8) -> Option<Mirroring> {
        let even = addr & 1 == 0;
        match addr {
            0x6000..=0x7FFF => {
                let len = self.prg_ram.len();
                self.prg_ram[(addr as usize - 0x6000) % len] = data;
            }
            0x8000..=0x9FFF => {
                if even {
                    self.bank_select = data;
                } else {
                    self.regs[(self.bank_select & 7) as usize] = data;
                }
                self.update_windows();
            }
            0xA000..=0xBFFF if even => {
                let mirroring = if data & 1 == 0 {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                };
                if mirroring != self.mirroring {
                    self.mirroring = mirroring;
                    log::debug!("MMC3 mirroring = {:?}", mirroring);
                    return Some(mirroring);
                }
            }
            // $A001 PRG RAM protect: RAM is left enabled and writable.
            0xA000..=0xBFFF => {}
            0xC000..=0xDFFF => {
                if even {
                    self.irq_latch = data;
                } else {
                    self.irq_counter = 0;
                    self.irq_reload = true;
                }
            }
            0xE000..=0xFFFF => {
                if even {
                    self.irq_enabled = false;
                    self.irq_pending = false;
                } else {
                    self.irq_enabled = true;
                }
            }
            _ => {}
        }
        None
    }

    fn chr_read(&mut self, addr: u16) -> u8 {
        self.watch_a12(addr);
        self.chr[self.chr_offset(addr)]
    }

    fn chr_write(&mut self, addr: u16, data: u8) {
        self.watch_a12(addr);
        if self.chr_is_ram {
            let offset = self.chr_offset(addr);
            self.chr[offset] = data;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 64 KiB PRG tagged per 8 KiB bank, 8 KiB CHR tagged per 1 KiB bank.
    fn mmc3() -> Mapper4 {
        let prg = (0..8u8).flat_map(|b| vec![b; 0x2000]).collect();
        let chr = (0..8u8).flat_map(|b| vec![0x40 | b; 0x400]).collect();
        Mapper4::new(Rom {
            prg,
            chr,
            chr_is_ram: false,
            prg_ram_size: 0x2000,
            mirroring: Mirroring::Vertical,
        })
    }

    #[test]
    fn last_bank_is_fixed_at_e000() {
        let m = mmc3();
        assert_eq!(m.prg_read(0xE000), 7);
        assert_eq!(m.prg_read(0xC000), 6);
    }

    #[test]
    fn prg_mode_swaps_8000_and_c000() {
        let mut m = mmc3();
        m.prg_write(0x8000, 6);
        m.prg_write(0x8001, 3);
        assert_eq!(m.prg_read(0x8000), 3);
        m.prg_write(0x8000, 0x40 | 6);
        assert_eq!(m.prg_read(0x8000), 6);
        assert_eq!(m.prg_read(0xC000), 3);
    }

    #[test]
    fn chr_inversion_moves_2k_banks_high() {
        let mut m = mmc3();
        m.prg_write(0x8000, 0);
        m.prg_write(0x8001, 4);
        assert_eq!(m.chr_read(0x0000), 0x44);
        assert_eq!(m.chr_read(0x0400), 0x45);
        m.prg_write(0x8000, 0x80);
        assert_eq!(m.chr_read(0x1000), 0x44);
    }

    #[test]
    fn mirroring_write_notifies_only_on_change() {
        let mut m = mmc3();
        assert_eq!(m.prg_write(0xA000, 0), None);
        assert_eq!(m.prg_write(0xA000, 1), Some(Mirroring::Horizontal));
    }

    #[test]
    fn irq_fires_after_latch_plus_one_a12_edges() {
        let mut m = mmc3();
        m.prg_write(0xC000, 2);
        m.prg_write(0xC001, 0);
        m.prg_write(0xE001, 0);
        for _ in 0..2 {
            m.chr_read(0x0000);
            m.chr_read(0x1000);
            assert!(!m.irq_pending());
        }
        m.chr_read(0x0000);
        m.chr_read(0x1000);
        assert!(m.irq_pending());

        m.prg_write(0xE000, 0);
        assert!(!m.irq_pending());
    }
}
