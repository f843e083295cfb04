//! Mapper 1 (MMC1): bank switching via 5-bit shift register.
//!
//! [MMC1](https://www.nesdev.org/wiki/MMC1): writes to $8000–$9FFF (control), $A000–$BFFF (CHR0),
//! $C000–$DFFF (CHR1), $E000–$FFFF (PRG bank). Any write with bit 7 set resets the shift register.
//! Otherwise, bit 0 is shifted in (LSB first); after 5 writes, the value is latched to the selected
//! register. Control (bits 0–1) = mirroring; bits 2–3 = PRG mode; bit 4 = CHR mode.

use crate::cartridge::mapper::{Mirroring, Rom, banked, mapper::Mapper};

/// MMC1 state: 5-bit shift register, control byte (mirroring + PRG/CHR mode), bank selects.
pub struct Mapper1 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    shift_reg: u8,
    shift_count: u8,
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
}

impl Mapper1 {
    /// Create MMC1. Control powers up as $0C (PRG mode 3: $8000 switchable, $C000 fixed last).
    pub fn new(rom: Rom) -> Self {
        // The header mirroring bit is ignored: MMC1 boards take mirroring from the control register.
        let control = 0x0C
            | match rom.mirroring {
                Mirroring::SingleLow => 0,
                Mirroring::SingleHigh => 1,
                Mirroring::Vertical => 2,
                Mirroring::Horizontal => 3,
            };
        Self {
            prg_rom: rom.prg,
            chr: rom.chr,
            chr_is_ram: rom.chr_is_ram,
            prg_ram: vec![0; rom.prg_ram_size],
            shift_reg: 0,
            shift_count: 0,
            control,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
        }
    }

    pub fn prg_bank(&self) -> u8 {
        self.prg_bank
    }

    pub fn control(&self) -> u8 {
        self.control
    }

    /// PRG bank mode from control bits 2–3: 0/1 = 32 KiB mode; 2 = $8000 fixed first, $C000 switchable;
    /// 3 = $8000 switchable, $C000 fixed last.
    fn prg_bank_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    fn prg_bank_count(&self) -> usize {
        self.prg_rom.len() / 0x4000
    }

    /// Physical CHR offset for a pattern address, per control bit 4 (0 = 8 KiB, 1 = two 4 KiB).
    fn chr_offset(&self, addr: u16) -> usize {
        let addr = addr as usize & 0x1FFF;
        let offset = if self.control & 0x10 == 0 {
            (self.chr_bank0 as usize >> 1) * 0x2000 + addr
        } else if addr < 0x1000 {
            self.chr_bank0 as usize * 0x1000 + addr
        } else {
            self.chr_bank1 as usize * 0x1000 + (addr - 0x1000)
        };
        offset % self.chr.len()
    }

    fn decode_mirroring(&self) -> Mirroring {
        match self.control & 0b11 {
            0 => Mirroring::SingleLow,
            1 => Mirroring::SingleHigh,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }

    /// Latch the completed 5-bit value into the register selected by address bits 13–14.
    fn commit(&mut self, addr: u16, value: u8) -> Option<Mirroring> {
        match addr {
            0x8000..=0x9FFF => {
                let before = self.decode_mirroring();
                self.control = value;
                let after = self.decode_mirroring();
                log::debug!("MMC1 control = {:02X} ({:?})", value, after);
                (before != after).then_some(after)
            }
            0xA000..=0xBFFF => {
                self.chr_bank0 = value;
                None
            }
            0xC000..=0xDFFF => {
                self.chr_bank1 = value;
                None
            }
            _ => {
                // Bit 4 is the PRG RAM chip enable on MMC1B; RAM is left enabled.
                self.prg_bank = value & 0x0F;
                log::debug!("MMC1 PRG bank = {}", self.prg_bank);
                None
            }
        }
    }
}

impl Mapper for Mapper1 {
    fn prg_read(&self, addr: u16) -> u8 {
        let addr = addr as usize;
        match addr {
            0x6000..=0x7FFF => self.prg_ram[(addr - 0x6000) % self.prg_ram.len()],
            0x8000..=0xFFFF => {
                let bank = self.prg_bank as usize;
                let (bank, offset) = match self.prg_bank_mode() {
                    0 | 1 => ((bank >> 1) * 2 + (addr - 0x8000) / 0x4000, addr & 0x3FFF),
                    2 if addr < 0xC000 => (0, addr - 0x8000),
                    2 => (bank, addr - 0xC000),
                    _ if addr < 0xC000 => (bank, addr - 0x8000),
                    _ => (self.prg_bank_count() - 1, addr - 0xC000),
                };
                banked(&self.prg_rom, bank, 0x4000, offset)
            }
            _ => 0,
        }
    }

    fn prg_write(&mut self, addr: u16, data: u8) -> Option<Mirroring> {
        match addr {
            0x6000..=0x7FFF => {
                let len = self.prg_ram.len();
                self.prg_ram[(addr as usize - 0x6000) % len] = data;
                None
            }
            0x8000..=0xFFFF => {
                if data & 0x80 != 0 {
                    self.shift_reg = 0;
                    self.shift_count = 0;
                    self.control |= 0x0C;
                    return None;
                }

                self.shift_reg = (self.shift_reg >> 1) | ((data & 1) << 4);
                self.shift_count += 1;
                if self.shift_count < 5 {
                    return None;
                }

                let value = self.shift_reg;
                self.shift_reg = 0;
                self.shift_count = 0;
                self.commit(addr, value)
            }
            _ => None,
        }
    }

    fn chr_read(&mut self, addr: u16) -> u8 {
        self.chr[self.chr_offset(addr)]
    }

    fn chr_write(&mut self, addr: u16, data: u8) {
        if self.chr_is_ram {
            let offset = self.chr_offset(addr);
            self.chr[offset] = data;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.decode_mirroring()
    }
}
