//! Per-dot rendering: background fetch pipeline, loopy scroll updates, sprite evaluation and
//! sprite pattern fetches, and pixel composition.
//!
//! See [PPU rendering](https://www.nesdev.org/wiki/PPU_rendering) and
//! [PPU scrolling](https://www.nesdev.org/wiki/PPU_scrolling).

use crate::cartridge::Cartridge;
use crate::ppu::palette::NES_PALETTE_RGB;
use crate::ppu::ppu::{
    CTRL_BG_TABLE, CTRL_SPRITE_16, CTRL_SPRITE_TABLE, MASK_BG, MASK_BG_LEFT, MASK_GREYSCALE,
    MASK_SPRITE_LEFT, MASK_SPRITES, Ppu, STATUS_OVERFLOW, STATUS_SPRITE_ZERO, WIDTH, palette_index,
};

/// An opaque sprite pixel selected for the current dot.
struct SpritePixel {
    pixel: u8,
    palette: u8,
    behind_background: bool,
    is_sprite_zero: bool,
}

impl Ppu {
    fn sprite_height(&self) -> i16 {
        if self.ctrl & CTRL_SPRITE_16 != 0 { 16 } else { 8 }
    }

    /// Background work for one dot of a visible or pre-render scanline.
    pub(super) fn background_cycle(&mut self, cart: &mut Cartridge) {
        let dot = self.dot;
        if (2..=257).contains(&dot) || (322..=337).contains(&dot) {
            self.shift_background();
        }
        // The nametable fetch of dot 1 reads the same address as the dot-340 fetch before it,
        // so the fetch range starts at dot 2.
        if (2..=257).contains(&dot) || (321..=337).contains(&dot) {
            match dot % 8 {
                1 => {
                    self.load_background_shifters();
                    let addr = 0x2000 | (self.v & 0x0FFF);
                    self.nt_latch = self.ppu_read(cart, addr);
                }
                3 => {
                    let v = self.v;
                    let addr = 0x23C0 | (v & 0x0C00) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07);
                    let shift = ((v >> 4) & 4) | (v & 2);
                    self.at_latch = (self.ppu_read(cart, addr) >> shift) & 3;
                }
                5 => {
                    let addr = self.background_pattern_addr();
                    self.bg_lo_latch = self.ppu_read(cart, addr);
                }
                7 => {
                    let addr = self.background_pattern_addr() + 8;
                    self.bg_hi_latch = self.ppu_read(cart, addr);
                }
                0 => self.increment_coarse_x(),
                _ => {}
            }
        }
        match dot {
            256 => self.increment_y(),
            257 => self.copy_horizontal(),
            // Unused nametable fetches at the end of the line.
            338 | 340 => {
                let addr = 0x2000 | (self.v & 0x0FFF);
                self.nt_latch = self.ppu_read(cart, addr);
            }
            _ => {}
        }
    }

    fn background_pattern_addr(&self) -> u16 {
        let table = if self.ctrl & CTRL_BG_TABLE != 0 { 0x1000 } else { 0 };
        table + self.nt_latch as u16 * 16 + ((self.v >> 12) & 7)
    }

    fn shift_background(&mut self) {
        self.bg_shift_lo <<= 1;
        self.bg_shift_hi <<= 1;
        self.at_shift_lo <<= 1;
        self.at_shift_hi <<= 1;
    }

    /// Move the fetched tile into the low byte of the shifters.
    fn load_background_shifters(&mut self) {
        self.bg_shift_lo = (self.bg_shift_lo & 0xFF00) | self.bg_lo_latch as u16;
        self.bg_shift_hi = (self.bg_shift_hi & 0xFF00) | self.bg_hi_latch as u16;
        let fill = |bit: u8| if self.at_latch & bit != 0 { 0xFF } else { 0x00 };
        self.at_shift_lo = (self.at_shift_lo & 0xFF00) | fill(1);
        self.at_shift_hi = (self.at_shift_hi & 0xFF00) | fill(2);
    }

    /// Coarse X increment, wrapping into the horizontally adjacent nametable.
    fn increment_coarse_x(&mut self) {
        if self.v & 0x001F == 31 {
            self.v &= !0x001F;
            self.v ^= 0x0400;
        } else {
            self.v += 1;
        }
    }

    /// Fine Y increment; coarse Y wraps at 30 into the vertically adjacent nametable.
    fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
            return;
        }
        self.v &= !0x7000;
        let mut coarse_y = (self.v & 0x03E0) >> 5;
        if coarse_y == 29 {
            coarse_y = 0;
            self.v ^= 0x0800;
        } else if coarse_y == 31 {
            // Out-of-range coarse Y wraps without switching nametables.
            coarse_y = 0;
        } else {
            coarse_y += 1;
        }
        self.v = (self.v & !0x03E0) | (coarse_y << 5);
    }

    fn copy_horizontal(&mut self) {
        self.v = (self.v & !0x041F) | (self.t & 0x041F);
    }

    pub(super) fn copy_vertical(&mut self) {
        self.v = (self.v & !0x7BE0) | (self.t & 0x7BE0);
    }

    /// Sprite work for one dot of a visible scanline: clear secondary OAM (1–64), evaluate
    /// the 64 OAM entries for the next line (65–192), fetch their patterns (257–320).
    pub(super) fn sprite_cycle(&mut self, cart: &mut Cartridge) {
        match self.dot {
            1..=64 => {
                if self.dot % 2 == 0 {
                    self.secondary_oam[(self.dot / 2 - 1) as usize] = 0xFF;
                }
                if self.dot == 64 {
                    self.eval_count = 0;
                    self.eval_has_zero = false;
                }
            }
            65..=192 => {
                if self.dot % 2 == 1 {
                    self.evaluate_sprite(((self.dot - 65) / 2) as usize);
                }
            }
            257..=320 => {
                if self.dot == 257 {
                    self.sprite_count = self.eval_count;
                    self.sprite_zero_on_line = self.eval_has_zero;
                }
                self.sprite_fetch_cycle(cart);
            }
            _ => {}
        }
    }

    /// Pattern fetch phase of dots 257–320. Runs on the pre-render line too, where every
    /// slot is empty and fetches tile $FF.
    pub(super) fn sprite_fetch_cycle(&mut self, cart: &mut Cartridge) {
        let slot = ((self.dot - 257) / 8) as usize;
        match (self.dot - 257) % 8 {
            5 => self.fetch_sprite_pattern(cart, slot, false),
            7 => self.fetch_sprite_pattern(cart, slot, true),
            _ => {}
        }
    }

    /// Copy OAM entry `n` into secondary OAM if it covers the next scanline.
    fn evaluate_sprite(&mut self, n: usize) {
        let y = self.oam[n * 4] as i16;
        let row = self.scanline as i16 - y;
        if !(0..self.sprite_height()).contains(&row) {
            return;
        }
        if self.eval_count == 8 {
            self.status |= STATUS_OVERFLOW;
            return;
        }
        let dst = self.eval_count * 4;
        self.secondary_oam[dst..dst + 4].copy_from_slice(&self.oam[n * 4..n * 4 + 4]);
        if n == 0 {
            self.eval_has_zero = true;
        }
        self.eval_count += 1;
    }

    /// Fetch one pattern plane for sprite slot `slot`. Empty slots fetch tile $FF and load a
    /// transparent pattern.
    fn fetch_sprite_pattern(&mut self, cart: &mut Cartridge, slot: usize, high: bool) {
        let entry = &self.secondary_oam[slot * 4..slot * 4 + 4];
        let (y, tile, attr, x) = (entry[0], entry[1], entry[2], entry[3]);
        let used = slot < self.sprite_count;
        let row = if used {
            self.scanline as i16 - y as i16
        } else {
            0
        };
        let addr = self.sprite_pattern_addr(if used { tile } else { 0xFF }, attr, row)
            + if high { 8 } else { 0 };
        let mut bits = self.ppu_read(cart, addr);

        if !used {
            bits = 0;
        } else if attr & 0x40 != 0 {
            bits = bits.reverse_bits();
        }
        if high {
            self.sprite_hi[slot] = bits;
        } else {
            self.sprite_lo[slot] = bits;
            self.sprite_attr[slot] = attr;
            self.sprite_x[slot] = x;
        }
    }

    fn sprite_pattern_addr(&self, tile: u8, attr: u8, row: i16) -> u16 {
        let height = self.sprite_height();
        let row = if attr & 0x80 != 0 { height - 1 - row } else { row };
        let row = row as u16;
        if height == 16 {
            let table = (tile & 1) as u16 * 0x1000;
            let tile = (tile & 0xFE) as u16 + if row >= 8 { 1 } else { 0 };
            table + tile * 16 + (row & 7)
        } else {
            let table = if self.ctrl & CTRL_SPRITE_TABLE != 0 { 0x1000 } else { 0 };
            table + tile as u16 * 16 + row
        }
    }

    /// Background pixel (0–3) and attribute palette at screen column `x`.
    fn background_pixel(&self, x: usize) -> (u8, u8) {
        if self.mask & MASK_BG == 0 || (x < 8 && self.mask & MASK_BG_LEFT == 0) {
            return (0, 0);
        }
        let bit = 0x8000 >> self.fine_x;
        let plane = |shifter: u16| (shifter & bit != 0) as u8;
        let pixel = (plane(self.bg_shift_hi) << 1) | plane(self.bg_shift_lo);
        let palette = (plane(self.at_shift_hi) << 1) | plane(self.at_shift_lo);
        (pixel, palette)
    }

    /// First opaque sprite pixel at column `x`, then advance every sprite's X counter or shifter.
    fn sprite_pixel(&mut self, x: usize) -> Option<SpritePixel> {
        if !self.rendering_enabled() {
            return None;
        }
        let mut found = None;
        for i in 0..self.sprite_count {
            if self.sprite_x[i] != 0 || found.is_some() {
                continue;
            }
            let pixel = ((self.sprite_hi[i] >> 7) << 1) | (self.sprite_lo[i] >> 7);
            if pixel != 0 {
                found = Some(SpritePixel {
                    pixel,
                    palette: self.sprite_attr[i] & 3,
                    behind_background: self.sprite_attr[i] & 0x20 != 0,
                    is_sprite_zero: i == 0 && self.sprite_zero_on_line,
                });
            }
        }
        for i in 0..self.sprite_count {
            if self.sprite_x[i] > 0 {
                self.sprite_x[i] -= 1;
            } else {
                self.sprite_lo[i] <<= 1;
                self.sprite_hi[i] <<= 1;
            }
        }

        let visible = self.mask & MASK_SPRITES != 0 && (x >= 8 || self.mask & MASK_SPRITE_LEFT != 0);
        found.filter(|_| visible)
    }

    /// Compose the pixel for the current dot into the framebuffer.
    pub(super) fn render_pixel(&mut self) {
        let x = (self.dot - 1) as usize;
        let y = self.scanline as usize;
        let (bg_pixel, bg_palette) = self.background_pixel(x);
        let sprite = self.sprite_pixel(x);

        let index = match sprite {
            Some(s) => {
                if s.is_sprite_zero && bg_pixel != 0 && x != 255 {
                    self.status |= STATUS_SPRITE_ZERO;
                }
                if bg_pixel == 0 || !s.behind_background {
                    0x10 | (s.palette << 2) | s.pixel
                } else {
                    (bg_palette << 2) | bg_pixel
                }
            }
            None if bg_pixel != 0 => (bg_palette << 2) | bg_pixel,
            None => 0,
        };

        let mut colour = self.palette[palette_index(0x3F00 | index as u16)];
        if self.mask & MASK_GREYSCALE != 0 {
            colour &= 0x30;
        }
        self.framebuffer[y * WIDTH + x] = NES_PALETTE_RGB[(colour & 0x3F) as usize];
    }
}
