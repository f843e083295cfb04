//! NES PPU (Picture Processing Unit) implementation.
//!
//! Dot-based: one [`Ppu::step`] is one PPU dot. A frame is 262 scanlines of 341 dots.
//!
//! ## Scanline layout
//! - 0–239: visible (background fetches, sprite evaluation, pixel output)
//! - 240: post-render (idle)
//! - 241–260: vblank (flag and NMI at 241, dot 1)
//! - 261: pre-render (same fetches as visible lines, no pixels, vertical scroll copy)
//!
//! Registers: $2000–$2007 (mirrored every 8 bytes through $3FFF).

use crate::cartridge::{Cartridge, Mirroring};

/// Framebuffer dimensions.
pub const WIDTH: usize = 256;
pub const HEIGHT: usize = 240;

pub const DOTS_PER_SCANLINE: u16 = 341;
pub const SCANLINES_PER_FRAME: u16 = 262;
pub(super) const POST_RENDER_SCANLINE: u16 = 240;
pub(super) const VBLANK_SCANLINE: u16 = 241;
pub(super) const PRE_RENDER_SCANLINE: u16 = 261;

/// OAM (Object Attribute Memory): 64 sprites × 4 bytes. Each entry: Y, tile, attr, X.
pub const OAM_LEN: usize = 256;

// PPUCTRL ($2000)
pub const CTRL_NAMETABLE: u8 = 0x03;
pub const CTRL_INCREMENT_32: u8 = 0x04;
pub const CTRL_SPRITE_TABLE: u8 = 0x08;
pub const CTRL_BG_TABLE: u8 = 0x10;
pub const CTRL_SPRITE_16: u8 = 0x20;
pub const CTRL_NMI: u8 = 0x80;

// PPUMASK ($2001)
pub const MASK_GREYSCALE: u8 = 0x01;
pub const MASK_BG_LEFT: u8 = 0x02;
pub const MASK_SPRITE_LEFT: u8 = 0x04;
pub const MASK_BG: u8 = 0x08;
pub const MASK_SPRITES: u8 = 0x10;

// PPUSTATUS ($2002)
pub const STATUS_OVERFLOW: u8 = 0x20;
pub const STATUS_SPRITE_ZERO: u8 = 0x40;
pub const STATUS_VBLANK: u8 = 0x80;

/// PPU state: timing, loopy scroll registers, VRAM, OAM, render pipelines, and framebuffer.
pub struct Ppu {
    pub(super) ctrl: u8,
    pub(super) mask: u8,
    pub(super) status: u8,
    pub(super) oam_addr: u8,

    /// Current VRAM address / scroll position (15 bits: yyy NN YYYYY XXXXX).
    pub(super) v: u16,
    /// Temporary VRAM address; the top-left of the screen.
    pub(super) t: u16,
    pub(super) fine_x: u8,
    /// First/second write toggle shared by $2005 and $2006.
    pub(super) w: bool,
    read_buffer: u8,

    pub(super) nametable: [u8; 0x800],
    /// Palette RAM $3F00-$3F1F (32 bytes, with NES mirroring).
    pub(super) palette: [u8; 32],
    /// OAM: written via $2003/$2004 or $4014 DMA.
    pub oam: [u8; OAM_LEN],
    pub(super) secondary_oam: [u8; 32],
    mirroring: Mirroring,

    pub(super) scanline: u16,
    pub(super) dot: u16,
    frame: u64,

    // Background pipeline: latches filled by the four fetches, 16-bit shifters feeding pixels.
    pub(super) nt_latch: u8,
    pub(super) at_latch: u8,
    pub(super) bg_lo_latch: u8,
    pub(super) bg_hi_latch: u8,
    pub(super) bg_shift_lo: u16,
    pub(super) bg_shift_hi: u16,
    pub(super) at_shift_lo: u16,
    pub(super) at_shift_hi: u16,

    // Sprite evaluation for the next scanline.
    pub(super) eval_count: usize,
    pub(super) eval_has_zero: bool,

    // Sprites being drawn on the current scanline.
    pub(super) sprite_count: usize,
    pub(super) sprite_zero_on_line: bool,
    pub(super) sprite_lo: [u8; 8],
    pub(super) sprite_hi: [u8; 8],
    pub(super) sprite_attr: [u8; 8],
    pub(super) sprite_x: [u8; 8],

    nmi_edge: bool,
    /// 256×240 framebuffer (0xRRGGBB per pixel). Row-major, left-to-right, top-to-bottom.
    pub framebuffer: Vec<u32>,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    /// Create a PPU in its power-on state at scanline 0, dot 0.
    pub fn new() -> Self {
        Self {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            v: 0,
            t: 0,
            fine_x: 0,
            w: false,
            read_buffer: 0,
            nametable: [0xFF; 0x800],
            palette: [0; 32],
            oam: [0xFF; OAM_LEN],
            secondary_oam: [0xFF; 32],
            mirroring: Mirroring::Horizontal,
            scanline: 0,
            dot: 0,
            frame: 0,
            nt_latch: 0,
            at_latch: 0,
            bg_lo_latch: 0,
            bg_hi_latch: 0,
            bg_shift_lo: 0,
            bg_shift_hi: 0,
            at_shift_lo: 0,
            at_shift_hi: 0,
            eval_count: 0,
            eval_has_zero: false,
            sprite_count: 0,
            sprite_zero_on_line: false,
            sprite_lo: [0; 8],
            sprite_hi: [0; 8],
            sprite_attr: [0; 8],
            sprite_x: [0; 8],
            nmi_edge: false,
            framebuffer: vec![0; WIDTH * HEIGHT],
        }
    }

    /// Return to the power-on state. Mirroring is a property of the cartridge and is kept.
    pub fn power(&mut self) {
        let mirroring = self.mirroring;
        *self = Self::new();
        self.mirroring = mirroring;
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn dot(&self) -> u16 {
        self.dot
    }

    /// Number of completed frames since power-on.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn ctrl(&self) -> u8 {
        self.ctrl
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn status(&self) -> u8 {
        self.status
    }

    pub fn vram_addr(&self) -> u16 {
        self.v
    }

    pub fn temp_addr(&self) -> u16 {
        self.t
    }

    pub fn fine_x(&self) -> u8 {
        self.fine_x
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Mirroring-change notification from the cartridge.
    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.mirroring = mirroring;
    }

    /// Consume a pending NMI edge (vblank start with NMI enabled).
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_edge)
    }

    pub(super) fn rendering_enabled(&self) -> bool {
        self.mask & (MASK_BG | MASK_SPRITES) != 0
    }

    /// Advance one dot. Returns true when the frame wraps from scanline 261 back to 0.
    pub fn step(&mut self, cart: &mut Cartridge) -> bool {
        match self.scanline {
            0..=239 => {
                if self.rendering_enabled() {
                    self.sprite_cycle(cart);
                    self.background_cycle(cart);
                }
                if (1..=256).contains(&self.dot) {
                    self.render_pixel();
                }
            }
            POST_RENDER_SCANLINE => {}
            VBLANK_SCANLINE if self.dot == 1 => {
                self.status |= STATUS_VBLANK;
                if self.ctrl & CTRL_NMI != 0 {
                    self.nmi_edge = true;
                }
            }
            PRE_RENDER_SCANLINE => {
                if self.dot == 1 {
                    self.status &= !(STATUS_VBLANK | STATUS_SPRITE_ZERO | STATUS_OVERFLOW);
                    self.sprite_count = 0;
                    self.sprite_zero_on_line = false;
                }
                if self.rendering_enabled() {
                    self.background_cycle(cart);
                    if (257..=320).contains(&self.dot) {
                        self.sprite_fetch_cycle(cart);
                    }
                    if (280..=304).contains(&self.dot) {
                        self.copy_vertical();
                    }
                }
            }
            _ => {}
        }

        self.dot += 1;
        if self.dot == DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline == SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.frame += 1;
                return true;
            }
        }
        false
    }

    /// CPU read of register `index` (address bits 0–2).
    pub fn read_register(&mut self, index: u16, cart: &mut Cartridge) -> u8 {
        match index & 7 {
            // PPUSTATUS: reading clears vblank and the write toggle.
            2 => {
                let status = self.status & 0xE0;
                self.status &= !STATUS_VBLANK;
                self.w = false;
                status
            }
            // OAMDATA: reads do not increment OAMADDR.
            4 => self.oam[self.oam_addr as usize],
            // PPUDATA: buffered below $3F00, immediate for palette.
            7 => {
                let addr = self.v & 0x3FFF;
                let value = if addr >= 0x3F00 {
                    self.read_buffer = self.ppu_read(cart, addr - 0x1000);
                    self.ppu_read(cart, addr)
                } else {
                    let buffered = self.read_buffer;
                    self.read_buffer = self.ppu_read(cart, addr);
                    buffered
                };
                self.increment_vram_addr();
                value
            }
            // Write-only registers; open bus is not modelled.
            _ => 0,
        }
    }

    /// CPU write of register `index` (address bits 0–2).
    pub fn write_register(&mut self, index: u16, data: u8, cart: &mut Cartridge) {
        match index & 7 {
            0 => {
                let nmi_was_enabled = self.ctrl & CTRL_NMI != 0;
                self.ctrl = data;
                self.t = (self.t & 0xF3FF) | (((data & CTRL_NAMETABLE) as u16) << 10);
                // Enabling NMI during vblank fires immediately.
                if !nmi_was_enabled && data & CTRL_NMI != 0 && self.status & STATUS_VBLANK != 0 {
                    self.nmi_edge = true;
                }
            }
            1 => self.mask = data,
            2 => {}
            3 => self.oam_addr = data,
            4 => {
                self.oam[self.oam_addr as usize] = data;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            // PPUSCROLL: first write = coarse/fine X, second write = coarse/fine Y.
            5 => {
                if !self.w {
                    self.t = (self.t & !0x001F) | (data as u16 >> 3);
                    self.fine_x = data & 7;
                } else {
                    self.t = (self.t & !0x73E0)
                        | (((data & 0x07) as u16) << 12)
                        | (((data & 0xF8) as u16) << 2);
                }
                self.w = !self.w;
            }
            // PPUADDR: high 6 bits then low byte; the second write copies t into v.
            6 => {
                if !self.w {
                    self.t = (self.t & 0x00FF) | (((data & 0x3F) as u16) << 8);
                } else {
                    self.t = (self.t & 0xFF00) | data as u16;
                    self.v = self.t;
                }
                self.w = !self.w;
            }
            _ => {
                self.ppu_write(cart, self.v & 0x3FFF, data);
                self.increment_vram_addr();
            }
        }
    }

    /// Increment by 32 if PPUCTRL bit 2 set, else 1.
    fn increment_vram_addr(&mut self) {
        let inc = if self.ctrl & CTRL_INCREMENT_32 != 0 { 32 } else { 1 };
        self.v = self.v.wrapping_add(inc) & 0x7FFF;
    }

    /// Read the PPU address space: pattern tables, nametables, palette.
    pub(super) fn ppu_read(&mut self, cart: &mut Cartridge, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.chr_read(addr),
            0x2000..=0x3EFF => self.nametable[self.mirroring.nametable_index(addr)],
            _ => self.palette[palette_index(addr)],
        }
    }

    pub(super) fn ppu_write(&mut self, cart: &mut Cartridge, addr: u16, data: u8) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => cart.chr_write(addr, data),
            0x2000..=0x3EFF => self.nametable[self.mirroring.nametable_index(addr)] = data,
            _ => self.palette[palette_index(addr)] = data & 0x3F,
        }
    }
}

/// Resolve PPU palette address $3F00–$3F1F (and $3F20–$3FFF mirrors) to a 32-byte index.
/// Addresses $3F10, $3F14, $3F18, $3F1C alias $3F00, $3F04, $3F08, $3F0C.
pub(super) fn palette_index(addr: u16) -> usize {
    let i = (addr & 0x1F) as usize;
    if i & 0x13 == 0x10 { i & 0x0F } else { i }
}
