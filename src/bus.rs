//! Memory bus and address decoding for the NES.
//!
//! Maps CPU addresses to RAM, PPU registers, the IO stub, the controller, and the cartridge.
//! The CPU calls [`Bus::tick`] once per memory cycle; [`NesBus`] answers by stepping the PPU
//! three dots.

use crate::{
    cartridge::Cartridge,
    controller::Controller,
    io::{FrameSink, InputSource},
    ppu::Ppu,
};

/// Trait for memory-mapped I/O and bus access used by the CPU.
///
/// Only `read` and `write` are required; a flat test memory can ignore the rest.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// One CPU cycle has elapsed.
    fn tick(&mut self) {}

    /// Consume a pending NMI edge.
    fn poll_nmi(&mut self) -> bool {
        false
    }

    /// Level of the maskable interrupt line.
    fn irq_line(&self) -> bool {
        false
    }

    /// Page requested through $4014 since the last call, if any.
    fn take_dma(&mut self) -> Option<u8> {
        None
    }

    /// Power-on state of everything behind the bus.
    fn power(&mut self) {}
}

/// Main NES bus: RAM, PPU, cartridge, and controller.
pub struct NesBus {
    pub ram: [u8; 0x800],
    pub cart: Cartridge,
    pub ppu: Ppu,
    pub controller: Controller,
    frame_sink: Box<dyn FrameSink>,
    frames: u64,
    dma_page: Option<u8>,
}

impl NesBus {
    /// Create a bus with an empty cartridge slot.
    pub fn new(frame_sink: Box<dyn FrameSink>, input: Box<dyn InputSource>) -> Self {
        Self {
            ram: [0xFF; 0x800],
            cart: Cartridge::empty(),
            ppu: Ppu::new(),
            controller: Controller::new(input),
            frame_sink,
            frames: 0,
            dma_page: None,
        }
    }

    /// Plug in a cartridge; the PPU takes the board's nametable mirroring.
    pub fn insert(&mut self, cart: Cartridge) {
        self.ppu.set_mirroring(cart.mirroring());
        self.cart = cart;
    }

    /// Frames delivered to the sink since the bus was created.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            // Internal RAM (mirrored 4x in 0x0000-0x1FFF)
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            // PPU registers $2000-$3FFF (mirrored every 8 bytes)
            0x2000..=0x3FFF => self.ppu.read_register(addr & 7, &mut self.cart),
            0x4016 => self.controller.read(),
            // APU, controller 2, and test registers are not modelled.
            0x4000..=0x401F => 0,
            // Cartridge: PRG RAM and PRG ROM
            _ => self.cart.prg_read(addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = data,
            0x2000..=0x3FFF => self.ppu.write_register(addr & 7, data, &mut self.cart),
            0x4014 => self.dma_page = Some(data),
            0x4016 => self.controller.write(data),
            0x4000..=0x401F => {}
            // Cartridge: mapper registers (e.g. MMC1)
            _ => {
                if let Some(mirroring) = self.cart.prg_write(addr, data) {
                    self.ppu.set_mirroring(mirroring);
                }
            }
        }
    }

    fn tick(&mut self) {
        // 3 PPU dots per CPU cycle
        for _ in 0..3 {
            if self.ppu.step(&mut self.cart) {
                self.frames += 1;
                self.frame_sink.deliver_frame(&self.ppu.framebuffer);
            }
        }
    }

    fn poll_nmi(&mut self) -> bool {
        self.ppu.take_nmi()
    }

    fn irq_line(&self) -> bool {
        self.cart.irq_pending()
    }

    fn take_dma(&mut self) -> Option<u8> {
        self.dma_page.take()
    }

    fn power(&mut self) {
        self.ram.fill(0xFF);
        self.dma_page = None;
        self.ppu.power();
    }
}
