//! The machine aggregate: one CPU on one bus, with a cartridge slot.

use std::path::Path;

use crate::{
    bus::NesBus,
    cartridge::Cartridge,
    cpu::Cpu,
    error::LoadError,
    io::{FrameSink, InputSource, discard_frames, no_input},
};

/// An NES: CPU, bus (RAM, PPU, controller), and cartridge slot.
pub struct Console {
    cpu: Cpu<NesBus>,
}

impl Console {
    /// A console with an empty cartridge slot. Frames go to `frame_sink`; the controller
    /// reads `input`.
    pub fn new(frame_sink: Box<dyn FrameSink>, input: Box<dyn InputSource>) -> Self {
        Self {
            cpu: Cpu::new(NesBus::new(frame_sink, input)),
        }
    }

    /// A console that drops frames and has no buttons held.
    pub fn headless() -> Self {
        Self::new(discard_frames(), no_input())
    }

    /// Load an iNES file and power on. On error the previous cartridge (if any) stays in.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let cart = Cartridge::load(path)?;
        self.insert(cart);
        Ok(())
    }

    /// Insert a cartridge and power on.
    pub fn insert(&mut self, cart: Cartridge) {
        self.cpu.bus.insert(cart);
        self.power();
    }

    pub fn is_loaded(&self) -> bool {
        self.cpu.bus.cart.is_present()
    }

    /// Power cycle: CPU registers, RAM, and PPU back to their power-on state.
    pub fn power(&mut self) {
        self.cpu.power();
    }

    /// Run one frame (29781 CPU cycles). Does nothing without a cartridge.
    pub fn run_frame(&mut self) {
        if !self.is_loaded() {
            log::warn!("run_frame called with no cartridge inserted");
            return;
        }
        self.cpu.run_frame();
    }

    pub fn set_trace(&mut self, enabled: bool) {
        self.cpu.trace = enabled;
    }

    pub fn cpu(&self) -> &Cpu<NesBus> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu<NesBus> {
        &mut self.cpu
    }

    /// The PPU framebuffer (256×240, 0xRRGGBB).
    pub fn frame(&self) -> &[u32] {
        &self.cpu.bus.ppu.framebuffer
    }

    /// Frames completed since the console was created.
    pub fn frames(&self) -> u64 {
        self.cpu.bus.frames()
    }
}
