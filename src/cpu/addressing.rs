//! Addressing modes. Each returns the effective address and performs exactly the bus cycles
//! the operand fetch costs on hardware, including the page-cross penalty for indexed reads.

use crate::{bus::Bus, cpu::cpu::Cpu};

pub(super) fn crosses_page(a: u16, b: u16) -> bool {
    (a & 0xFF00) != (b & 0xFF00)
}

impl<B: Bus> Cpu<B> {
    /// Implied / accumulator: one idle cycle.
    pub(super) fn imp(&mut self) -> u16 {
        self.tick();
        0
    }

    /// Immediate (and relative): the operand is the next byte.
    pub(super) fn imm(&mut self) -> u16 {
        let addr = self.pc;
        self.pc = self.pc.wrapping_add(1);
        addr
    }

    pub(super) fn zp(&mut self) -> u16 {
        let addr = self.imm();
        self.read(addr) as u16
    }

    pub(super) fn zpx(&mut self) -> u16 {
        let base = self.zp();
        self.tick();
        (base + self.x as u16) & 0xFF
    }

    pub(super) fn zpy(&mut self) -> u16 {
        let base = self.zp();
        self.tick();
        (base + self.y as u16) & 0xFF
    }

    pub(super) fn abs(&mut self) -> u16 {
        let addr = self.read16(self.pc);
        self.pc = self.pc.wrapping_add(2);
        addr
    }

    pub(super) fn abx(&mut self) -> u16 {
        let base = self.abs();
        let addr = base.wrapping_add(self.x as u16);
        if crosses_page(base, addr) {
            self.tick();
        }
        addr
    }

    /// abs,X for stores and read-modify-write: the extra cycle is always taken.
    pub(super) fn abx_w(&mut self) -> u16 {
        let base = self.abs();
        self.tick();
        base.wrapping_add(self.x as u16)
    }

    pub(super) fn aby(&mut self) -> u16 {
        let base = self.abs();
        let addr = base.wrapping_add(self.y as u16);
        if crosses_page(base, addr) {
            self.tick();
        }
        addr
    }

    pub(super) fn aby_w(&mut self) -> u16 {
        let base = self.abs();
        self.tick();
        base.wrapping_add(self.y as u16)
    }

    /// Read a pointer from the zero page; the high byte wraps within page 0.
    fn zp_pointer(&mut self, ptr: u16) -> u16 {
        let lo = self.read(ptr & 0xFF) as u16;
        let hi = self.read((ptr + 1) & 0xFF) as u16;
        (hi << 8) | lo
    }

    /// (zp,X)
    pub(super) fn izx(&mut self) -> u16 {
        let ptr = self.zp();
        self.tick();
        self.zp_pointer(ptr + self.x as u16)
    }

    /// (zp),Y
    pub(super) fn izy(&mut self) -> u16 {
        let ptr = self.zp();
        let base = self.zp_pointer(ptr);
        let addr = base.wrapping_add(self.y as u16);
        if crosses_page(base, addr) {
            self.tick();
        }
        addr
    }

    pub(super) fn izy_w(&mut self) -> u16 {
        let ptr = self.zp();
        let base = self.zp_pointer(ptr);
        self.tick();
        base.wrapping_add(self.y as u16)
    }

    /// JMP (abs). The high byte is fetched without carrying into the pointer's page:
    /// JMP ($10FF) reads $10FF and $1000.
    pub(super) fn ind(&mut self) -> u16 {
        let ptr = self.abs();
        let lo = self.read(ptr) as u16;
        let hi = self.read((ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF)) as u16;
        (hi << 8) | lo
    }
}
