use crate::{
    bus::Bus,
    cpu::{
        flags::{FLAG_BREAK, FLAG_INTERRUPT_DISABLE, FLAG_UNUSED},
        table::{self, Instruction},
    },
};

use ansi_term::Colour::Green;

/// CPU cycles in one NTSC frame (341 × 262 PPU dots / 3, rounded down).
pub const CYCLES_PER_FRAME: i32 = 29781;

const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
pub(super) const IRQ_VECTOR: u16 = 0xFFFE;

/// Ricoh 2A03 CPU core (6502 without decimal mode) driving a [`Bus`].
pub struct Cpu<B: Bus> {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    /// CPU cycles since power-on.
    pub cycles: u64,
    pub bus: B,
    /// Emit one trace line per instruction at `log::Level::Trace`.
    pub trace: bool,
    /// Cycle budget left in the current frame. Overshoot carries into the next frame.
    pub(super) remaining: i32,
    pub(super) nmi: bool,
    pub(super) irq: bool,
    /// Opcode of the instruction being executed.
    pub(super) opcode: u8,
    table: Box<[Instruction<B>; 256]>,
    pub(super) warned: [bool; 256],
}

impl<B: Bus> Cpu<B> {
    pub fn new(bus: B) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0,
            pc: 0,
            status: FLAG_INTERRUPT_DISABLE,
            cycles: 0,
            bus,
            trace: false,
            remaining: 0,
            nmi: false,
            irq: false,
            opcode: 0,
            table: table::build(),
            warned: [false; 256],
        }
    }

    /// Power-on: clear registers, power the bus (RAM fill, PPU), then run the reset sequence.
    pub fn power(&mut self) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0;
        self.status = FLAG_INTERRUPT_DISABLE;
        self.cycles = 0;
        self.remaining = 0;
        self.nmi = false;
        self.irq = false;
        self.bus.power();
        self.reset();
    }

    /// Reset sequence: three suppressed stack pushes (S drops by 3), I set, PC from $FFFC.
    /// Takes 7 cycles.
    pub fn reset(&mut self) {
        self.tick();
        self.tick();
        for _ in 0..3 {
            self.tick();
            self.sp = self.sp.wrapping_sub(1);
        }
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.pc = self.read16(RESET_VECTOR);
    }

    /// Run one frame's worth of cycles (29781). The last instruction may overshoot.
    pub fn run_frame(&mut self) {
        self.remaining += CYCLES_PER_FRAME;
        while self.remaining > 0 {
            self.step();
        }
    }

    /// Service a pending interrupt, execute one instruction, then run any requested OAM DMA.
    pub fn step(&mut self) {
        if self.nmi {
            self.nmi = false;
            self.interrupt(NMI_VECTOR);
        } else if self.irq && self.status & FLAG_INTERRUPT_DISABLE == 0 {
            self.interrupt(IRQ_VECTOR);
        }

        self.execute();

        if let Some(page) = self.bus.take_dma() {
            self.oam_dma(page);
        }
    }

    /// Latch or clear the NMI request.
    pub fn set_nmi(&mut self, active: bool) {
        self.nmi = active;
    }

    /// Drive the IRQ line level.
    pub fn set_irq(&mut self, active: bool) {
        self.irq = active;
    }

    /// Opcode of the instruction currently (or last) executed.
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    fn execute(&mut self) {
        let pc = self.pc;
        let start = self.cycles;
        self.opcode = self.read(pc);
        self.pc = pc.wrapping_add(1);
        let ins = self.table[self.opcode as usize];
        if self.trace {
            self.trace_line(pc, start, ins.mnemonic);
        }
        let addr = (ins.mode)(self);
        (ins.op)(self, addr);
    }

    fn trace_line(&self, pc: u16, cycles: u64, mnemonic: &str) {
        log::trace!(
            "{:04X}  {:02X}  {}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            pc,
            self.opcode,
            Green.paint(mnemonic),
            self.a,
            self.x,
            self.y,
            self.status,
            self.sp,
            cycles
        );
    }

    /// Hardware interrupt entry: two idle cycles, push PC and P (B clear), set I, load vector.
    pub(super) fn interrupt(&mut self, vector: u16) {
        self.tick();
        self.tick();
        self.push16(self.pc);
        self.push((self.status & !FLAG_BREAK) | FLAG_UNUSED);
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.pc = self.read16(vector);
    }

    /// OAM DMA from page `page`: one dummy cycle (two on an odd cycle), then 256 read/write pairs.
    fn oam_dma(&mut self, page: u8) {
        self.tick();
        if self.cycles % 2 == 1 {
            self.tick();
        }
        let base = (page as u16) << 8;
        for i in 0..256u16 {
            let value = self.read(base | i);
            self.write(0x2004, value);
        }
    }

    /// One CPU cycle: advance the bus and sample its interrupt lines.
    pub(super) fn tick(&mut self) {
        self.remaining -= 1;
        self.cycles += 1;
        self.bus.tick();
        if self.bus.poll_nmi() {
            self.set_nmi(true);
        }
        self.set_irq(self.bus.irq_line());
    }

    pub(super) fn read(&mut self, addr: u16) -> u8 {
        self.tick();
        self.bus.read(addr)
    }

    pub(super) fn write(&mut self, addr: u16, data: u8) {
        self.tick();
        self.bus.write(addr, data);
    }

    pub(super) fn read16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    pub(super) fn push(&mut self, value: u8) {
        let addr = 0x0100 | self.sp as u16;
        self.write(addr, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(super) fn pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        let addr = 0x0100 | self.sp as u16;
        self.read(addr)
    }

    pub(super) fn push16(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push(value as u8);
    }

    pub(super) fn pop16(&mut self) -> u16 {
        let lo = self.pop() as u16;
        let hi = self.pop() as u16;
        (hi << 8) | lo
    }
}
