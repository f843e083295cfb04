//! Instruction semantics. Each op receives the effective address from its addressing mode
//! (ignored by implied/accumulator forms) and performs the remaining bus cycles itself.

use crate::{
    bus::Bus,
    cpu::{
        addressing::crosses_page,
        cpu::{Cpu, IRQ_VECTOR},
        flags::{
            FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE,
            FLAG_OVERFLOW, FLAG_UNUSED, FLAG_ZERO,
        },
    },
};

impl<B: Bus> Cpu<B> {
    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    fn update_zero_and_negative_flags(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
    }

    /// Read-modify-write: read, one cycle writing the old value back, write the result.
    fn modify(&mut self, addr: u16, f: fn(&mut Self, u8) -> u8) -> u8 {
        let value = self.read(addr);
        self.tick();
        let result = f(self, value);
        self.write(addr, result);
        result
    }

    fn add(&mut self, value: u8) {
        let sum = self.a as u16 + value as u16 + (self.status & FLAG_CARRY) as u16;
        let result = sum as u8;
        self.set_flag(FLAG_CARRY, sum > 0xFF);
        self.set_flag(
            FLAG_OVERFLOW,
            !(self.a ^ value) & (self.a ^ result) & 0x80 != 0,
        );
        self.a = result;
        self.update_zero_and_negative_flags(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.set_flag(FLAG_CARRY, register >= value);
        self.update_zero_and_negative_flags(register.wrapping_sub(value));
    }

    fn shift_left(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn shift_right(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn rotate_left(&mut self, value: u8) -> u8 {
        let carry = self.status & FLAG_CARRY;
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn rotate_right(&mut self, value: u8) -> u8 {
        let carry = (self.status & FLAG_CARRY) << 7;
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn increment(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.update_zero_and_negative_flags(result);
        result
    }

    fn decrement(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.update_zero_and_negative_flags(result);
        result
    }

    fn branch(&mut self, addr: u16, condition: bool) {
        let offset = self.read(addr) as i8;
        if condition {
            let target = self.pc.wrapping_add(offset as u16);
            self.tick();
            if crosses_page(self.pc, target) {
                self.tick();
            }
            self.pc = target;
        }
    }

    // Loads and stores

    pub(super) fn lda(&mut self, addr: u16) {
        self.a = self.read(addr);
        self.update_zero_and_negative_flags(self.a);
    }

    pub(super) fn ldx(&mut self, addr: u16) {
        self.x = self.read(addr);
        self.update_zero_and_negative_flags(self.x);
    }

    pub(super) fn ldy(&mut self, addr: u16) {
        self.y = self.read(addr);
        self.update_zero_and_negative_flags(self.y);
    }

    pub(super) fn sta(&mut self, addr: u16) {
        self.write(addr, self.a);
    }

    pub(super) fn stx(&mut self, addr: u16) {
        self.write(addr, self.x);
    }

    pub(super) fn sty(&mut self, addr: u16) {
        self.write(addr, self.y);
    }

    // Register transfers

    pub(super) fn tax(&mut self, _addr: u16) {
        self.x = self.a;
        self.update_zero_and_negative_flags(self.x);
    }

    pub(super) fn tay(&mut self, _addr: u16) {
        self.y = self.a;
        self.update_zero_and_negative_flags(self.y);
    }

    pub(super) fn txa(&mut self, _addr: u16) {
        self.a = self.x;
        self.update_zero_and_negative_flags(self.a);
    }

    pub(super) fn tya(&mut self, _addr: u16) {
        self.a = self.y;
        self.update_zero_and_negative_flags(self.a);
    }

    pub(super) fn tsx(&mut self, _addr: u16) {
        self.x = self.sp;
        self.update_zero_and_negative_flags(self.x);
    }

    pub(super) fn txs(&mut self, _addr: u16) {
        self.sp = self.x;
    }

    // Stack

    pub(super) fn pha(&mut self, _addr: u16) {
        self.push(self.a);
    }

    pub(super) fn php(&mut self, _addr: u16) {
        self.push(self.status | FLAG_BREAK | FLAG_UNUSED);
    }

    pub(super) fn pla(&mut self, _addr: u16) {
        self.tick();
        self.a = self.pop();
        self.update_zero_and_negative_flags(self.a);
    }

    pub(super) fn plp(&mut self, _addr: u16) {
        self.tick();
        let value = self.pop();
        self.status = (value & !FLAG_BREAK) | FLAG_UNUSED;
    }

    // Logic and arithmetic

    pub(super) fn and(&mut self, addr: u16) {
        self.a &= self.read(addr);
        self.update_zero_and_negative_flags(self.a);
    }

    pub(super) fn ora(&mut self, addr: u16) {
        self.a |= self.read(addr);
        self.update_zero_and_negative_flags(self.a);
    }

    pub(super) fn eor(&mut self, addr: u16) {
        self.a ^= self.read(addr);
        self.update_zero_and_negative_flags(self.a);
    }

    pub(super) fn bit(&mut self, addr: u16) {
        let value = self.read(addr);
        self.set_flag(FLAG_ZERO, self.a & value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
        self.set_flag(FLAG_OVERFLOW, value & 0x40 != 0);
    }

    pub(super) fn adc(&mut self, addr: u16) {
        let value = self.read(addr);
        self.add(value);
    }

    /// SBC is ADC of the one's complement.
    pub(super) fn sbc(&mut self, addr: u16) {
        let value = self.read(addr);
        self.add(value ^ 0xFF);
    }

    pub(super) fn cmp(&mut self, addr: u16) {
        let value = self.read(addr);
        self.compare(self.a, value);
    }

    pub(super) fn cpx(&mut self, addr: u16) {
        let value = self.read(addr);
        self.compare(self.x, value);
    }

    pub(super) fn cpy(&mut self, addr: u16) {
        let value = self.read(addr);
        self.compare(self.y, value);
    }

    // Increments and decrements

    pub(super) fn inc(&mut self, addr: u16) {
        self.modify(addr, Self::increment);
    }

    pub(super) fn dec(&mut self, addr: u16) {
        self.modify(addr, Self::decrement);
    }

    pub(super) fn inx(&mut self, _addr: u16) {
        self.x = self.increment(self.x);
    }

    pub(super) fn iny(&mut self, _addr: u16) {
        self.y = self.increment(self.y);
    }

    pub(super) fn dex(&mut self, _addr: u16) {
        self.x = self.decrement(self.x);
    }

    pub(super) fn dey(&mut self, _addr: u16) {
        self.y = self.decrement(self.y);
    }

    // Shifts

    pub(super) fn asl(&mut self, addr: u16) {
        self.modify(addr, Self::shift_left);
    }

    pub(super) fn lsr(&mut self, addr: u16) {
        self.modify(addr, Self::shift_right);
    }

    pub(super) fn rol(&mut self, addr: u16) {
        self.modify(addr, Self::rotate_left);
    }

    pub(super) fn ror(&mut self, addr: u16) {
        self.modify(addr, Self::rotate_right);
    }

    pub(super) fn asl_a(&mut self, _addr: u16) {
        self.a = self.shift_left(self.a);
    }

    pub(super) fn lsr_a(&mut self, _addr: u16) {
        self.a = self.shift_right(self.a);
    }

    pub(super) fn rol_a(&mut self, _addr: u16) {
        self.a = self.rotate_left(self.a);
    }

    pub(super) fn ror_a(&mut self, _addr: u16) {
        self.a = self.rotate_right(self.a);
    }

    // Jumps and calls

    pub(super) fn jmp(&mut self, addr: u16) {
        self.pc = addr;
    }

    /// Pushes the address of the last operand byte, then jumps.
    pub(super) fn jsr(&mut self, _addr: u16) {
        self.push16(self.pc.wrapping_add(1));
        self.pc = self.read16(self.pc);
    }

    pub(super) fn rts(&mut self, _addr: u16) {
        self.tick();
        self.pc = self.pop16();
        self.tick();
        self.pc = self.pc.wrapping_add(1);
    }

    pub(super) fn rti(&mut self, _addr: u16) {
        self.tick();
        let status = self.pop();
        self.status = (status & !FLAG_BREAK) | FLAG_UNUSED;
        self.pc = self.pop16();
    }

    /// Software interrupt: skips the padding byte, pushes P with B set, vectors through $FFFE.
    pub(super) fn brk(&mut self, addr: u16) {
        self.read(addr);
        self.push16(self.pc);
        self.push(self.status | FLAG_BREAK | FLAG_UNUSED);
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.pc = self.read16(IRQ_VECTOR);
    }

    // Branches

    pub(super) fn bcc(&mut self, addr: u16) {
        self.branch(addr, self.status & FLAG_CARRY == 0);
    }

    pub(super) fn bcs(&mut self, addr: u16) {
        self.branch(addr, self.status & FLAG_CARRY != 0);
    }

    pub(super) fn bne(&mut self, addr: u16) {
        self.branch(addr, self.status & FLAG_ZERO == 0);
    }

    pub(super) fn beq(&mut self, addr: u16) {
        self.branch(addr, self.status & FLAG_ZERO != 0);
    }

    pub(super) fn bpl(&mut self, addr: u16) {
        self.branch(addr, self.status & FLAG_NEGATIVE == 0);
    }

    pub(super) fn bmi(&mut self, addr: u16) {
        self.branch(addr, self.status & FLAG_NEGATIVE != 0);
    }

    pub(super) fn bvc(&mut self, addr: u16) {
        self.branch(addr, self.status & FLAG_OVERFLOW == 0);
    }

    pub(super) fn bvs(&mut self, addr: u16) {
        self.branch(addr, self.status & FLAG_OVERFLOW != 0);
    }

    // Flags

    pub(super) fn clc(&mut self, _addr: u16) {
        self.set_flag(FLAG_CARRY, false);
    }

    pub(super) fn sec(&mut self, _addr: u16) {
        self.set_flag(FLAG_CARRY, true);
    }

    pub(super) fn cli(&mut self, _addr: u16) {
        self.set_flag(FLAG_INTERRUPT_DISABLE, false);
    }

    pub(super) fn sei(&mut self, _addr: u16) {
        self.set_flag(FLAG_INTERRUPT_DISABLE, true);
    }

    pub(super) fn cld(&mut self, _addr: u16) {
        self.set_flag(FLAG_DECIMAL, false);
    }

    pub(super) fn sed(&mut self, _addr: u16) {
        self.set_flag(FLAG_DECIMAL, true);
    }

    pub(super) fn clv(&mut self, _addr: u16) {
        self.set_flag(FLAG_OVERFLOW, false);
    }

    // No-ops

    pub(super) fn nop(&mut self, _addr: u16) {}

    /// Unofficial NOPs with an operand still perform the read.
    pub(super) fn nop_read(&mut self, addr: u16) {
        self.read(addr);
    }

    /// Opcodes outside the supported set (JAM/KIL and unstable combinations) execute as a
    /// two-cycle no-op.
    pub(super) fn undefined(&mut self, _addr: u16) {
        let opcode = self.opcode as usize;
        if !self.warned[opcode] {
            self.warned[opcode] = true;
            log::warn!(
                "undefined opcode ${:02X} at ${:04X}, treated as NOP",
                opcode,
                self.pc.wrapping_sub(1)
            );
        }
    }

    // Undocumented

    /// LAX: LDA + LDX.
    pub(super) fn lax(&mut self, addr: u16) {
        self.a = self.read(addr);
        self.x = self.a;
        self.update_zero_and_negative_flags(self.a);
    }

    /// SAX: store A & X.
    pub(super) fn sax(&mut self, addr: u16) {
        self.write(addr, self.a & self.x);
    }

    /// DCP: DEC + CMP.
    pub(super) fn dcp(&mut self, addr: u16) {
        let value = self.modify(addr, |_, v| v.wrapping_sub(1));
        self.compare(self.a, value);
    }

    /// ISC: INC + SBC.
    pub(super) fn isc(&mut self, addr: u16) {
        let value = self.modify(addr, |_, v| v.wrapping_add(1));
        self.add(value ^ 0xFF);
    }

    /// SLO: ASL + ORA.
    pub(super) fn slo(&mut self, addr: u16) {
        let value = self.modify(addr, Self::shift_left);
        self.a |= value;
        self.update_zero_and_negative_flags(self.a);
    }

    /// RLA: ROL + AND.
    pub(super) fn rla(&mut self, addr: u16) {
        let value = self.modify(addr, Self::rotate_left);
        self.a &= value;
        self.update_zero_and_negative_flags(self.a);
    }

    /// SRE: LSR + EOR.
    pub(super) fn sre(&mut self, addr: u16) {
        let value = self.modify(addr, Self::shift_right);
        self.a ^= value;
        self.update_zero_and_negative_flags(self.a);
    }

    /// RRA: ROR + ADC (the carry out of the rotate feeds the add).
    pub(super) fn rra(&mut self, addr: u16) {
        let value = self.modify(addr, Self::rotate_right);
        self.add(value);
    }

    /// ANC: AND #imm, then C = N.
    pub(super) fn anc(&mut self, addr: u16) {
        self.and(addr);
        self.set_flag(FLAG_CARRY, self.a & 0x80 != 0);
    }

    /// ALR: AND #imm then LSR A.
    pub(super) fn alr(&mut self, addr: u16) {
        let value = self.read(addr);
        self.a = self.shift_right(self.a & value);
    }

    /// ARR: AND #imm then ROR A; C = bit 6, V = bit 6 ^ bit 5.
    pub(super) fn arr(&mut self, addr: u16) {
        let value = self.read(addr);
        let carry = (self.status & FLAG_CARRY) << 7;
        self.a = ((self.a & value) >> 1) | carry;
        self.update_zero_and_negative_flags(self.a);
        self.set_flag(FLAG_CARRY, self.a & 0x40 != 0);
        self.set_flag(FLAG_OVERFLOW, ((self.a >> 6) ^ (self.a >> 5)) & 1 != 0);
    }

    /// AXS (SBX): X = (A & X) - imm, carry as in CMP.
    pub(super) fn axs(&mut self, addr: u16) {
        let value = self.read(addr);
        let base = self.a & self.x;
        self.set_flag(FLAG_CARRY, base >= value);
        self.x = base.wrapping_sub(value);
        self.update_zero_and_negative_flags(self.x);
    }
}
