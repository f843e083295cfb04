//! Opcode dispatch table: addressing mode and operation for each of the 256 opcodes.

use crate::{bus::Bus, cpu::cpu::Cpu};

/// Resolves the effective address, spending the operand-fetch cycles.
pub type Mode<B> = fn(&mut Cpu<B>) -> u16;
/// Executes the instruction against the effective address.
pub type Op<B> = fn(&mut Cpu<B>, u16);

pub struct Instruction<B: Bus> {
    pub mnemonic: &'static str,
    pub mode: Mode<B>,
    pub op: Op<B>,
}

// Derived impls would require `B: Clone`.
impl<B: Bus> Clone for Instruction<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Bus> Copy for Instruction<B> {}

macro_rules! opcodes {
    ($table:ident; $($code:literal => $mnemonic:literal, $mode:ident, $op:ident;)*) => {
        $(
            $table[$code] = Instruction {
                mnemonic: $mnemonic,
                mode: Cpu::<B>::$mode,
                op: Cpu::<B>::$op,
            };
        )*
    };
}

pub fn build<B: Bus>() -> Box<[Instruction<B>; 256]> {
    let mut t = Box::new(
        [Instruction {
            mnemonic: "???",
            mode: Cpu::<B>::imp,
            op: Cpu::<B>::undefined,
        }; 256],
    );

    opcodes!(t;
        // Loads
        0xA9 => "LDA", imm, lda;
        0xA5 => "LDA", zp, lda;
        0xB5 => "LDA", zpx, lda;
        0xAD => "LDA", abs, lda;
        0xBD => "LDA", abx, lda;
        0xB9 => "LDA", aby, lda;
        0xA1 => "LDA", izx, lda;
        0xB1 => "LDA", izy, lda;
        0xA2 => "LDX", imm, ldx;
        0xA6 => "LDX", zp, ldx;
        0xB6 => "LDX", zpy, ldx;
        0xAE => "LDX", abs, ldx;
        0xBE => "LDX", aby, ldx;
        0xA0 => "LDY", imm, ldy;
        0xA4 => "LDY", zp, ldy;
        0xB4 => "LDY", zpx, ldy;
        0xAC => "LDY", abs, ldy;
        0xBC => "LDY", abx, ldy;

        // Stores
        0x85 => "STA", zp, sta;
        0x95 => "STA", zpx, sta;
        0x8D => "STA", abs, sta;
        0x9D => "STA", abx_w, sta;
        0x99 => "STA", aby_w, sta;
        0x81 => "STA", izx, sta;
        0x91 => "STA", izy_w, sta;
        0x86 => "STX", zp, stx;
        0x96 => "STX", zpy, stx;
        0x8E => "STX", abs, stx;
        0x84 => "STY", zp, sty;
        0x94 => "STY", zpx, sty;
        0x8C => "STY", abs, sty;

        // Transfers and stack
        0xAA => "TAX", imp, tax;
        0xA8 => "TAY", imp, tay;
        0x8A => "TXA", imp, txa;
        0x98 => "TYA", imp, tya;
        0xBA => "TSX", imp, tsx;
        0x9A => "TXS", imp, txs;
        0x48 => "PHA", imp, pha;
        0x08 => "PHP", imp, php;
        0x68 => "PLA", imp, pla;
        0x28 => "PLP", imp, plp;

        // Logic
        0x29 => "AND", imm, and;
        0x25 => "AND", zp, and;
        0x35 => "AND", zpx, and;
        0x2D => "AND", abs, and;
        0x3D => "AND", abx, and;
        0x39 => "AND", aby, and;
        0x21 => "AND", izx, and;
        0x31 => "AND", izy, and;
        0x09 => "ORA", imm, ora;
        0x05 => "ORA", zp, ora;
        0x15 => "ORA", zpx, ora;
        0x0D => "ORA", abs, ora;
        0x1D => "ORA", abx, ora;
        0x19 => "ORA", aby, ora;
        0x01 => "ORA", izx, ora;
        0x11 => "ORA", izy, ora;
        0x49 => "EOR", imm, eor;
        0x45 => "EOR", zp, eor;
        0x55 => "EOR", zpx, eor;
        0x4D => "EOR", abs, eor;
        0x5D => "EOR", abx, eor;
        0x59 => "EOR", aby, eor;
        0x41 => "EOR", izx, eor;
        0x51 => "EOR", izy, eor;
        0x24 => "BIT", zp, bit;
        0x2C => "BIT", abs, bit;

        // Arithmetic
        0x69 => "ADC", imm, adc;
        0x65 => "ADC", zp, adc;
        0x75 => "ADC", zpx, adc;
        0x6D => "ADC", abs, adc;
        0x7D => "ADC", abx, adc;
        0x79 => "ADC", aby, adc;
        0x61 => "ADC", izx, adc;
        0x71 => "ADC", izy, adc;
        0xE9 => "SBC", imm, sbc;
        0xE5 => "SBC", zp, sbc;
        0xF5 => "SBC", zpx, sbc;
        0xED => "SBC", abs, sbc;
        0xFD => "SBC", abx, sbc;
        0xF9 => "SBC", aby, sbc;
        0xE1 => "SBC", izx, sbc;
        0xF1 => "SBC", izy, sbc;
        0xC9 => "CMP", imm, cmp;
        0xC5 => "CMP", zp, cmp;
        0xD5 => "CMP", zpx, cmp;
        0xCD => "CMP", abs, cmp;
        0xDD => "CMP", abx, cmp;
        0xD9 => "CMP", aby, cmp;
        0xC1 => "CMP", izx, cmp;
        0xD1 => "CMP", izy, cmp;
        0xE0 => "CPX", imm, cpx;
        0xE4 => "CPX", zp, cpx;
        0xEC => "CPX", abs, cpx;
        0xC0 => "CPY", imm, cpy;
        0xC4 => "CPY", zp, cpy;
        0xCC => "CPY", abs, cpy;

        // Increments and decrements
        0xE6 => "INC", zp, inc;
        0xF6 => "INC", zpx, inc;
        0xEE => "INC", abs, inc;
        0xFE => "INC", abx_w, inc;
        0xC6 => "DEC", zp, dec;
        0xD6 => "DEC", zpx, dec;
        0xCE => "DEC", abs, dec;
        0xDE => "DEC", abx_w, dec;
        0xE8 => "INX", imp, inx;
        0xC8 => "INY", imp, iny;
        0xCA => "DEX", imp, dex;
        0x88 => "DEY", imp, dey;

        // Shifts
        0x0A => "ASL", imp, asl_a;
        0x06 => "ASL", zp, asl;
        0x16 => "ASL", zpx, asl;
        0x0E => "ASL", abs, asl;
        0x1E => "ASL", abx_w, asl;
        0x4A => "LSR", imp, lsr_a;
        0x46 => "LSR", zp, lsr;
        0x56 => "LSR", zpx, lsr;
        0x4E => "LSR", abs, lsr;
        0x5E => "LSR", abx_w, lsr;
        0x2A => "ROL", imp, rol_a;
        0x26 => "ROL", zp, rol;
        0x36 => "ROL", zpx, rol;
        0x2E => "ROL", abs, rol;
        0x3E => "ROL", abx_w, rol;
        0x6A => "ROR", imp, ror_a;
        0x66 => "ROR", zp, ror;
        0x76 => "ROR", zpx, ror;
        0x6E => "ROR", abs, ror;
        0x7E => "ROR", abx_w, ror;

        // Control flow
        0x4C => "JMP", abs, jmp;
        0x6C => "JMP", ind, jmp;
        0x20 => "JSR", imp, jsr;
        0x60 => "RTS", imp, rts;
        0x40 => "RTI", imp, rti;
        0x00 => "BRK", imm, brk;
        0x90 => "BCC", imm, bcc;
        0xB0 => "BCS", imm, bcs;
        0xD0 => "BNE", imm, bne;
        0xF0 => "BEQ", imm, beq;
        0x10 => "BPL", imm, bpl;
        0x30 => "BMI", imm, bmi;
        0x50 => "BVC", imm, bvc;
        0x70 => "BVS", imm, bvs;

        // Flags
        0x18 => "CLC", imp, clc;
        0x38 => "SEC", imp, sec;
        0x58 => "CLI", imp, cli;
        0x78 => "SEI", imp, sei;
        0xD8 => "CLD", imp, cld;
        0xF8 => "SED", imp, sed;
        0xB8 => "CLV", imp, clv;

        0xEA => "NOP", imp, nop;

        // Undocumented NOPs
        0x1A => "NOP", imp, nop;
        0x3A => "NOP", imp, nop;
        0x5A => "NOP", imp, nop;
        0x7A => "NOP", imp, nop;
        0xDA => "NOP", imp, nop;
        0xFA => "NOP", imp, nop;
        0x80 => "NOP", imm, nop_read;
        0x82 => "NOP", imm, nop_read;
        0x89 => "NOP", imm, nop_read;
        0xC2 => "NOP", imm, nop_read;
        0xE2 => "NOP", imm, nop_read;
        0x04 => "NOP", zp, nop_read;
        0x44 => "NOP", zp, nop_read;
        0x64 => "NOP", zp, nop_read;
        0x14 => "NOP", zpx, nop_read;
        0x34 => "NOP", zpx, nop_read;
        0x54 => "NOP", zpx, nop_read;
        0x74 => "NOP", zpx, nop_read;
        0xD4 => "NOP", zpx, nop_read;
        0xF4 => "NOP", zpx, nop_read;
        0x0C => "NOP", abs, nop_read;
        0x1C => "NOP", abx, nop_read;
        0x3C => "NOP", abx, nop_read;
        0x5C => "NOP", abx, nop_read;
        0x7C => "NOP", abx, nop_read;
        0xDC => "NOP", abx, nop_read;
        0xFC => "NOP", abx, nop_read;

        // Undocumented loads, stores and immediates
        0xA7 => "LAX", zp, lax;
        0xB7 => "LAX", zpy, lax;
        0xAF => "LAX", abs, lax;
        0xBF => "LAX", aby, lax;
        0xA3 => "LAX", izx, lax;
        0xB3 => "LAX", izy, lax;
        0x87 => "SAX", zp, sax;
        0x97 => "SAX", zpy, sax;
        0x8F => "SAX", abs, sax;
        0x83 => "SAX", izx, sax;
        0xEB => "SBC", imm, sbc;
        0x0B => "ANC", imm, anc;
        0x2B => "ANC", imm, anc;
        0x4B => "ALR", imm, alr;
        0x6B => "ARR", imm, arr;
        0xCB => "AXS", imm, axs;

        // Undocumented read-modify-write combinations
        0xC7 => "DCP", zp, dcp;
        0xD7 => "DCP", zpx, dcp;
        0xCF => "DCP", abs, dcp;
        0xDF => "DCP", abx_w, dcp;
        0xDB => "DCP", aby_w, dcp;
        0xC3 => "DCP", izx, dcp;
        0xD3 => "DCP", izy_w, dcp;
        0xE7 => "ISC", zp, isc;
        0xF7 => "ISC", zpx, isc;
        0xEF => "ISC", abs, isc;
        0xFF => "ISC", abx_w, isc;
        0xFB => "ISC", aby_w, isc;
        0xE3 => "ISC", izx, isc;
        0xF3 => "ISC", izy_w, isc;
        0x07 => "SLO", zp, slo;
        0x17 => "SLO", zpx, slo;
        0x0F => "SLO", abs, slo;
        0x1F => "SLO", abx_w, slo;
        0x1B => "SLO", aby_w, slo;
        0x03 => "SLO", izx, slo;
        0x13 => "SLO", izy_w, slo;
        0x27 => "RLA", zp, rla;
        0x37 => "RLA", zpx, rla;
        0x2F => "RLA", abs, rla;
        0x3F => "RLA", abx_w, rla;
        0x3B => "RLA", aby_w, rla;
        0x23 => "RLA", izx, rla;
        0x33 => "RLA", izy_w, rla;
        0x47 => "SRE", zp, sre;
        0x57 => "SRE", zpx, sre;
        0x4F => "SRE", abs, sre;
        0x5F => "SRE", abx_w, sre;
        0x5B => "SRE", aby_w, sre;
        0x43 => "SRE", izx, sre;
        0x53 => "SRE", izy_w, sre;
        0x67 => "RRA", zp, rra;
        0x77 => "RRA", zpx, rra;
        0x6F => "RRA", abs, rra;
        0x7F => "RRA", abx_w, rra;
        0x7B => "RRA", aby_w, rra;
        0x63 => "RRA", izx, rra;
        0x73 => "RRA", izy_w, rra;
    );

    t
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flat;

    impl Bus for Flat {
        fn read(&mut self, _addr: u16) -> u8 {
            0
        }

        fn write(&mut self, _addr: u16, _data: u8) {}
    }

    #[test]
    fn jam_and_unstable_opcodes_stay_undefined() {
        let t = build::<Flat>();
        for code in [0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2] {
            assert_eq!(t[code].mnemonic, "???", "opcode {:02X}", code);
        }
        for code in [0x8B, 0x93, 0x9B, 0x9C, 0x9E, 0x9F, 0xAB, 0xBB] {
            assert_eq!(t[code].mnemonic, "???", "opcode {:02X}", code);
        }
    }

    #[test]
    fn every_other_opcode_is_defined() {
        let t = build::<Flat>();
        let undefined = t.iter().filter(|i| i.mnemonic == "???").count();
        assert_eq!(undefined, 20);
    }
}
