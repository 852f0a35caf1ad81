//! Operand resolution: register file and bus access.
//!
//! Every data transfer goes through [`Dsp56156::transfer`], which reads the
//! source at its own width and converts it to the destination's:
//!
//! - accumulator to 16 bits: limited (saturated, setting L)
//! - 16 bits to accumulator: sign-extended into bits 39..16, A0 cleared
//! - X/Y to accumulator: sign-extended from bit 31
//! - A2/B2 to 16 bits: sign-extended; other 8-bit registers zero-extend

use emu_core::HarvardBus;

use crate::alu::{self, AluDest};
use crate::cpu::Dsp56156;
use crate::flags::L;
use crate::operands::{Location, Operand, Reg, Width};
use crate::registers::Acc;

impl Dsp56156 {
    // === Memory ===

    pub(crate) fn read_x(&mut self, bus: &mut dyn HarvardBus, address: u16) -> u16 {
        bus.read_data(u32::from(address) << 1)
    }

    pub(crate) fn write_x(&mut self, bus: &mut dyn HarvardBus, address: u16, value: u16) {
        bus.write_data(u32::from(address) << 1, value);
    }

    pub(crate) fn read_p(&mut self, bus: &mut dyn HarvardBus, address: u16) -> u16 {
        bus.read_program(u32::from(address) << 1)
    }

    pub(crate) fn write_p(&mut self, bus: &mut dyn HarvardBus, address: u16, value: u16) {
        bus.write_program(u32::from(address) << 1, value);
    }

    // === Registers ===

    /// Read a register at its natural width. Reading SSH pops the stack.
    pub(crate) fn read_reg(&mut self, reg: Reg) -> u64 {
        let regs = &self.regs;
        match reg {
            Reg::X0 => regs.x0().into(),
            Reg::X1 => regs.x1().into(),
            Reg::Y0 => regs.y0().into(),
            Reg::Y1 => regs.y1().into(),
            Reg::X => regs.x.into(),
            Reg::Y => regs.y.into(),
            Reg::A => regs.acc(Acc::A),
            Reg::B => regs.acc(Acc::B),
            Reg::A0 => regs.acc0(Acc::A).into(),
            Reg::B0 => regs.acc0(Acc::B).into(),
            Reg::A1 => regs.acc1(Acc::A).into(),
            Reg::B1 => regs.acc1(Acc::B).into(),
            Reg::A2 => regs.acc2(Acc::A).into(),
            Reg::B2 => regs.acc2(Acc::B).into(),
            Reg::R(i) => regs.r[usize::from(i)].into(),
            Reg::N(i) => regs.n[usize::from(i)].into(),
            Reg::M(i) => regs.m[usize::from(i)].into(),
            Reg::Sr => regs.sr.into(),
            Reg::Omr => regs.omr.into(),
            Reg::Sp => regs.sp.into(),
            Reg::Ssl => regs.ssl().into(),
            Reg::La => regs.la.into(),
            Reg::Lc => regs.lc.into(),
            Reg::Ssh => self.pop_stack().high.into(),
        }
    }

    /// Write a register at its natural width. Writing SSH pushes the stack.
    pub(crate) fn write_reg(&mut self, reg: Reg, value: u64) {
        let regs = &mut self.regs;
        match reg {
            Reg::X0 => regs.set_x0(value as u16),
            Reg::X1 => regs.set_x1(value as u16),
            Reg::Y0 => regs.set_y0(value as u16),
            Reg::Y1 => regs.set_y1(value as u16),
            Reg::X => regs.x = value as u32,
            Reg::Y => regs.y = value as u32,
            Reg::A => regs.set_acc(Acc::A, value),
            Reg::B => regs.set_acc(Acc::B, value),
            Reg::A0 => regs.set_acc0(Acc::A, value as u16),
            Reg::B0 => regs.set_acc0(Acc::B, value as u16),
            Reg::A1 => regs.set_acc1(Acc::A, value as u16),
            Reg::B1 => regs.set_acc1(Acc::B, value as u16),
            Reg::A2 => regs.set_acc2(Acc::A, value as u8),
            Reg::B2 => regs.set_acc2(Acc::B, value as u8),
            Reg::R(i) => regs.r[usize::from(i)] = value as u16,
            Reg::N(i) => regs.n[usize::from(i)] = value as u16,
            Reg::M(i) => regs.m[usize::from(i)] = value as u16,
            Reg::Sr => regs.sr = value as u16,
            Reg::Omr => regs.omr = value as u8,
            Reg::Sp => regs.sp = value as u8 & 0x3F,
            Reg::Ssl => {
                let i = regs.stack_index();
                regs.ss[i].low = value as u16;
            }
            Reg::La => regs.la = value as u16,
            Reg::Lc => regs.lc = value as u16,
            Reg::Ssh => self.push_high(value as u16),
        }
    }

    /// A data ALU input in accumulator format.
    pub(crate) fn alu_source(&mut self, reg: Reg) -> u64 {
        let raw = self.read_reg(reg);
        match reg.width() {
            Width::LongWord => raw,
            Width::DoubleWord => alu::long_to_acc(raw as u32),
            Width::Word | Width::Byte => alu::word_to_acc(raw as u16),
        }
    }

    /// A 16-bit multiplier or logic input.
    pub(crate) fn source_word(&mut self, reg: Reg) -> u16 {
        self.read_reg(reg) as u16
    }

    // === Operands ===

    /// Read `src` converted to `target` width.
    ///
    /// When `alias` names the accumulator `src` belongs to, the value it held
    /// before the data ALU operation of this instruction is used instead.
    pub(crate) fn read_as(
        &mut self,
        bus: &mut dyn HarvardBus,
        src: Operand,
        target: Width,
        alias: Option<AluDest>,
    ) -> u64 {
        let raw = match src.location() {
            Location::Register(reg) => match alias.and_then(|dest| dest.view(reg)) {
                Some(prior) => prior,
                None => self.read_reg(reg),
            },
            Location::XMemory(address) => self.read_x(bus, address).into(),
            Location::PMemory(address) => self.read_p(bus, address).into(),
            Location::Immediate(value) => value.into(),
        };
        let sign_extended_byte = matches!(src.register(), Some(Reg::A2 | Reg::B2));
        self.convert(raw, src.width(), target, sign_extended_byte)
    }

    fn convert(&mut self, raw: u64, from: Width, to: Width, signed_byte: bool) -> u64 {
        match (from, to) {
            (Width::LongWord, Width::LongWord)
            | (Width::DoubleWord, Width::DoubleWord)
            | (Width::Word, Width::Word)
            | (Width::Byte, Width::Byte) => raw,
            (Width::LongWord, Width::Word | Width::Byte) => {
                let (word, limited) = alu::limit(raw);
                if limited {
                    self.regs.sr |= L;
                }
                let word = u64::from(word);
                if to == Width::Byte { word & 0xFF } else { word }
            }
            (Width::LongWord, Width::DoubleWord) => raw & 0xFFFF_FFFF,
            (Width::DoubleWord, Width::LongWord) => alu::long_to_acc(raw as u32),
            (Width::DoubleWord, Width::Word) => raw >> 16,
            (Width::DoubleWord, Width::Byte) => (raw >> 16) & 0xFF,
            (Width::Word, Width::LongWord) => alu::word_to_acc(raw as u16),
            (Width::Word, Width::DoubleWord) => (raw & 0xFFFF) << 16,
            (Width::Word, Width::Byte) => raw & 0xFF,
            (Width::Byte, _) => {
                let word = if signed_byte {
                    u64::from(i16::from(raw as u8 as i8) as u16)
                } else {
                    raw
                };
                self.convert(word, Width::Word, to, false)
            }
        }
    }

    /// Write a value already at `dst`'s width.
    pub(crate) fn write_operand(&mut self, bus: &mut dyn HarvardBus, dst: Operand, value: u64) {
        match dst.location() {
            Location::Register(reg) => self.write_reg(reg, value),
            Location::XMemory(address) => self.write_x(bus, address, value as u16),
            Location::PMemory(address) => self.write_p(bus, address, value as u16),
            Location::Immediate(_) => {
                log::warn!("write to immediate operand dropped at P:${:04X}", self.ppc);
            }
        }
    }

    /// Move `src` to `dst`, converting widths.
    pub(crate) fn transfer(
        &mut self,
        bus: &mut dyn HarvardBus,
        src: Operand,
        dst: Operand,
        alias: Option<AluDest>,
    ) {
        let value = self.read_as(bus, src, dst.width(), alias);
        self.write_operand(bus, dst, value);
    }
}
