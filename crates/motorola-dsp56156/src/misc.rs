//! Control register logic, bit-field tests and processor control.

use emu_core::HarvardBus;

use crate::cpu::{Dsp56156, PowerState};
use crate::decode::Exec;
use crate::flags::{C, CCR, MR};
use crate::interrupts::Source;
use crate::operands::{self, ControlTarget, Reg};

/// Bit-field operation, from bits 12..8 of the second word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BitField {
    Change,
    Clear,
    Set,
    TestHigh,
    TestLow,
}

impl BitField {
    fn decode(op2: u16) -> Option<Self> {
        match op2 & 0x1F00 {
            0x1200 => Some(BitField::Change),
            0x0400 => Some(BitField::Clear),
            0x1800 => Some(BitField::Set),
            0x1000 => Some(BitField::TestHigh),
            0x0000 => Some(BitField::TestLow),
            _ => None,
        }
    }

    /// New value and carry for `value` under `mask`.
    fn apply(self, value: u16, mask: u16) -> (u16, bool) {
        let all_set = value & mask == mask;
        match self {
            BitField::Change => (value ^ mask, all_set),
            BitField::Clear => (value & !mask, all_set),
            BitField::Set => (value | mask, all_set),
            BitField::TestHigh => (value, all_set),
            BitField::TestLow => (value, value & mask == 0),
        }
    }

    fn writes(self) -> bool {
        matches!(self, BitField::Change | BitField::Clear | BitField::Set)
    }
}

/// Where a bit-field instruction operates.
#[derive(Debug, Clone, Copy)]
enum BitFieldTarget {
    Memory(u16),
    Register(Reg),
}

impl Dsp56156 {
    fn logic_immediate(&mut self, op: u16, or: bool) {
        let imm = op & 0xFF;
        let Some(target) = operands::ee(op >> 9) else {
            log::warn!("reserved EE field in ${op:04X} at P:${:04X}", self.ppc);
            return;
        };
        let regs = &mut self.regs;
        match (target, or) {
            (ControlTarget::Mr, false) => regs.sr &= (imm << 8) | CCR,
            (ControlTarget::Mr, true) => regs.sr |= imm << 8,
            (ControlTarget::Ccr, false) => regs.sr &= MR | imm,
            (ControlTarget::Ccr, true) => regs.sr |= imm,
            (ControlTarget::Omr, false) => regs.omr &= imm as u8,
            (ControlTarget::Omr, true) => regs.omr |= imm as u8,
        }
    }

    /// ANDI `0001 1EE0 iiii iiii`.
    pub(crate) fn op_andi(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        self.logic_immediate(op, false);
        Exec::next(1, 2)
    }

    /// ORI `0001 1EE1 iiii iiii`.
    pub(crate) fn op_ori(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        self.logic_immediate(op, true);
        Exec::next(1, 2)
    }

    // ================================================================
    // Bit-field instructions
    //
    // 0001 0100 ..pp pppp | BBB o oooo iiii iiii   X:<<pp
    // 0001 0100 ..1- --RR | BBB o oooo iiii iiii   X:(Rn)
    // 0001 0100 ..0D DDDD | BBB o oooo iiii iiii   register
    //
    // BBB places the 8-bit mask: 100 bits 15..8, 010 bits 11..4, 001 bits 7..0.
    // ================================================================

    fn bitfield_target(&self, op: u16) -> Option<BitFieldTarget> {
        if op & 0x0040 != 0 {
            return Some(BitFieldTarget::Memory(operands::high_peripheral(op)));
        }
        if op & 0x0020 != 0 {
            return Some(BitFieldTarget::Memory(self.regs.r[usize::from(op & 3)]));
        }
        let reg = match operands::ddddd(op)? {
            Reg::A => Reg::A1,
            Reg::B => Reg::B1,
            reg => reg,
        };
        Some(BitFieldTarget::Register(reg))
    }

    pub(crate) fn op_bitfield(&mut self, bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        let Some(kind) = BitField::decode(op2) else {
            log::warn!("unknown bit-field operation ${op2:04X} at P:${:04X}", self.ppc);
            return Exec::next(2, 4);
        };
        let Some(shift) = operands::bbb(op2 >> 13) else {
            log::warn!("invalid bank selector in ${op2:04X} at P:${:04X}", self.ppc);
            return Exec::next(2, 4);
        };
        let mask = (op2 & 0xFF) << shift;

        let Some(target) = self.bitfield_target(op) else {
            log::warn!("reserved DDDDD register in ${op:04X} at P:${:04X}", self.ppc);
            return Exec::next(2, 4);
        };
        let value = match target {
            BitFieldTarget::Memory(address) => self.read_x(bus, address),
            BitFieldTarget::Register(reg) => self.read_reg(reg) as u16,
        };

        let (result, carry) = kind.apply(value, mask);
        if kind.writes() {
            match target {
                BitFieldTarget::Memory(address) => self.write_x(bus, address, result),
                BitFieldTarget::Register(reg) => self.write_reg(reg, result.into()),
            }
        }
        if carry {
            self.regs.sr |= C;
        } else {
            self.regs.sr &= !C;
        }
        Exec::next(2, 4)
    }

    // ================================================================
    // Processor control
    // ================================================================

    pub(crate) fn op_nop(&mut self, _bus: &mut dyn HarvardBus, _op: u16, _op2: u16) -> Exec {
        Exec::next(1, 2)
    }

    pub(crate) fn op_illegal(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        log::debug!("ILLEGAL (${op:04X}) at P:${:04X}", self.ppc);
        self.interrupts.raise(Source::IllegalInstruction);
        Exec::next(1, 8)
    }

    pub(crate) fn op_swi(&mut self, _bus: &mut dyn HarvardBus, _op: u16, _op2: u16) -> Exec {
        self.interrupts.raise(Source::SoftwareInterrupt);
        Exec::next(1, 8)
    }

    /// Sleep until an interrupt is serviced.
    pub(crate) fn op_wait(&mut self, _bus: &mut dyn HarvardBus, _op: u16, _op2: u16) -> Exec {
        self.power = PowerState::Wait;
        Exec::next(1, 10)
    }

    pub(crate) fn op_stop(&mut self, _bus: &mut dyn HarvardBus, _op: u16, _op2: u16) -> Exec {
        self.power = PowerState::Stop;
        Exec::next(1, 10)
    }
}
