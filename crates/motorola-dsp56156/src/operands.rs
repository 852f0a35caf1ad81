//! Operand decode tables.
//!
//! Each table maps an instruction bit field to the register or memory
//! location it names. Nothing here touches processor state; the handlers in
//! `ea.rs` resolve the operands against the register file and the bus.

use crate::registers::Acc;

/// A register as named by an instruction field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reg {
    X0,
    X1,
    Y0,
    Y1,
    X,
    Y,
    A,
    B,
    A0,
    B0,
    A1,
    B1,
    A2,
    B2,
    R(u8),
    N(u8),
    M(u8),
    Sr,
    Omr,
    Sp,
    Ssh,
    Ssl,
    La,
    Lc,
}

/// Operand width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Width {
    Byte,
    Word,
    DoubleWord,
    LongWord,
}

/// Where an operand lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Register(Reg),
    /// X data memory, word address.
    XMemory(u16),
    /// Program memory, word address.
    PMemory(u16),
    /// Immediate word. Writes to it are dropped.
    Immediate(u16),
}

/// A resolved operand: a location tagged with its width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operand {
    Byte(Location),
    Word(Location),
    DoubleWord(Location),
    LongWord(Location),
}

impl Operand {
    pub(crate) fn location(self) -> Location {
        match self {
            Operand::Byte(l) | Operand::Word(l) | Operand::DoubleWord(l) | Operand::LongWord(l) => l,
        }
    }

    pub(crate) fn width(self) -> Width {
        match self {
            Operand::Byte(_) => Width::Byte,
            Operand::Word(_) => Width::Word,
            Operand::DoubleWord(_) => Width::DoubleWord,
            Operand::LongWord(_) => Width::LongWord,
        }
    }

    pub(crate) fn x_memory(address: u16) -> Self {
        Operand::Word(Location::XMemory(address))
    }

    pub(crate) fn p_memory(address: u16) -> Self {
        Operand::Word(Location::PMemory(address))
    }

    pub(crate) fn immediate(value: u16) -> Self {
        Operand::Word(Location::Immediate(value))
    }

    pub(crate) fn register(self) -> Option<Reg> {
        match self.location() {
            Location::Register(r) => Some(r),
            _ => None,
        }
    }
}

impl From<Reg> for Operand {
    fn from(reg: Reg) -> Self {
        let loc = Location::Register(reg);
        match reg.width() {
            Width::Byte => Operand::Byte(loc),
            Width::Word => Operand::Word(loc),
            Width::DoubleWord => Operand::DoubleWord(loc),
            Width::LongWord => Operand::LongWord(loc),
        }
    }
}

impl Reg {
    pub(crate) fn width(self) -> Width {
        match self {
            Reg::A | Reg::B => Width::LongWord,
            Reg::X | Reg::Y => Width::DoubleWord,
            Reg::A2 | Reg::B2 | Reg::Omr | Reg::Sp => Width::Byte,
            _ => Width::Word,
        }
    }

    pub(crate) fn acc(acc: Acc) -> Self {
        match acc {
            Acc::A => Reg::A,
            Acc::B => Reg::B,
        }
    }

    /// The accumulator this register is, or is part of.
    pub(crate) fn accumulator(self) -> Option<Acc> {
        match self {
            Reg::A | Reg::A0 | Reg::A1 | Reg::A2 => Some(Acc::A),
            Reg::B | Reg::B0 | Reg::B1 | Reg::B2 => Some(Acc::B),
            _ => None,
        }
    }
}

/// Sign-extend an 8-bit field to 16 bits.
pub(crate) fn sign_extend_8(value: u16) -> u16 {
    i16::from(value as u8 as i8) as u16
}

/// Sign-extend a 6-bit field to 16 bits.
pub(crate) fn sign_extend_6(value: u16) -> u16 {
    ((((value & 0x3F) << 10) as i16) >> 10) as u16
}

/// `pppppp` high peripheral address.
pub(crate) fn high_peripheral(field: u16) -> u16 {
    0xFFC0 | (field & 0x3F)
}

/// `ppppp` low peripheral address.
pub(crate) fn low_peripheral(field: u16) -> u16 {
    0xFFE0 | (field & 0x1F)
}

/// `DDDDD`: every programmer-visible register.
pub(crate) fn ddddd(field: u16) -> Option<Reg> {
    let reg = match field & 0x1F {
        0x00 => Reg::X0,
        0x01 => Reg::Y0,
        0x02 => Reg::X1,
        0x03 => Reg::Y1,
        0x04 => Reg::A,
        0x05 => Reg::B,
        0x06 => Reg::A0,
        0x07 => Reg::B0,
        0x08 => Reg::Lc,
        0x09 => Reg::Sr,
        0x0A => Reg::Omr,
        0x0B => Reg::Sp,
        0x0C => Reg::A1,
        0x0D => Reg::B1,
        0x0E => Reg::A2,
        0x0F => Reg::B2,
        n @ 0x10..=0x13 => Reg::R((n - 0x10) as u8),
        n @ 0x14..=0x17 => Reg::M((n - 0x14) as u8),
        0x18 => Reg::Ssh,
        0x19 => Reg::Ssl,
        0x1A => Reg::La,
        0x1B => return None,
        n => Reg::N((n - 0x1C) as u8),
    };
    Some(reg)
}

/// `DD` / `JJ`: the four 16-bit input registers.
pub(crate) fn dd(field: u16) -> Reg {
    match field & 3 {
        0 => Reg::X0,
        1 => Reg::Y0,
        2 => Reg::X1,
        _ => Reg::Y1,
    }
}

/// `HH`.
pub(crate) fn hh(field: u16) -> Reg {
    match field & 3 {
        0 => Reg::X0,
        1 => Reg::Y0,
        2 => Reg::A,
        _ => Reg::B,
    }
}

/// `HHH`.
pub(crate) fn hhh(field: u16) -> Reg {
    match field & 7 {
        0 => Reg::X0,
        1 => Reg::Y0,
        2 => Reg::X1,
        3 => Reg::Y1,
        4 => Reg::A,
        5 => Reg::B,
        6 => Reg::A0,
        _ => Reg::B0,
    }
}

/// `JJJ` source for an operation into `F`. Code 001 is reserved.
pub(crate) fn jjj(field: u16, f: Acc) -> Option<Reg> {
    match field & 7 {
        0 => Some(Reg::acc(f.other())),
        1 => None,
        2 => Some(Reg::X),
        3 => Some(Reg::Y),
        n => Some(dd(n - 4)),
    }
}

/// `J`: X or Y.
pub(crate) fn j(field: u16) -> Reg {
    if field & 1 == 0 { Reg::X } else { Reg::Y }
}

/// `QQQ` multiplier inputs.
pub(crate) fn qqq(field: u16) -> (Reg, Reg) {
    match field & 7 {
        0 => (Reg::X0, Reg::X0),
        1 => (Reg::X1, Reg::X0),
        2 => (Reg::A1, Reg::Y0),
        3 => (Reg::B1, Reg::X0),
        4 => (Reg::Y0, Reg::X0),
        5 => (Reg::Y1, Reg::X0),
        6 => (Reg::Y0, Reg::X1),
        _ => (Reg::Y1, Reg::X1),
    }
}

/// `QQ` multiplier inputs of the dual-read forms.
pub(crate) fn qq(field: u16) -> (Reg, Reg) {
    match field & 3 {
        0 => (Reg::X0, Reg::Y0),
        1 => (Reg::X0, Reg::Y1),
        2 => (Reg::X1, Reg::Y0),
        _ => (Reg::X1, Reg::Y1),
    }
}

/// `QQ` multiplier inputs of DMAC and the mixed-sign multiplies.
pub(crate) fn qq_mixed(field: u16) -> (Reg, Reg) {
    match field & 3 {
        0 => (Reg::Y0, Reg::X0),
        1 => (Reg::Y0, Reg::X1),
        2 => (Reg::Y1, Reg::X0),
        _ => (Reg::Y1, Reg::X1),
    }
}

/// `KKK`: the two destinations of a dual X memory read.
pub(crate) fn kkk(field: u16) -> (Reg, Reg) {
    match field & 7 {
        0 => (Reg::X0, Reg::X1),
        1 => (Reg::Y0, Reg::X1),
        2 => (Reg::X1, Reg::X0),
        3 => (Reg::Y1, Reg::X0),
        4 => (Reg::X0, Reg::Y1),
        5 => (Reg::Y0, Reg::X0),
        6 => (Reg::X1, Reg::Y0),
        _ => (Reg::Y1, Reg::X1),
    }
}

/// Decoded `IIII` register-to-register move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegisterMove {
    Transfer(Reg, Reg),
    Nothing,
    Reserved,
}

/// `IIII`, relative to the ALU destination `F`.
pub(crate) fn iiii(field: u16, f: Acc) -> RegisterMove {
    let other = Reg::acc(f.other());
    let (src, dst) = match field & 0xF {
        n @ 0..=3 => (dd(n), other),
        0x4 => (Reg::A, Reg::X0),
        0x5 => (Reg::B, Reg::Y0),
        0x6 => (Reg::A0, Reg::X0),
        0x7 => (Reg::B0, Reg::Y0),
        0x8 => (Reg::acc(f), other),
        0xA => return RegisterMove::Nothing,
        0x9 | 0xB => return RegisterMove::Reserved,
        0xC => (Reg::A, Reg::X1),
        0xD => (Reg::B, Reg::Y1),
        0xE => (Reg::A0, Reg::X1),
        _ => (Reg::B0, Reg::Y1),
    };
    RegisterMove::Transfer(src, dst)
}

/// `h0h` source of Tcc.
pub(crate) fn h0h(field: u16) -> Option<Reg> {
    match field & 7 {
        0 => Some(Reg::A),
        1 => Some(Reg::B),
        4 => Some(Reg::X0),
        5 => Some(Reg::Y0),
        _ => None,
    }
}

/// Add or subtract, for the `uuuu` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddSub {
    Add,
    Sub,
}

/// `uuuu` of the dual-read ADD/SUB form: bit 4 and bits 2..0 of the opcode.
pub(crate) fn uuuu(op: u16, f: Acc) -> Option<(AddSub, Reg)> {
    let code = ((op >> 1) & 0x8) | (op & 0x7);
    match code {
        0x0..=0x3 => Some((AddSub::Add, dd(code))),
        0x4..=0x7 => Some((AddSub::Sub, dd(code - 4))),
        0xC => Some((AddSub::Add, Reg::acc(f.other()))),
        0xD => Some((AddSub::Sub, Reg::acc(f.other()))),
        _ => None,
    }
}

/// `BBB` bank selector of the bit-field instructions, as a shift count.
pub(crate) fn bbb(field: u16) -> Option<u32> {
    match field & 7 {
        0b100 => Some(8),
        0b010 => Some(4),
        0b001 => Some(0),
        _ => None,
    }
}

/// `EE` target of ANDI/ORI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlTarget {
    Mr,
    Ccr,
    Omr,
}

pub(crate) fn ee(field: u16) -> Option<ControlTarget> {
    match field & 3 {
        1 => Some(ControlTarget::Mr),
        2 => Some(ControlTarget::Ccr),
        3 => Some(ControlTarget::Omr),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddddd_covers_all_but_the_reserved_code() {
        assert_eq!(ddddd(0x04), Some(Reg::A));
        assert_eq!(ddddd(0x0A), Some(Reg::Omr));
        assert_eq!(ddddd(0x12), Some(Reg::R(2)));
        assert_eq!(ddddd(0x17), Some(Reg::M(3)));
        assert_eq!(ddddd(0x1A), Some(Reg::La));
        assert_eq!(ddddd(0x1B), None);
        assert_eq!(ddddd(0x1F), Some(Reg::N(3)));
    }

    #[test]
    fn jjj_resolves_other_accumulator() {
        assert_eq!(jjj(0, Acc::A), Some(Reg::B));
        assert_eq!(jjj(0, Acc::B), Some(Reg::A));
        assert_eq!(jjj(1, Acc::A), None);
        assert_eq!(jjj(6, Acc::A), Some(Reg::X1));
    }

    #[test]
    fn iiii_special_codes() {
        assert_eq!(iiii(0xA, Acc::A), RegisterMove::Nothing);
        assert_eq!(iiii(0x9, Acc::A), RegisterMove::Reserved);
        assert_eq!(iiii(0x8, Acc::B), RegisterMove::Transfer(Reg::B, Reg::A));
        assert_eq!(iiii(0x1, Acc::A), RegisterMove::Transfer(Reg::Y0, Reg::B));
        assert_eq!(iiii(0xE, Acc::A), RegisterMove::Transfer(Reg::A0, Reg::X1));
    }

    #[test]
    fn uuuu_uses_bit_four() {
        assert_eq!(uuuu(0x0002, Acc::A), Some((AddSub::Add, Reg::X1)));
        assert_eq!(uuuu(0x0005, Acc::A), Some((AddSub::Sub, Reg::Y0)));
        assert_eq!(uuuu(0x0014, Acc::A), Some((AddSub::Add, Reg::B)));
        assert_eq!(uuuu(0x0015, Acc::B), Some((AddSub::Sub, Reg::A)));
        assert_eq!(uuuu(0x0016, Acc::A), None);
    }

    #[test]
    fn field_sign_extension() {
        assert_eq!(sign_extend_8(0x80), 0xFF80);
        assert_eq!(sign_extend_8(0x7F), 0x007F);
        assert_eq!(sign_extend_6(0x3F), 0xFFFF);
        assert_eq!(sign_extend_6(0x1F), 0x001F);
    }

    #[test]
    fn bank_selector() {
        assert_eq!(bbb(0b100), Some(8));
        assert_eq!(bbb(0b010), Some(4));
        assert_eq!(bbb(0b001), Some(0));
        assert_eq!(bbb(0b011), None);
    }

    #[test]
    fn operand_width_follows_register() {
        assert_eq!(Operand::from(Reg::A).width(), Width::LongWord);
        assert_eq!(Operand::from(Reg::X).width(), Width::DoubleWord);
        assert_eq!(Operand::from(Reg::B2).width(), Width::Byte);
        assert_eq!(Operand::from(Reg::R(1)).width(), Width::Word);
    }
}
