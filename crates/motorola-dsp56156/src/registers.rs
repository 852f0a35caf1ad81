//! DSP56156 register file.

use serde::{Deserialize, Serialize};

/// Significant bits of an accumulator.
pub const ACC_MASK: u64 = 0xFF_FFFF_FFFF;

/// Stack pointer bit: stack error (overflow) latched.
pub const SP_SE: u8 = 1 << 4;
/// Stack pointer bit: underflow latched.
pub const SP_UF: u8 = 1 << 5;
/// Stack pointer bits that index the hardware stack.
pub const SP_POINTER: u8 = 0x0F;

/// Hardware stack depth.
pub const STACK_DEPTH: usize = 16;

/// Accumulator selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acc {
    A,
    B,
}

impl Acc {
    /// Decode an `F` bit.
    #[must_use]
    pub fn from_bit(f: u16) -> Self {
        if f & 1 == 0 { Acc::A } else { Acc::B }
    }

    /// The other accumulator (`^F`).
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Acc::A => Acc::B,
            Acc::B => Acc::A,
        }
    }
}

/// Sign-extend a canonical 40-bit accumulator image.
#[must_use]
pub fn sign_extend_40(value: u64) -> i64 {
    ((value << 24) as i64) >> 24
}

/// One hardware stack entry (system stack high / low).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackPair {
    pub high: u16,
    pub low: u16,
}

/// Register snapshot.
///
/// `a` and `b` hold 40 significant bits in canonical form: the container is
/// always `value & ACC_MASK`, never a sign-extended negative number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    // === Data ALU ===
    /// X1:X0.
    pub x: u32,
    /// Y1:Y0.
    pub y: u32,
    pub a: i64,
    pub b: i64,

    // === Address generation unit ===
    pub r: [u16; 4],
    pub n: [u16; 4],
    pub m: [u16; 4],

    // === Program control unit ===
    pub pc: u16,
    pub sr: u16,
    pub omr: u8,
    pub lc: u16,
    pub la: u16,
    pub sp: u8,
    pub ss: [StackPair; STACK_DEPTH],

    // === Loop shadow ===
    /// Loop counter saved while a REP is active.
    pub temp: u16,
    pub rep_flag: bool,
    /// Address reached after the repeated instruction.
    pub rep_addr: u16,
}

impl Registers {
    /// Power-on register state: everything zero, modifiers linear.
    #[must_use]
    pub fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            a: 0,
            b: 0,
            r: [0; 4],
            n: [0; 4],
            m: [0xFFFF; 4],
            pc: 0,
            sr: 0,
            omr: 0,
            lc: 0,
            la: 0,
            sp: 0,
            ss: [StackPair::default(); STACK_DEPTH],
            temp: 0,
            rep_flag: false,
            rep_addr: 0,
        }
    }

    // === Accumulators ===

    #[must_use]
    pub fn acc(&self, acc: Acc) -> u64 {
        let raw = match acc {
            Acc::A => self.a,
            Acc::B => self.b,
        };
        raw as u64 & ACC_MASK
    }

    /// Store a 40-bit value, canonicalizing it.
    pub fn set_acc(&mut self, acc: Acc, value: u64) {
        let canonical = (value & ACC_MASK) as i64;
        match acc {
            Acc::A => self.a = canonical,
            Acc::B => self.b = canonical,
        }
    }

    /// Bits 15..0.
    #[must_use]
    pub fn acc0(&self, acc: Acc) -> u16 {
        self.acc(acc) as u16
    }

    /// Bits 31..16.
    #[must_use]
    pub fn acc1(&self, acc: Acc) -> u16 {
        (self.acc(acc) >> 16) as u16
    }

    /// Bits 39..32.
    #[must_use]
    pub fn acc2(&self, acc: Acc) -> u8 {
        (self.acc(acc) >> 32) as u8
    }

    pub fn set_acc0(&mut self, acc: Acc, value: u16) {
        let v = self.acc(acc);
        self.set_acc(acc, (v & !0xFFFF) | u64::from(value));
    }

    pub fn set_acc1(&mut self, acc: Acc, value: u16) {
        let v = self.acc(acc);
        self.set_acc(acc, (v & !0xFFFF_0000) | (u64::from(value) << 16));
    }

    pub fn set_acc2(&mut self, acc: Acc, value: u8) {
        let v = self.acc(acc);
        self.set_acc(acc, (v & 0xFFFF_FFFF) | (u64::from(value) << 32));
    }

    // === X / Y halves ===

    #[must_use]
    pub fn x0(&self) -> u16 {
        self.x as u16
    }

    #[must_use]
    pub fn x1(&self) -> u16 {
        (self.x >> 16) as u16
    }

    #[must_use]
    pub fn y0(&self) -> u16 {
        self.y as u16
    }

    #[must_use]
    pub fn y1(&self) -> u16 {
        (self.y >> 16) as u16
    }

    pub fn set_x0(&mut self, value: u16) {
        self.x = (self.x & 0xFFFF_0000) | u32::from(value);
    }

    pub fn set_x1(&mut self, value: u16) {
        self.x = (self.x & 0xFFFF) | (u32::from(value) << 16);
    }

    pub fn set_y0(&mut self, value: u16) {
        self.y = (self.y & 0xFFFF_0000) | u32::from(value);
    }

    pub fn set_y1(&mut self, value: u16) {
        self.y = (self.y & 0xFFFF) | (u32::from(value) << 16);
    }

    // === Hardware stack ===

    /// Current stack slot.
    #[must_use]
    pub fn stack_index(&self) -> usize {
        usize::from(self.sp & SP_POINTER)
    }

    #[must_use]
    pub fn ssh(&self) -> u16 {
        self.ss[self.stack_index()].high
    }

    #[must_use]
    pub fn ssl(&self) -> u16 {
        self.ss[self.stack_index()].low
    }

    // === Introspection ===

    /// Read any named register, zero-extended.
    #[must_use]
    pub fn get(&self, reg: Register) -> u64 {
        match reg {
            Register::X0 => self.x0().into(),
            Register::X1 => self.x1().into(),
            Register::Y0 => self.y0().into(),
            Register::Y1 => self.y1().into(),
            Register::X => self.x.into(),
            Register::Y => self.y.into(),
            Register::A0 => self.acc0(Acc::A).into(),
            Register::A1 => self.acc1(Acc::A).into(),
            Register::A2 => self.acc2(Acc::A).into(),
            Register::A => self.acc(Acc::A),
            Register::B0 => self.acc0(Acc::B).into(),
            Register::B1 => self.acc1(Acc::B).into(),
            Register::B2 => self.acc2(Acc::B).into(),
            Register::B => self.acc(Acc::B),
            Register::R0 | Register::R1 | Register::R2 | Register::R3 => {
                self.r[reg.agu_index()].into()
            }
            Register::N0 | Register::N1 | Register::N2 | Register::N3 => {
                self.n[reg.agu_index()].into()
            }
            Register::M0 | Register::M1 | Register::M2 | Register::M3 => {
                self.m[reg.agu_index()].into()
            }
            Register::Pc => self.pc.into(),
            Register::Sr => self.sr.into(),
            Register::Omr => self.omr.into(),
            Register::Lc => self.lc.into(),
            Register::La => self.la.into(),
            Register::Sp => self.sp.into(),
            Register::Ssh => self.ssh().into(),
            Register::Ssl => self.ssl().into(),
            Register::Temp => self.temp.into(),
        }
    }

    /// Overwrite any named register. Values are truncated to the register
    /// width; accumulators are canonicalized. SSH/SSL write the current
    /// stack slot without moving the stack pointer.
    pub fn set(&mut self, reg: Register, value: u64) {
        match reg {
            Register::X0 => self.set_x0(value as u16),
            Register::X1 => self.set_x1(value as u16),
            Register::Y0 => self.set_y0(value as u16),
            Register::Y1 => self.set_y1(value as u16),
            Register::X => self.x = value as u32,
            Register::Y => self.y = value as u32,
            Register::A0 => self.set_acc0(Acc::A, value as u16),
            Register::A1 => self.set_acc1(Acc::A, value as u16),
            Register::A2 => self.set_acc2(Acc::A, value as u8),
            Register::A => self.set_acc(Acc::A, value),
            Register::B0 => self.set_acc0(Acc::B, value as u16),
            Register::B1 => self.set_acc1(Acc::B, value as u16),
            Register::B2 => self.set_acc2(Acc::B, value as u8),
            Register::B => self.set_acc(Acc::B, value),
            Register::R0 | Register::R1 | Register::R2 | Register::R3 => {
                self.r[reg.agu_index()] = value as u16;
            }
            Register::N0 | Register::N1 | Register::N2 | Register::N3 => {
                self.n[reg.agu_index()] = value as u16;
            }
            Register::M0 | Register::M1 | Register::M2 | Register::M3 => {
                self.m[reg.agu_index()] = value as u16;
            }
            Register::Pc => self.pc = value as u16,
            Register::Sr => self.sr = value as u16,
            Register::Omr => self.omr = value as u8,
            Register::Lc => self.lc = value as u16,
            Register::La => self.la = value as u16,
            Register::Sp => self.sp = value as u8 & 0x3F,
            Register::Ssh => {
                let i = self.stack_index();
                self.ss[i].high = value as u16;
            }
            Register::Ssl => {
                let i = self.stack_index();
                self.ss[i].low = value as u16;
            }
            Register::Temp => self.temp = value as u16,
        }
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Every register a host can inspect or patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    X0,
    X1,
    Y0,
    Y1,
    X,
    Y,
    A0,
    A1,
    A2,
    A,
    B0,
    B1,
    B2,
    B,
    R0,
    R1,
    R2,
    R3,
    N0,
    N1,
    N2,
    N3,
    M0,
    M1,
    M2,
    M3,
    Pc,
    Sr,
    Omr,
    Lc,
    La,
    Sp,
    Ssh,
    Ssl,
    Temp,
}

impl Register {
    /// All registers in id order.
    pub const ALL: [Register; 35] = [
        Register::X0,
        Register::X1,
        Register::Y0,
        Register::Y1,
        Register::X,
        Register::Y,
        Register::A0,
        Register::A1,
        Register::A2,
        Register::A,
        Register::B0,
        Register::B1,
        Register::B2,
        Register::B,
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::N0,
        Register::N1,
        Register::N2,
        Register::N3,
        Register::M0,
        Register::M1,
        Register::M2,
        Register::M3,
        Register::Pc,
        Register::Sr,
        Register::Omr,
        Register::Lc,
        Register::La,
        Register::Sp,
        Register::Ssh,
        Register::Ssl,
        Register::Temp,
    ];

    /// Look up a register by numeric id (its position in [`Register::ALL`]).
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a valid register id.
    #[must_use]
    pub fn from_id(id: u8) -> Self {
        let index = usize::from(id);
        assert!(index < Self::ALL.len(), "invalid DSP56156 register id {id}");
        Self::ALL[index]
    }

    /// Lower-case name, as used in observation paths.
    #[must_use]
    pub fn name(self) -> &'static str {
        const NAMES: [&str; 35] = [
            "x0", "x1", "y0", "y1", "x", "y", "a0", "a1", "a2", "a", "b0", "b1", "b2", "b", "r0",
            "r1", "r2", "r3", "n0", "n1", "n2", "n3", "m0", "m1", "m2", "m3", "pc", "sr", "omr",
            "lc", "la", "sp", "ssh", "ssl", "temp",
        ];
        NAMES[self as usize]
    }

    /// Look up a register by its observation name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.name() == name)
    }

    fn agu_index(self) -> usize {
        match self {
            Register::R0 | Register::N0 | Register::M0 => 0,
            Register::R1 | Register::N1 | Register::M1 => 1,
            Register::R2 | Register::N2 | Register::M2 => 2,
            _ => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_writes_are_canonical() {
        let mut regs = Registers::new();
        regs.set_acc(Acc::A, u64::MAX);
        assert_eq!(regs.a, 0xFF_FFFF_FFFF);
        assert_eq!(sign_extend_40(regs.acc(Acc::A)), -1);
    }

    #[test]
    fn sub_registers_split_the_accumulator() {
        let mut regs = Registers::new();
        regs.set_acc(Acc::B, 0x12_3456_789A);
        assert_eq!(regs.acc2(Acc::B), 0x12);
        assert_eq!(regs.acc1(Acc::B), 0x3456);
        assert_eq!(regs.acc0(Acc::B), 0x789A);
        regs.set_acc1(Acc::B, 0xFFFF);
        assert_eq!(regs.acc(Acc::B), 0x12_FFFF_789A);
    }

    #[test]
    fn register_ids_round_trip() {
        for (i, reg) in Register::ALL.iter().enumerate() {
            assert_eq!(Register::from_id(i as u8), *reg);
            assert_eq!(Register::from_name(reg.name()), Some(*reg));
        }
    }

    #[test]
    #[should_panic(expected = "invalid DSP56156 register id")]
    fn bad_register_id_panics() {
        let _ = Register::from_id(200);
    }

    #[test]
    fn reset_modifiers_are_linear() {
        assert_eq!(Registers::new().m, [0xFFFF; 4]);
    }
}
