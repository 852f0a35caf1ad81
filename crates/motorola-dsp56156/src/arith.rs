//! Data ALU instructions.
//!
//! Parallel ALU operations come from the low byte of a parallel-form opcode
//! (or from the dual-read encoding). Each handler applies the operation and
//! returns the accumulator it wrote with its previous value, so the parallel
//! move that follows can observe the pre-update contents.
//!
//! The non-parallel arithmetic instructions (`0001 0101 ....`) live here too.

use emu_core::HarvardBus;

use crate::alu::{self, AluDest, AluResult, Signedness};
use crate::cpu::Dsp56156;
use crate::decode::{Encoding, Exec, find};
use crate::flags::{C, E, L, U, V, Z};
use crate::operands::{self, AddSub, Reg};
use crate::registers::Acc;

pub(crate) type AluHandler = fn(&mut Dsp56156, u16) -> Option<AluDest>;

fn f_of(op: u16) -> Acc {
    Acc::from_bit(op >> 3)
}

#[rustfmt::skip]
const PARALLEL_ALU: &[(Encoding, AluHandler)] = &[
    (Encoding::one(0xF7, 0x01), Dsp56156::alu_clr),
    (Encoding::one(0xF0, 0x00), Dsp56156::alu_add),
    (Encoding::one(0xFF, 0x11), Dsp56156::alu_move),
    (Encoding::one(0xF0, 0x10), Dsp56156::alu_tfr),
    (Encoding::one(0xF7, 0x20), Dsp56156::alu_rnd),
    (Encoding::one(0xF7, 0x21), Dsp56156::alu_tst),
    (Encoding::one(0xF7, 0x22), Dsp56156::alu_inc),
    (Encoding::one(0xF7, 0x23), Dsp56156::alu_inc24),
    (Encoding::one(0xF4, 0x24), Dsp56156::alu_or),
    (Encoding::one(0xF7, 0x30), Dsp56156::alu_asr),
    (Encoding::one(0xF7, 0x31), Dsp56156::alu_asl),
    (Encoding::one(0xF7, 0x32), Dsp56156::alu_lsr),
    (Encoding::one(0xF7, 0x33), Dsp56156::alu_lsl),
    (Encoding::one(0xF4, 0x34), Dsp56156::alu_eor),
    (Encoding::one(0xF7, 0x41), Dsp56156::alu_subl),
    (Encoding::one(0xF0, 0x40), Dsp56156::alu_sub),
    (Encoding::one(0xF7, 0x51), Dsp56156::alu_clr24),
    (Encoding::one(0xF6, 0x52), Dsp56156::alu_sbc),
    (Encoding::one(0xF0, 0x50), Dsp56156::alu_cmp),
    (Encoding::one(0xF7, 0x60), Dsp56156::alu_neg),
    (Encoding::one(0xF7, 0x61), Dsp56156::alu_not),
    (Encoding::one(0xF7, 0x62), Dsp56156::alu_dec),
    (Encoding::one(0xF7, 0x63), Dsp56156::alu_dec24),
    (Encoding::one(0xF4, 0x64), Dsp56156::alu_and),
    (Encoding::one(0xF7, 0x71), Dsp56156::alu_abs),
    (Encoding::one(0xF7, 0x72), Dsp56156::alu_ror),
    (Encoding::one(0xF7, 0x73), Dsp56156::alu_rol),
    (Encoding::one(0xF0, 0x70), Dsp56156::alu_cmpm),
    (Encoding::one(0x80, 0x80), Dsp56156::alu_multiply),
];

/// ALU operations of the dual X memory read (`011m mKKK .rr. ....`).
#[rustfmt::skip]
const DUAL_READ_ALU: &[(Encoding, AluHandler)] = &[
    (Encoding::one(0x90, 0x00), Dsp56156::dual_add_sub),
    (Encoding::one(0x94, 0x14), Dsp56156::dual_add_sub),
    (Encoding::one(0x94, 0x84), Dsp56156::dual_multiply),
    (Encoding::one(0x94, 0x94), Dsp56156::dual_multiply),
    (Encoding::one(0x9F, 0x10), Dsp56156::alu_move),
    (Encoding::one(0x94, 0x10), Dsp56156::dual_tfr),
    (Encoding::one(0x94, 0x80), Dsp56156::dual_multiply),
    (Encoding::one(0x94, 0x90), Dsp56156::dual_multiply),
];

impl Dsp56156 {
    /// Merge an operation's condition codes into SR. V also latches L.
    pub(crate) fn set_ccr(&mut self, result: AluResult) {
        let written = result.flags & result.affected;
        let mut sr = (self.regs.sr & !result.affected) | written;
        if written & V != 0 {
            sr |= L;
        }
        self.regs.sr = sr;
    }

    /// Store a result into an accumulator and update SR.
    pub(crate) fn apply(&mut self, acc: Acc, result: AluResult) -> Option<AluDest> {
        let prior = self.regs.acc(acc);
        self.regs.set_acc(acc, result.value);
        self.set_ccr(result);
        Some(AluDest { acc, prior })
    }

    fn carry(&self) -> bool {
        self.regs.sr & C != 0
    }

    /// Run the ALU operation in the low byte of a parallel-form opcode.
    pub(crate) fn parallel_alu(&mut self, op_byte: u16) -> Option<AluDest> {
        let handler = find(PARALLEL_ALU, op_byte & 0xFF, 0)?;
        handler(self, op_byte & 0xFF)
    }

    /// Run the ALU operation of a dual X memory read.
    pub(crate) fn dual_read_alu(&mut self, op: u16) -> Option<AluDest> {
        let handler = find(DUAL_READ_ALU, op & 0xFF, 0)?;
        handler(self, op)
    }

    fn jjj_source(&mut self, op: u16, f: Acc) -> Option<u64> {
        match operands::jjj(op, f) {
            Some(reg) => Some(self.alu_source(reg)),
            None => {
                log::warn!("reserved JJJ source in ${op:02X} at P:${:04X}", self.ppc);
                None
            }
        }
    }

    // ================================================================
    // Parallel ALU operations: .... .... kkkk FJJJ
    // ================================================================

    fn alu_clr(&mut self, op: u16) -> Option<AluDest> {
        self.apply(f_of(op), alu::clr())
    }

    fn alu_add(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let s = self.jjj_source(op, f)?;
        let result = alu::add(self.regs.acc(f), s);
        self.apply(f, result)
    }

    fn alu_move(&mut self, _op: u16) -> Option<AluDest> {
        None
    }

    fn alu_tfr(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let value = self.jjj_source(op, f)?;
        let prior = self.regs.acc(f);
        self.regs.set_acc(f, value);
        Some(AluDest { acc: f, prior })
    }

    fn alu_rnd(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::rnd(self.regs.acc(f)))
    }

    fn alu_tst(&mut self, op: u16) -> Option<AluDest> {
        self.set_ccr(alu::tst(self.regs.acc(f_of(op))));
        None
    }

    fn alu_inc(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::inc(self.regs.acc(f)))
    }

    fn alu_inc24(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::inc24(self.regs.acc(f)))
    }

    fn alu_or(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let s = self.source_word(operands::dd(op));
        self.apply(f, alu::or(self.regs.acc(f), s))
    }

    fn alu_eor(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let s = self.source_word(operands::dd(op));
        self.apply(f, alu::eor(self.regs.acc(f), s))
    }

    fn alu_and(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let s = self.source_word(operands::dd(op));
        self.apply(f, alu::and(self.regs.acc(f), s))
    }

    fn alu_asr(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::asr(self.regs.acc(f), 1))
    }

    fn alu_asl(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::asl(self.regs.acc(f), 1))
    }

    fn alu_lsr(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::lsr(self.regs.acc(f)))
    }

    fn alu_lsl(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::lsl(self.regs.acc(f)))
    }

    fn alu_subl(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let result = alu::subl(self.regs.acc(f), self.regs.acc(f.other()));
        self.apply(f, result)
    }

    fn alu_sub(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let s = self.jjj_source(op, f)?;
        let result = alu::sub(self.regs.acc(f), s);
        self.apply(f, result)
    }

    fn alu_clr24(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::clr24(self.regs.acc(f)))
    }

    fn alu_sbc(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let s = self.alu_source(operands::j(op));
        let result = alu::sbc(self.regs.acc(f), s, self.carry());
        self.apply(f, result)
    }

    fn alu_cmp(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let s = self.jjj_source(op, f)?;
        self.set_ccr(alu::sub(self.regs.acc(f), s));
        None
    }

    fn alu_neg(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::neg(self.regs.acc(f)))
    }

    fn alu_not(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::not(self.regs.acc(f)))
    }

    fn alu_dec(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::dec(self.regs.acc(f)))
    }

    fn alu_dec24(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::dec24(self.regs.acc(f)))
    }

    fn alu_abs(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        self.apply(f, alu::abs(self.regs.acc(f)))
    }

    fn alu_ror(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let result = alu::ror(self.regs.acc(f), self.carry());
        self.apply(f, result)
    }

    fn alu_rol(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let result = alu::rol(self.regs.acc(f), self.carry());
        self.apply(f, result)
    }

    fn alu_cmpm(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let s = self.jjj_source(op, f)?;
        self.set_ccr(alu::cmpm(self.regs.acc(f), s));
        None
    }

    /// MPY / MPYR / MAC / MACR: `1kar FQQQ` (a = accumulate, r = round).
    fn alu_multiply(&mut self, op: u16) -> Option<AluDest> {
        let (s1, s2) = operands::qqq(op);
        let negate = op & 0x40 != 0;
        let accumulate = op & 0x20 != 0;
        let round = op & 0x10 != 0;
        self.multiply_into(f_of(op), s1, s2, negate, accumulate, round)
    }

    pub(crate) fn multiply_into(
        &mut self,
        f: Acc,
        s1: Reg,
        s2: Reg,
        negate: bool,
        accumulate: bool,
        round: bool,
    ) -> Option<AluDest> {
        let a = self.source_word(s1);
        let b = self.source_word(s2);
        let term = alu::multiply(a, b, Signedness::SignedSigned);
        let result = if accumulate {
            alu::mac(self.regs.acc(f), term, negate, round)
        } else {
            alu::mpy(term, negate, round)
        };
        self.apply(f, result)
    }

    // ================================================================
    // Dual-read ALU operations: 011m mKKK .rr. ....
    // ================================================================

    /// ADD/SUB `0rru Fuuu`.
    fn dual_add_sub(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let Some((kind, src)) = operands::uuuu(op, f) else {
            log::warn!("reserved uuuu field in ${op:04X} at P:${:04X}", self.ppc);
            return None;
        };
        let s = self.alu_source(src);
        let d = self.regs.acc(f);
        let result = match kind {
            AddSub::Add => alu::add(d, s),
            AddSub::Sub => alu::sub(d, s),
        };
        self.apply(f, result)
    }

    /// MPY/MPYR/MAC/MACR `1rrR FaQQ` (R = round, a = accumulate).
    fn dual_multiply(&mut self, op: u16) -> Option<AluDest> {
        let (s1, s2) = operands::qq(op);
        let accumulate = op & 0x04 != 0;
        let round = op & 0x10 != 0;
        self.multiply_into(f_of(op), s1, s2, false, accumulate, round)
    }

    /// TFR `0rr1 F0DD`.
    fn dual_tfr(&mut self, op: u16) -> Option<AluDest> {
        let f = f_of(op);
        let value = self.alu_source(operands::dd(op));
        let prior = self.regs.acc(f);
        self.regs.set_acc(f, value);
        Some(AluDest { acc: f, prior })
    }

    // ================================================================
    // Non-parallel arithmetic: 0001 0101 ....
    // ================================================================

    /// ADC `0001 0101 0000 F01J`.
    pub(crate) fn op_adc(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        let s = self.alu_source(operands::j(op));
        let result = alu::adc(self.regs.acc(f), s, self.carry());
        self.apply(f, result);
        Exec::next(1, 2)
    }

    /// ASL4 `0001 0101 0011 F001`.
    pub(crate) fn op_asl4(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        self.apply(f, alu::asl(self.regs.acc(f), 4));
        Exec::next(1, 2)
    }

    /// ASR4 `0001 0101 0011 F000`.
    pub(crate) fn op_asr4(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        self.apply(f, alu::asr(self.regs.acc(f), 4));
        Exec::next(1, 2)
    }

    /// ASR16 `0001 0101 0111 F000`.
    pub(crate) fn op_asr16(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        self.apply(f, alu::asr(self.regs.acc(f), 16));
        Exec::next(1, 2)
    }

    /// DIV `0001 0101 0--0 F1DD`.
    pub(crate) fn op_div(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        let s = self.source_word(operands::dd(op));
        let result = alu::div(self.regs.acc(f), s, self.carry());
        self.apply(f, result);
        Exec::next(1, 2)
    }

    /// DMAC `0001 0101 10s1 FsQQ`.
    pub(crate) fn op_dmac(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        let signedness = match (op & 0x20 != 0, op & 0x04 != 0) {
            (false, false) => Signedness::SignedSigned,
            (true, false) => Signedness::SignedUnsigned,
            (true, true) => Signedness::UnsignedUnsigned,
            (false, true) => {
                log::warn!("reserved DMAC signedness in ${op:04X} at P:${:04X}", self.ppc);
                Signedness::SignedSigned
            }
        };
        let (s1, s2) = operands::qq_mixed(op);
        let term = alu::multiply(self.source_word(s1), self.source_word(s2), signedness);
        let result = alu::dmac(self.regs.acc(f), term);
        self.apply(f, result);
        Exec::next(1, 2)
    }

    /// EXT `0001 0101 0101 F010`.
    pub(crate) fn op_ext(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        self.apply(f, alu::ext(self.regs.acc(f)));
        Exec::next(1, 2)
    }

    /// IMAC `0001 0101 1010 FQQQ`.
    pub(crate) fn op_imac(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        let (s1, s2) = operands::qqq(op);
        let term = alu::integer_multiply(self.source_word(s1), self.source_word(s2));
        let result = alu::mac(self.regs.acc(f), term, false, false);
        self.apply(f, result);
        Exec::next(1, 2)
    }

    /// IMPY `0001 0101 1000 FQQQ`.
    pub(crate) fn op_impy(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        let (s1, s2) = operands::qqq(op);
        let term = alu::integer_multiply(self.source_word(s1), self.source_word(s2));
        self.apply(f, alu::mpy(term, false, false));
        Exec::next(1, 2)
    }

    fn mixed_term(&mut self, op: u16) -> u64 {
        let signedness =
            if op & 0x04 == 0 { Signedness::SignedUnsigned } else { Signedness::UnsignedUnsigned };
        let (s1, s2) = operands::qq_mixed(op);
        alu::multiply(self.source_word(s1), self.source_word(s2), signedness)
    }

    /// MAC(su,uu) `0001 0101 1110 FsQQ`.
    pub(crate) fn op_mac_mixed(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        let term = self.mixed_term(op);
        let result = alu::mac(self.regs.acc(f), term, false, false);
        self.apply(f, result);
        Exec::next(1, 2)
    }

    /// MPY(su,uu) `0001 0101 1100 FsQQ`.
    pub(crate) fn op_mpy_mixed(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        let term = self.mixed_term(op);
        self.apply(f, alu::mpy(term, false, false));
        Exec::next(1, 2)
    }

    /// NEGC `0001 0101 0110 F000`.
    pub(crate) fn op_negc(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        let result = alu::negc(self.regs.acc(f), self.carry());
        self.apply(f, result);
        Exec::next(1, 2)
    }

    /// NORM `0001 0101 0010 F0RR`: one normalization step, counting in Rn.
    pub(crate) fn op_norm(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        let rr = usize::from(op & 3);
        let d = self.regs.acc(f);
        let flags = alu::nzeu(d);
        let extended = flags & E != 0;
        let unnormalized = flags & U != 0;
        let zero = flags & Z != 0;

        if !extended && unnormalized && !zero {
            let mut result = alu::asl(d, 1);
            result.affected &= !C;
            self.apply(f, result);
            self.regs.r[rr] = self.regs.r[rr].wrapping_sub(1);
        } else if extended {
            let mut result = alu::asr(d, 1);
            result.affected &= !C;
            self.apply(f, result);
            self.regs.r[rr] = self.regs.r[rr].wrapping_add(1);
        }
        Exec::next(1, 2)
    }

    /// SWAP `0001 0101 0111 F001`.
    pub(crate) fn op_swap(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        self.apply(f, alu::swap(self.regs.acc(f)));
        Exec::next(1, 2)
    }

    /// TFR(2) `0001 0101 0000 F00J`: X or Y into an accumulator.
    pub(crate) fn op_tfr2(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        let value = self.alu_source(operands::j(op));
        self.regs.set_acc(f, value);
        Exec::next(1, 2)
    }

    /// TST(2) `0001 0101 0001 -1DD`.
    pub(crate) fn op_tst2(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let s = self.source_word(operands::dd(op));
        self.set_ccr(alu::tst16(s));
        Exec::next(1, 2)
    }

    /// ZERO `0001 0101 0101 F000`.
    pub(crate) fn op_zero(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = f_of(op);
        self.apply(f, alu::zero(self.regs.acc(f)));
        Exec::next(1, 2)
    }
}
