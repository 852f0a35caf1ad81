//! Instruction decode.
//!
//! DSP56156 encodings overlap, so decoding is an ordered walk over
//! `(mask, value)` tables and the first match wins. Dispatch priority:
//!
//! 1. Dual X memory data read (`011m mKKK .rr. ....`)
//! 2. X memory data write and register data move (`0001 011k ....`)
//! 3. The general parallel forms (ALU operation in the low byte)
//! 4. Non-parallel instructions
//!
//! Unrecognized words are logged and retire as one-word NOPs.

use emu_core::HarvardBus;

use crate::cpu::Dsp56156;

/// What a handler did: how far PC advances and what the instruction cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Exec {
    /// Words to add to PC; zero when the handler set PC itself.
    pub advance: u16,
    pub cycles: u32,
}

impl Exec {
    pub(crate) const fn next(words: u16, cycles: u32) -> Self {
        Self { advance: words, cycles }
    }

    pub(crate) const fn jump(cycles: u32) -> Self {
        Self { advance: 0, cycles }
    }
}

pub(crate) type Handler = fn(&mut Dsp56156, &mut dyn HarvardBus, u16, u16) -> Exec;

/// One `(mask, value)` test.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pattern {
    mask: u16,
    value: u16,
}

impl Pattern {
    pub(crate) const fn new(mask: u16, value: u16) -> Self {
        Self { mask, value }
    }

    pub(crate) const fn matches(self, word: u16) -> bool {
        word & self.mask == self.value
    }
}

/// Opcode word test, with optional tests on the word that follows it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Encoding {
    first: Pattern,
    second: Option<Pattern>,
    excluded: &'static [Pattern],
}

impl Encoding {
    pub(crate) const fn one(mask: u16, value: u16) -> Self {
        Self { first: Pattern::new(mask, value), second: None, excluded: &[] }
    }

    const fn two(mask: u16, value: u16, mask2: u16, value2: u16) -> Self {
        Self {
            first: Pattern::new(mask, value),
            second: Some(Pattern::new(mask2, value2)),
            excluded: &[],
        }
    }

    /// Reject the match when the second word fits any of `patterns`.
    const fn excluding(mut self, patterns: &'static [Pattern]) -> Self {
        self.excluded = patterns;
        self
    }

    pub(crate) fn matches(&self, op: u16, op2: u16) -> bool {
        self.first.matches(op)
            && self.second.is_none_or(|p| p.matches(op2))
            && !self.excluded.iter().any(|p| p.matches(op2))
    }
}

/// First table entry whose encoding matches.
pub(crate) fn find<T: Copy>(table: &[(Encoding, T)], op: u16, op2: u16) -> Option<T> {
    table.iter().find(|(encoding, _)| encoding.matches(op, op2)).map(|&(_, item)| item)
}

// ================================================================
// Parallel forms
// ================================================================

const DUAL_READ: Encoding = Encoding::one(0xE000, 0x6000);
const WRITE_AND_MOVE: Encoding = Encoding::one(0xFE00, 0x1600);

/// Parallel move carried next to a data ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParallelForm {
    /// `0100 1010`: ALU operation only.
    NoMove,
    /// `0100 IIII`: register to register.
    RegisterMove,
    /// `0011 0zRR`: Rn += / -= Nn.
    AddressUpdate,
    /// `1mRR HHHW`: X:(Rn) with post-update.
    XMemory,
    /// `0101 HHHW`: X:(R0), no update.
    XMemoryR0,
    /// `0000 0101 BBBB BBBB | ---- HHHW aluop`: X:(R2 + displacement).
    XMemoryDisplaced,
}

/// Second words that make `0000 0101` a non-parallel MOVE(M), MOVE(C) or
/// plain MOVE instead of a displaced parallel move.
const NOT_DISPLACED_ALU: &[Pattern] = &[
    Pattern::new(0xFE20, 0x0200),
    Pattern::new(0xF810, 0x3800),
    Pattern::new(0x00FF, 0x0000),
];

const PARALLEL_FORMS: &[(Encoding, ParallelForm)] = &[
    (Encoding::one(0xFF00, 0x4A00), ParallelForm::NoMove),
    (Encoding::one(0xF000, 0x4000), ParallelForm::RegisterMove),
    (Encoding::one(0xF800, 0x3000), ParallelForm::AddressUpdate),
    (Encoding::one(0x8000, 0x8000), ParallelForm::XMemory),
    (Encoding::one(0xF000, 0x5000), ParallelForm::XMemoryR0),
    (
        Encoding::one(0xFF00, 0x0500).excluding(NOT_DISPLACED_ALU),
        ParallelForm::XMemoryDisplaced,
    ),
];

// ================================================================
// Non-parallel instructions
// ================================================================

/// A non-parallel instruction. Entries with no handler are known encodings
/// that are logged and skipped.
#[derive(Clone, Copy)]
pub(crate) struct Instruction {
    pub encoding: Encoding,
    pub mnemonic: &'static str,
    pub words: u16,
    pub handler: Option<Handler>,
}

const fn op(mask: u16, value: u16, mnemonic: &'static str, handler: Handler) -> Instruction {
    Instruction { encoding: Encoding::one(mask, value), mnemonic, words: 1, handler: Some(handler) }
}

/// Two-word instruction whose second word is an operand.
const fn op2(mask: u16, value: u16, mnemonic: &'static str, handler: Handler) -> Instruction {
    Instruction { encoding: Encoding::one(mask, value), mnemonic, words: 2, handler: Some(handler) }
}

/// Two-word instruction that also tests its second word.
const fn op2x(
    mask: u16,
    value: u16,
    mask2: u16,
    value2: u16,
    mnemonic: &'static str,
    handler: Handler,
) -> Instruction {
    Instruction {
        encoding: Encoding::two(mask, value, mask2, value2),
        mnemonic,
        words: 2,
        handler: Some(handler),
    }
}

const fn stub(mask: u16, value: u16, mnemonic: &'static str) -> Instruction {
    Instruction { encoding: Encoding::one(mask, value), mnemonic, words: 1, handler: None }
}

#[rustfmt::skip]
pub(crate) const INSTRUCTIONS: &[Instruction] = &[
    // Moves come first: MOVE(S)/MOVE(P) overlap ANDI/ORI with EE = 00, and
    // the displaced MOVE(C)/MOVE(M) second words can end in a zero byte.
    op2x(0xFF00, 0x0500, 0xF810, 0x3800, "MOVE(C)", Dsp56156::op_movec_displaced),
    op2x(0xFF00, 0x0500, 0xFE20, 0x0200, "MOVE(M)", Dsp56156::op_movem_displaced),
    op2x(0xFF00, 0x0500, 0x00FF, 0x0000, "MOVE",    Dsp56156::op_move_displaced),
    op(0xF810, 0x3800,                   "MOVE(C)", Dsp56156::op_movec_indirect),
    op(0xF814, 0x3810,                   "MOVE(C)", Dsp56156::op_movec_indexed),
    op(0xF816, 0x3816,                   "MOVE(C)", Dsp56156::op_movec_accumulator),
    op2(0xF816, 0x3814,                  "MOVE(C)", Dsp56156::op_movec_long),
    op(0xFC00, 0x2800,                   "MOVE(C)", Dsp56156::op_movec_register),
    op(0xFC00, 0x2000,                   "MOVE(I)", Dsp56156::op_movei),
    op(0xFE20, 0x0200,                   "MOVE(M)", Dsp56156::op_movem_indirect),
    op(0xFE30, 0x0230,                   "MOVE(M)", Dsp56156::op_movem_dual),
    op(0xFE20, 0x1820,                   "MOVE(P)", Dsp56156::op_movep_short),
    op(0xFE00, 0x0C00,                   "MOVE(P)", Dsp56156::op_movep_indirect),
    op(0xFE20, 0x1800,                   "MOVE(S)", Dsp56156::op_moves),

    op(0xFFF6, 0x1502,                   "ADC",     Dsp56156::op_adc),
    op(0xF900, 0x1800,                   "ANDI",    Dsp56156::op_andi),
    op(0xFFF7, 0x1531,                   "ASL4",    Dsp56156::op_asl4),
    op(0xFFF7, 0x1530,                   "ASR4",    Dsp56156::op_asr4),
    op(0xFFF7, 0x1570,                   "ASR16",   Dsp56156::op_asr16),
    op2x(0xFFC0, 0x14C0, 0x1F00, 0x1200, "BFCHG",   Dsp56156::op_bitfield),
    op2x(0xFFE0, 0x14A0, 0x1F00, 0x1200, "BFCHG",   Dsp56156::op_bitfield),
    op2x(0xFFE0, 0x1480, 0x1F00, 0x1200, "BFCHG",   Dsp56156::op_bitfield),
    op2x(0xFFC0, 0x14C0, 0x1F00, 0x0400, "BFCLR",   Dsp56156::op_bitfield),
    op2x(0xFFE0, 0x14A0, 0x1F00, 0x0400, "BFCLR",   Dsp56156::op_bitfield),
    op2x(0xFFE0, 0x1480, 0x1F00, 0x0400, "BFCLR",   Dsp56156::op_bitfield),
    op2x(0xFFC0, 0x14C0, 0x1F00, 0x1800, "BFSET",   Dsp56156::op_bitfield),
    op2x(0xFFE0, 0x14A0, 0x1F00, 0x1800, "BFSET",   Dsp56156::op_bitfield),
    op2x(0xFFE0, 0x1480, 0x1F00, 0x1800, "BFSET",   Dsp56156::op_bitfield),
    op2x(0xFFC0, 0x1440, 0x1F00, 0x1000, "BFTSTH",  Dsp56156::op_bitfield),
    op2x(0xFFE0, 0x1420, 0x1F00, 0x1000, "BFTSTH",  Dsp56156::op_bitfield),
    op2x(0xFFE0, 0x1400, 0x1F00, 0x1000, "BFTSTH",  Dsp56156::op_bitfield),
    op2x(0xFFC0, 0x1440, 0x1F00, 0x0000, "BFTSTL",  Dsp56156::op_bitfield),
    op2x(0xFFE0, 0x1420, 0x1F00, 0x0000, "BFTSTL",  Dsp56156::op_bitfield),
    op2x(0xFFE0, 0x1400, 0x1F00, 0x0000, "BFTSTL",  Dsp56156::op_bitfield),
    op2(0xFF30, 0x0730,                  "Bcc",     Dsp56156::op_bcc_long),
    op(0xFC00, 0x2C00,                   "Bcc",     Dsp56156::op_bcc_short),
    op(0xFF30, 0x0720,                   "Bcc",     Dsp56156::op_bcc_register),
    op2(0xFFFC, 0x013C,                  "BRA",     Dsp56156::op_bra_long),
    op(0xFF00, 0x0B00,                   "BRA",     Dsp56156::op_bra_short),
    op(0xFFFC, 0x012C,                   "BRA",     Dsp56156::op_bra_register),
    op(0xFFF0, 0x0110,                   "BRKcc",   Dsp56156::op_brkcc),
    op2(0xFF30, 0x0710,                  "BScc",    Dsp56156::op_bscc_long),
    op(0xFF30, 0x0700,                   "BScc",    Dsp56156::op_bscc_register),
    op2(0xFFFC, 0x0138,                  "BSR",     Dsp56156::op_bsr_long),
    op(0xFFFC, 0x0128,                   "BSR",     Dsp56156::op_bsr_register),
    stub(0xFFFF, 0x0004,                 "CHKAAU"),
    stub(0xFFFF, 0x0001,                 "DEBUG"),
    stub(0xFFF0, 0x0050,                 "DEBUGcc"),
    op(0xFF94, 0x1504,                   "DIV",     Dsp56156::op_div),
    op(0xFFD0, 0x1590,                   "DMAC",    Dsp56156::op_dmac),
    op2(0xFFE0, 0x00C0,                  "DO",      Dsp56156::op_do_indirect),
    op2(0xFF00, 0x0E00,                  "DO",      Dsp56156::op_do_immediate),
    op2(0xFFE0, 0x0400,                  "DO",      Dsp56156::op_do_register),
    op2(0xFFFF, 0x0002,                  "DO FOREVER", Dsp56156::op_do_forever),
    op(0xFFFF, 0x0009,                   "ENDDO",   Dsp56156::op_enddo),
    op(0xFFF7, 0x1552,                   "EXT",     Dsp56156::op_ext),
    op(0xFFFF, 0x000F,                   "ILLEGAL", Dsp56156::op_illegal),
    op(0xFFF0, 0x15A0,                   "IMAC",    Dsp56156::op_imac),
    op(0xFFF0, 0x1580,                   "IMPY",    Dsp56156::op_impy),
    op2(0xFF30, 0x0630,                  "Jcc",     Dsp56156::op_jcc_long),
    op(0xFF30, 0x0620,                   "Jcc",     Dsp56156::op_jcc_register),
    op2(0xFFFC, 0x0134,                  "JMP",     Dsp56156::op_jmp_long),
    op(0xFFFC, 0x0124,                   "JMP",     Dsp56156::op_jmp_register),
    op2(0xFF30, 0x0610,                  "JScc",    Dsp56156::op_jscc_long),
    op(0xFF30, 0x0600,                   "JScc",    Dsp56156::op_jscc_register),
    op2(0xFFFC, 0x0130,                  "JSR",     Dsp56156::op_jsr_long),
    op(0xFF00, 0x0A00,                   "JSR",     Dsp56156::op_jsr_short),
    op(0xFFFC, 0x0120,                   "JSR",     Dsp56156::op_jsr_register),
    op(0xFFC0, 0x01C0,                   "LEA",     Dsp56156::op_lea_address),
    op(0xFFC0, 0x0180,                   "LEA",     Dsp56156::op_lea_offset),
    op(0xFFF0, 0x15E0,                   "MAC(su,uu)", Dsp56156::op_mac_mixed),
    op(0xFFF0, 0x15C0,                   "MPY(su,uu)", Dsp56156::op_mpy_mixed),
    op(0xFFF7, 0x1560,                   "NEGC",    Dsp56156::op_negc),
    op(0xFFFF, 0x0000,                   "NOP",     Dsp56156::op_nop),
    op(0xFFF4, 0x1520,                   "NORM",    Dsp56156::op_norm),
    op(0xF900, 0x1900,                   "ORI",     Dsp56156::op_ori),
    op(0xFFE0, 0x00E0,                   "REP",     Dsp56156::op_rep_indirect),
    op(0xFF00, 0x0F00,                   "REP",     Dsp56156::op_rep_immediate),
    op(0xFFE0, 0x0420,                   "REP",     Dsp56156::op_rep_register),
    stub(0xFFF0, 0x0150,                 "REPcc"),
    stub(0xFFFF, 0x0008,                 "RESET"),
    op(0xFFFF, 0x0007,                   "RTI",     Dsp56156::op_rti),
    op(0xFFFF, 0x0006,                   "RTS",     Dsp56156::op_rts),
    op(0xFFFF, 0x000A,                   "STOP",    Dsp56156::op_stop),
    op(0xFFF7, 0x1571,                   "SWAP",    Dsp56156::op_swap),
    op(0xFFFF, 0x0005,                   "SWI",     Dsp56156::op_swi),
    op(0xFC02, 0x1000,                   "Tcc",     Dsp56156::op_tcc),
    op(0xFFF6, 0x1500,                   "TFR(2)",  Dsp56156::op_tfr2),
    op(0xFC00, 0x2400,                   "TFR(3)",  Dsp56156::op_tfr3),
    op(0xFFF4, 0x1514,                   "TST(2)",  Dsp56156::op_tst2),
    op(0xFFFF, 0x000B,                   "WAIT",    Dsp56156::op_wait),
    op(0xFFF7, 0x1550,                   "ZERO",    Dsp56156::op_zero),
    stub(0xFFF0, 0x15D0,                 "SHFL"),
    stub(0xFFF0, 0x15F0,                 "SHFR"),
];

/// The non-parallel instruction a word pair decodes to.
pub(crate) fn lookup(op: u16, op2: u16) -> Option<&'static Instruction> {
    INSTRUCTIONS.iter().find(|i| i.encoding.matches(op, op2))
}

/// Length in words of the instruction starting with `op`.
pub(crate) fn instruction_words(op: u16, op2: u16) -> u16 {
    if DUAL_READ.matches(op, op2) || WRITE_AND_MOVE.matches(op, op2) {
        return 1;
    }
    if let Some(form) = find(PARALLEL_FORMS, op, op2) {
        return if form == ParallelForm::XMemoryDisplaced { 2 } else { 1 };
    }
    lookup(op, op2).map_or(1, |i| i.words)
}

impl Dsp56156 {
    /// Decode and execute one instruction.
    pub(crate) fn execute(&mut self, bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        if DUAL_READ.matches(op, op2) {
            return self.dual_read(bus, op);
        }
        if WRITE_AND_MOVE.matches(op, op2) {
            return self.write_and_move(bus, op);
        }
        if let Some(form) = find(PARALLEL_FORMS, op, op2) {
            return self.parallel(bus, form, op, op2);
        }
        match lookup(op, op2) {
            Some(Instruction { handler: Some(handler), .. }) => handler(self, bus, op, op2),
            Some(instruction) => {
                log::warn!(
                    "{} (${op:04X}) at P:${:04X} is not emulated",
                    instruction.mnemonic,
                    self.ppc
                );
                Exec::next(instruction.words, 2)
            }
            None => {
                log::warn!("unrecognized opcode ${op:04X} at P:${:04X}", self.ppc);
                Exec::next(1, 2)
            }
        }
    }
}
