//! Data ALU arithmetic.
//!
//! Pure functions over canonical 40-bit accumulator images. Each returns the
//! new value together with the condition codes it computed and the mask of
//! CCR bits it is allowed to write; the core merges them into SR.
//!
//! Arithmetic is fractional two's complement. A 16-bit source occupies bits
//! 31..16 of the 40-bit format, sign-extended, with bits 15..0 clear.

use crate::flags::{C, E, N, U, V, Z};
use crate::operands::Reg;
use crate::registers::{ACC_MASK, Acc, sign_extend_40};

/// Outcome of one data ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AluResult {
    pub value: u64,
    /// Condition codes computed by the operation.
    pub flags: u16,
    /// CCR bits the operation writes. Bits outside the mask keep their value.
    pub affected: u16,
}

/// The accumulator a data ALU operation wrote and the value it held before.
///
/// A parallel move that reads the same accumulator sees `prior`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AluDest {
    pub acc: Acc,
    pub prior: u64,
}

impl AluDest {
    /// `reg` as it read before the update, if `reg` is part of this accumulator.
    pub(crate) fn view(self, reg: Reg) -> Option<u64> {
        if reg.accumulator() != Some(self.acc) {
            return None;
        }
        Some(match reg {
            Reg::A0 | Reg::B0 => self.prior & 0xFFFF,
            Reg::A1 | Reg::B1 => (self.prior >> 16) & 0xFFFF,
            Reg::A2 | Reg::B2 => self.prior >> 32,
            _ => self.prior,
        })
    }
}

const NZEU: u16 = N | Z | E | U;
const NZEUV: u16 = NZEU | V;

/// Signedness of the two multiplier inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signedness {
    SignedSigned,
    SignedUnsigned,
    UnsignedUnsigned,
}

/// A 16-bit source in accumulator format.
pub(crate) fn word_to_acc(word: u16) -> u64 {
    (i64::from(word as i16) << 16) as u64 & ACC_MASK
}

/// A 32-bit source (X or Y) in accumulator format.
pub(crate) fn long_to_acc(long: u32) -> u64 {
    i64::from(long as i32) as u64 & ACC_MASK
}

fn bit(value: u64, n: u32) -> bool {
    (value >> n) & 1 != 0
}

fn mask(value: i64) -> u64 {
    value as u64 & ACC_MASK
}

fn d1(value: u64) -> u16 {
    (value >> 16) as u16
}

fn with_d1(value: u64, word: u16) -> u64 {
    (value & !0xFFFF_0000) | (u64::from(word) << 16)
}

/// N, Z, E and U for a 40-bit result.
pub(crate) fn nzeu(value: u64) -> u16 {
    let mut flags = 0;
    if bit(value, 39) {
        flags |= N;
    }
    if value == 0 {
        flags |= Z;
    }
    let extension = value >> 31;
    if extension != 0 && extension != 0x1FF {
        flags |= E;
    }
    if bit(value, 31) == bit(value, 30) {
        flags |= U;
    }
    flags
}

/// Bus read of an accumulator: A1 when it represents the value exactly,
/// otherwise the saturated extreme. The flag reports saturation.
pub(crate) fn limit(value: u64) -> (u16, bool) {
    let extension = value >> 31;
    if extension == 0 || extension == 0x1FF {
        (d1(value), false)
    } else if bit(value, 39) {
        (0x8000, true)
    } else {
        (0x7FFF, true)
    }
}

fn carry_result(raw: u64, affected_carry: bool) -> AluResult {
    let value = raw & ACC_MASK;
    let overflow = raw >> 40 != 0;
    let mut flags = nzeu(value);
    let mut affected = NZEUV;
    if overflow {
        flags |= V;
    }
    if affected_carry {
        affected |= C;
        if overflow {
            flags |= C;
        }
    }
    AluResult { value, flags, affected }
}

// ================================================================
// Add / subtract family
// ================================================================

pub(crate) fn add(d: u64, s: u64) -> AluResult {
    carry_result(d + s, true)
}

pub(crate) fn sub(d: u64, s: u64) -> AluResult {
    carry_result(d.wrapping_sub(s), true)
}

pub(crate) fn adc(d: u64, s: u64, carry: bool) -> AluResult {
    carry_result(d + s + u64::from(carry), true)
}

pub(crate) fn sbc(d: u64, s: u64, carry: bool) -> AluResult {
    carry_result(d.wrapping_sub(s).wrapping_sub(u64::from(carry)), true)
}

/// `2 * D - S`.
pub(crate) fn subl(d: u64, s: u64) -> AluResult {
    let shifted = (d << 1) & ACC_MASK;
    let mut result = carry_result(shifted.wrapping_sub(s), true);
    if bit(d, 39) != bit(d, 38) {
        result.flags |= V;
    }
    result
}

/// `0 - D - C`.
pub(crate) fn negc(d: u64, carry: bool) -> AluResult {
    carry_result(0u64.wrapping_sub(d).wrapping_sub(u64::from(carry)), true)
}

/// `|D| - |S|`, for flags only.
pub(crate) fn cmpm(d: u64, s: u64) -> AluResult {
    sub(magnitude(d), magnitude(s))
}

fn magnitude(value: u64) -> u64 {
    if bit(value, 39) { mask(-sign_extend_40(value)) } else { value }
}

/// INC/DEC test Z over bits 39..16; a carry out of bit 39 sets V and C.
pub(crate) fn inc(d: u64) -> AluResult {
    let raw = d + 1;
    step24(raw, raw >> 16, raw >> 40 != 0)
}

pub(crate) fn dec(d: u64) -> AluResult {
    let raw = d.wrapping_sub(1);
    step24(raw, raw >> 16, d == 0)
}

/// Increment bits 39..16, leaving D0 alone.
pub(crate) fn inc24(d: u64) -> AluResult {
    let high = (d >> 16) + 1;
    step24(d, high, high >> 24 != 0)
}

pub(crate) fn dec24(d: u64) -> AluResult {
    let high = d >> 16;
    step24(d, high.wrapping_sub(1), high == 0)
}

/// `low` supplies D0; `high` supplies bits 39..16.
fn step24(low: u64, high: u64, carry: bool) -> AluResult {
    let value = ((high & 0xFF_FFFF) << 16) | (low & 0xFFFF);
    let mut flags = nzeu(value) & !Z;
    if value >> 16 == 0 {
        flags |= Z;
    }
    if carry {
        flags |= V | C;
    }
    AluResult { value, flags, affected: NZEUV | C }
}

// ================================================================
// Single-operand operations
// ================================================================

pub(crate) fn clr() -> AluResult {
    AluResult { value: 0, flags: nzeu(0), affected: NZEUV }
}

/// Clear bits 39..16.
pub(crate) fn clr24(d: u64) -> AluResult {
    let value = d & 0xFFFF;
    AluResult { value, flags: nzeu(value), affected: NZEUV }
}

pub(crate) fn abs(d: u64) -> AluResult {
    if d == 0x80_0000_0000 {
        let value = 0x7F_FFFF_FFFF;
        return AluResult { value, flags: nzeu(value) | V, affected: NZEUV };
    }
    let value = magnitude(d);
    AluResult { value, flags: nzeu(value), affected: NZEUV }
}

pub(crate) fn neg(d: u64) -> AluResult {
    let value = mask(-sign_extend_40(d));
    let mut flags = nzeu(value);
    if d == 0x80_0000_0000 {
        flags |= V;
    }
    if d != 0 {
        flags |= C;
    }
    AluResult { value, flags, affected: NZEUV | C }
}

pub(crate) fn tst(d: u64) -> AluResult {
    AluResult { value: d, flags: nzeu(d), affected: NZEUV | C }
}

/// TST of a 16-bit register.
pub(crate) fn tst16(word: u16) -> AluResult {
    let mut flags = 0;
    if word & 0x8000 != 0 {
        flags |= N;
    }
    if word == 0 {
        flags |= Z;
    }
    AluResult { value: u64::from(word), flags, affected: N | Z | V | C }
}

// ================================================================
// Logic (D1 only)
// ================================================================

fn logic_result(d: u64, word: u16) -> AluResult {
    let mut flags = 0;
    if word & 0x8000 != 0 {
        flags |= N;
    }
    if word == 0 {
        flags |= Z;
    }
    AluResult { value: with_d1(d, word), flags, affected: N | Z | V }
}

pub(crate) fn and(d: u64, s: u16) -> AluResult {
    logic_result(d, d1(d) & s)
}

pub(crate) fn or(d: u64, s: u16) -> AluResult {
    logic_result(d, d1(d) | s)
}

pub(crate) fn eor(d: u64, s: u16) -> AluResult {
    logic_result(d, d1(d) ^ s)
}

pub(crate) fn not(d: u64) -> AluResult {
    logic_result(d, !d1(d))
}

fn rotate_result(d: u64, word: u16, carry_out: bool) -> AluResult {
    let mut result = logic_result(d, word);
    if carry_out {
        result.flags |= C;
    }
    result.affected |= C;
    result
}

pub(crate) fn lsl(d: u64) -> AluResult {
    let w = d1(d);
    rotate_result(d, w << 1, w & 0x8000 != 0)
}

pub(crate) fn lsr(d: u64) -> AluResult {
    let w = d1(d);
    rotate_result(d, w >> 1, w & 1 != 0)
}

pub(crate) fn rol(d: u64, carry: bool) -> AluResult {
    let w = d1(d);
    rotate_result(d, (w << 1) | u16::from(carry), w & 0x8000 != 0)
}

pub(crate) fn ror(d: u64, carry: bool) -> AluResult {
    let w = d1(d);
    rotate_result(d, (w >> 1) | (u16::from(carry) << 15), w & 1 != 0)
}

// ================================================================
// Arithmetic shifts (full 40 bits)
// ================================================================

/// Shift left by `count` (1..=16).
pub(crate) fn asl(d: u64, count: u32) -> AluResult {
    let value = (d << count) & ACC_MASK;
    let mut flags = nzeu(value);
    if bit(d, 40 - count) {
        flags |= C;
    }
    let top = d >> (39 - count);
    let all = (1u64 << (count + 1)) - 1;
    if top != 0 && top != all {
        flags |= V;
    }
    AluResult { value, flags, affected: NZEUV | C }
}

/// Shift right by `count` (1..=16), sign-filling.
pub(crate) fn asr(d: u64, count: u32) -> AluResult {
    let value = mask(sign_extend_40(d) >> count);
    let mut flags = nzeu(value);
    if bit(d, count - 1) {
        flags |= C;
    }
    AluResult { value, flags, affected: NZEUV | C }
}

// ================================================================
// Rounding and multiplication
// ================================================================

/// Two's-complement rounding at bit 16: the unsigned sum before clearing
/// the low word, so carries out of bit 39 stay visible.
fn round_raw(raw: u64) -> u64 {
    let rounded = if raw & 0x8000 != 0 { raw + 0x1_0000 } else { raw };
    rounded & !0xFFFF
}

pub(crate) fn rnd(d: u64) -> AluResult {
    carry_result(round_raw(d), false)
}

/// Fractional product `(s1 * s2) << 1` in accumulator format.
pub(crate) fn multiply(s1: u16, s2: u16, signedness: Signedness) -> u64 {
    let (a, b) = match signedness {
        Signedness::SignedSigned => (i64::from(s1 as i16), i64::from(s2 as i16)),
        Signedness::SignedUnsigned => (i64::from(s1 as i16), i64::from(s2)),
        Signedness::UnsignedUnsigned => (i64::from(s1), i64::from(s2)),
    };
    mask((a * b) << 1)
}

/// Integer product (no fractional shift) in accumulator format.
pub(crate) fn integer_multiply(s1: u16, s2: u16) -> u64 {
    mask(i64::from(s1 as i16) * i64::from(s2 as i16))
}

fn signed_term(term: u64, negate: bool) -> u64 {
    if negate { mask(-sign_extend_40(term)) } else { term }
}

/// MPY / MPYR: `D = ±term`.
pub(crate) fn mpy(term: u64, negate: bool, round: bool) -> AluResult {
    let mut value = signed_term(term, negate);
    if round {
        value = round_raw(value) & ACC_MASK;
    }
    AluResult { value, flags: nzeu(value), affected: NZEUV }
}

/// MAC / MACR: `D = D ± term`.
pub(crate) fn mac(d: u64, term: u64, negate: bool, round: bool) -> AluResult {
    let sum = d + signed_term(term, negate);
    if round {
        let carried = sum >> 40 != 0;
        let mut result = carry_result(round_raw(sum & ACC_MASK), false);
        if carried {
            result.flags |= V;
        }
        result
    } else {
        carry_result(sum, false)
    }
}

/// DMAC: `D = (D >> 16) + term`, arithmetic shift.
pub(crate) fn dmac(d: u64, term: u64) -> AluResult {
    let shifted = mask(sign_extend_40(d) >> 16);
    carry_result(shifted + term, false)
}

// ================================================================
// Accumulator reshaping
// ================================================================

fn reshape(value: u64) -> AluResult {
    AluResult { value, flags: nzeu(value), affected: NZEUV }
}

/// Sign-extend D1 into D2.
pub(crate) fn ext(d: u64) -> AluResult {
    reshape(long_to_acc(d as u32))
}

/// Clear D2.
pub(crate) fn zero(d: u64) -> AluResult {
    reshape(d & 0xFFFF_FFFF)
}

/// Exchange D1 and D0, then sign-extend the new D1.
pub(crate) fn swap(d: u64) -> AluResult {
    let swapped = ((d & 0xFFFF) << 16) | ((d >> 16) & 0xFFFF);
    reshape(long_to_acc(swapped as u32))
}

/// One non-restoring division step. `s` is the 16-bit divisor.
pub(crate) fn div(d: u64, s: u16, carry: bool) -> AluResult {
    let differ = bit(d, 39) != (s & 0x8000 != 0);
    let shifted = ((d << 1) & ACC_MASK) | u64::from(carry);
    let divisor = word_to_acc(s);
    let value = if differ {
        (shifted + divisor) & ACC_MASK
    } else {
        shifted.wrapping_sub(divisor) & ACC_MASK
    };
    let mut flags = 0;
    if bit(d, 39) != bit(d, 38) {
        flags |= V;
    }
    if !bit(value, 39) {
        flags |= C;
    }
    AluResult { value, flags, affected: V | C }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_sources_sign_extend_into_high_word() {
        assert_eq!(word_to_acc(0x8000), 0xFF_8000_0000);
        assert_eq!(word_to_acc(0x4000), 0x00_4000_0000);
        assert_eq!(long_to_acc(0x8000_0001), 0xFF_8000_0001);
    }

    #[test]
    fn add_wraps_and_flags_overflow() {
        let r = add(0x7F_FFFF_FFFF, 1);
        assert_eq!(r.value, 0x80_0000_0000);
        assert_eq!(r.flags & (V | C), 0);
        assert_ne!(r.flags & N, 0);

        let r = add(0xFF_FFFF_FFFF, 1);
        assert_eq!(r.value, 0);
        assert_ne!(r.flags & Z, 0);
        assert_ne!(r.flags & V, 0);
        assert_ne!(r.flags & C, 0);
    }

    #[test]
    fn sub_borrow_sets_carry() {
        let r = sub(0, 1);
        assert_eq!(r.value, ACC_MASK);
        assert_ne!(r.flags & C, 0);
        let r = sub(5, 3);
        assert_eq!(r.value, 2);
        assert_eq!(r.flags & C, 0);
    }

    #[test]
    fn clear_sets_zero_only() {
        let r = clr();
        assert_eq!(r.value, 0);
        assert_ne!(r.flags & Z, 0);
        assert_eq!(r.flags & (N | V), 0);
        assert_eq!(r.affected & C, 0);
    }

    #[test]
    fn abs_saturates_most_negative() {
        let r = abs(0x80_0000_0000);
        assert_eq!(r.value, 0x7F_FFFF_FFFF);
        assert_ne!(r.flags & V, 0);

        let r = abs(word_to_acc(0xC000));
        assert_eq!(r.value, 0x00_4000_0000);
        assert_eq!(r.flags & V, 0);
    }

    #[test]
    fn mac_adds_shifted_product() {
        let term = multiply(0x4000, 0x4000, Signedness::SignedSigned);
        assert_eq!(term, 0x00_2000_0000);
        let r = mac(0x00_1000_0000, term, false, false);
        assert_eq!(r.value, 0x00_3000_0000);
        assert_eq!(r.affected & C, 0);
    }

    #[test]
    fn mpy_negates_and_rounds() {
        let term = multiply(0x4000, 0x4000, Signedness::SignedSigned);
        assert_eq!(mpy(term, true, false).value, 0xFF_E000_0000);
        assert_eq!(mpy(0x00_0000_8000, false, true).value, 0x00_0001_0000);
        assert_eq!(mpy(0x00_0000_7FFF, false, true).value, 0);
    }

    #[test]
    fn fractional_minus_one_squared_overflows_into_extension() {
        let term = multiply(0x8000, 0x8000, Signedness::SignedSigned);
        assert_eq!(term, 0x00_8000_0000);
        assert_ne!(nzeu(term) & E, 0);
    }

    #[test]
    fn limit_saturates_extended_values() {
        assert_eq!(limit(0x00_1234_0000), (0x1234, false));
        assert_eq!(limit(0xFF_8000_0000), (0x8000, false));
        assert_eq!(limit(0x01_0000_0000), (0x7FFF, true));
        assert_eq!(limit(0xFE_0000_0000), (0x8000, true));
    }

    #[test]
    fn shifts_report_last_bit_out() {
        let r = asl(0x80_0000_0001, 1);
        assert_eq!(r.value, 0x00_0000_0002);
        assert_ne!(r.flags & C, 0);
        assert_ne!(r.flags & V, 0);

        let r = asr(0xFF_0000_0001, 1);
        assert_eq!(r.value, 0xFF_8000_0000);
        assert_ne!(r.flags & C, 0);

        let r = asr(0x00_0001_8000, 16);
        assert_eq!(r.value, 1);
        assert_ne!(r.flags & C, 0);
    }

    #[test]
    fn logic_touches_only_d1() {
        let r = and(0x12_F0F0_5555, 0x0FF0);
        assert_eq!(r.value, 0x12_00F0_5555);
        let r = not(0x00_0000_1234);
        assert_eq!(r.value, 0x00_FFFF_1234);
        assert_ne!(r.flags & N, 0);
    }

    #[test]
    fn rotates_through_carry() {
        let r = rol(0x00_8000_0000, true);
        assert_eq!(r.value, 0x00_0001_0000);
        assert_ne!(r.flags & C, 0);
        let r = ror(0x00_0001_0000, false);
        assert_eq!(r.value, 0);
        assert_ne!(r.flags & (C | Z), 0);
    }

    #[test]
    fn twenty_four_bit_steps_leave_low_word() {
        let r = inc24(0x00_FFFF_1234);
        assert_eq!(r.value, 0x01_0000_1234);
        let r = dec24(0x00_0001_1234);
        assert_eq!(r.value, 0x00_0000_1234);
        assert_ne!(r.flags & Z, 0);
        let r = dec24(0x00_0000_0000);
        assert_eq!(r.value, 0xFF_FFFF_0000);
        assert_ne!(r.flags & C, 0);
    }

    #[test]
    fn full_width_steps_test_z_on_the_high_bits() {
        let r = inc(0x00_0000_FFFE);
        assert_eq!(r.value, 0x00_0000_FFFF);
        assert_ne!(r.flags & Z, 0);
        assert_eq!(r.flags & (V | C), 0);
        let r = inc(0xFF_FFFF_FFFF);
        assert_eq!(r.value, 0);
        assert_eq!(r.flags & (Z | V | C), Z | V | C);
        let r = dec(0);
        assert_eq!(r.value, 0xFF_FFFF_FFFF);
        assert_eq!(r.flags & (N | C), N | C);
    }

    #[test]
    fn mpyr_round_carry_leaves_v_clear() {
        let term = multiply(0xFFFF, 0x4000, Signedness::SignedSigned);
        assert_eq!(term, 0xFF_FFFF_8000);
        let r = mpy(term, false, true);
        assert_eq!(r.value, 0);
        assert_eq!(r.flags & V, 0);
        assert_ne!(r.flags & Z, 0);
    }

    #[test]
    fn swap_and_extend() {
        assert_eq!(swap(0x00_1234_8000).value, 0xFF_8000_1234);
        assert_eq!(ext(0x00_8000_0000).value, 0xFF_8000_0000);
        assert_eq!(zero(0xFF_8000_0000).value, 0x00_8000_0000);
    }

    #[test]
    fn division_step_builds_quotient_in_carry() {
        // 0.25 / 0.5: first step subtracts and yields a non-negative partial.
        let r = div(0x00_2000_0000, 0x4000, false);
        assert_eq!(r.value, 0x00_0000_0000);
        assert_ne!(r.flags & C, 0);
    }
}
