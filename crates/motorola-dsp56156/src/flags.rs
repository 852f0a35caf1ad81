//! Status register (SR) and operating mode register (OMR) bit definitions.
//!
//! SR layout: `LF FV - - - - I1 I0 | S L E U N Z V C`. The low byte is the
//! condition code register (CCR), the high byte the mode register (MR).

/// Carry.
pub const C: u16 = 1 << 0;
/// Overflow.
pub const V: u16 = 1 << 1;
/// Zero.
pub const Z: u16 = 1 << 2;
/// Negative.
pub const N: u16 = 1 << 3;
/// Unnormalized.
pub const U: u16 = 1 << 4;
/// Extension in use.
pub const E: u16 = 1 << 5;
/// Limit (sticky overflow).
pub const L: u16 = 1 << 6;
/// Scaling.
pub const S: u16 = 1 << 7;
/// Interrupt mask, low bit.
pub const I0: u16 = 1 << 8;
/// Interrupt mask, high bit.
pub const I1: u16 = 1 << 9;
/// DO FOREVER active.
pub const FV: u16 = 1 << 14;
/// Loop flag.
pub const LF: u16 = 1 << 15;

/// Condition code register bits.
pub const CCR: u16 = 0x00FF;
/// Mode register bits.
pub const MR: u16 = 0xFF00;

/// OMR operating mode A (latched from MODA at reset).
pub const OMR_MA: u8 = 1 << 0;
/// OMR operating mode B (latched from MODB at reset).
pub const OMR_MB: u8 = 1 << 1;

/// Current interrupt mask level (I1:I0).
#[must_use]
pub fn interrupt_mask(sr: u16) -> u8 {
    ((sr >> 8) & 3) as u8
}

/// Evaluate a `cccc` condition against the CCR.
#[must_use]
pub fn condition(sr: u16, cccc: u16) -> bool {
    let c = sr & C != 0;
    let v = sr & V != 0;
    let z = sr & Z != 0;
    let n = sr & N != 0;
    let u = sr & U != 0;
    let e = sr & E != 0;
    let l = sr & L != 0;
    let normalized = z || (!u && !e);
    let greater = !(z || (n != v));

    match cccc & 0xF {
        0x0 => !c,          // CC/HS
        0x1 => n == v,      // GE
        0x2 => !z,          // NE
        0x3 => !n,          // PL
        0x4 => !normalized, // NN
        0x5 => !e,          // EC
        0x6 => !l,          // LC
        0x7 => greater,     // GT
        0x8 => c,           // CS/LO
        0x9 => n != v,      // LT
        0xA => z,           // EQ
        0xB => n,           // MI
        0xC => normalized,  // NR
        0xD => e,           // ES
        0xE => l,           // LS
        _ => !greater,      // LE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_and_not_equal_follow_zero() {
        assert!(condition(Z, 0xA));
        assert!(!condition(Z, 0x2));
        assert!(condition(0, 0x2));
    }

    #[test]
    fn signed_comparisons_use_n_xor_v() {
        assert!(condition(N, 0x9)); // LT
        assert!(condition(N | V, 0x1)); // GE
        assert!(condition(0, 0x7)); // GT
        assert!(condition(Z, 0xF)); // LE
    }

    #[test]
    fn normalized_conditions() {
        assert!(condition(0, 0xC)); // NR
        assert!(condition(U, 0x4)); // NN
        assert!(condition(E, 0x4));
        assert!(condition(Z | E, 0xC));
    }

    #[test]
    fn mask_level_reads_i1_i0() {
        assert_eq!(interrupt_mask(I1 | I0 | C), 3);
        assert_eq!(interrupt_mask(I0), 1);
    }
}
