//! Address generation unit.
//!
//! Post-update arithmetic on one `(R, N, M)` triple. The modifier register
//! selects the addressing arithmetic:
//!
//! - `$FFFF`: linear, wrapping at 16 bits
//! - `$0001..=$7FFF`: modulo `M + 1`, buffer based at the lower multiple of
//!   the next power of two
//! - `$0000`: reverse-carry (bit-reversed) for FFT addressing
//!
//! Remaining encodings are treated as linear.

use crate::registers::Registers;

/// A post-update (or pre-update) applied to an address register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Update {
    None,
    Increment,
    Decrement,
    AddOffset,
    SubtractOffset,
}

impl Update {
    /// `MM` field: (Rn), (Rn)+, (Rn)-, (Rn)+Nn.
    pub(crate) fn from_mm(field: u16) -> Self {
        match field & 3 {
            0 => Update::None,
            1 => Update::Increment,
            2 => Update::Decrement,
            _ => Update::AddOffset,
        }
    }

    /// `m` field: (Rn)+, (Rn)+Nn.
    pub(crate) fn from_m(field: u16) -> Self {
        if field & 1 == 0 { Update::Increment } else { Update::AddOffset }
    }

    /// `z` field of the address register update: -Nn, +Nn.
    pub(crate) fn from_z(field: u16) -> Self {
        if field & 1 == 0 { Update::SubtractOffset } else { Update::AddOffset }
    }

    /// `mm` field of the dual read: updates for (first pointer, R3).
    pub(crate) fn dual(field: u16) -> (Self, Self) {
        match field & 3 {
            0 => (Update::Increment, Update::Increment),
            1 => (Update::Increment, Update::AddOffset),
            2 => (Update::AddOffset, Update::Increment),
            _ => (Update::AddOffset, Update::AddOffset),
        }
    }
}

/// Add a signed step to an address under modifier `m`.
pub(crate) fn modify(address: u16, step: i32, m: u16) -> u16 {
    match m {
        0x0000 => reverse_carry_add(address, step as u16),
        0x0001..=0x7FFF => modulo_add(address, step, m),
        _ => (i32::from(address) + step) as u16,
    }
}

fn modulo_add(address: u16, step: i32, m: u16) -> u16 {
    let size = i32::from(m) + 1;
    let block = (m as u32 + 1).next_power_of_two() as i32;
    let base = i32::from(address) & !(block - 1);
    let offset = i32::from(address) - base;
    let wrapped = (offset + step).rem_euclid(size);
    (base + wrapped) as u16
}

fn reverse_carry_add(address: u16, step: u16) -> u16 {
    let sum = address.reverse_bits().wrapping_add(step.reverse_bits());
    sum.reverse_bits()
}

impl Registers {
    /// `R[rr]` after an update, using `N[rr]` and `M[rr]`. Nothing changes.
    pub(crate) fn updated_address(&self, rr: usize, update: Update) -> u16 {
        let step = match update {
            Update::None => return self.r[rr],
            Update::Increment => 1,
            Update::Decrement => -1,
            Update::AddOffset => i32::from(self.n[rr] as i16),
            Update::SubtractOffset => -i32::from(self.n[rr] as i16),
        };
        modify(self.r[rr], step, self.m[rr])
    }

    /// Apply an update to `R[rr]`.
    pub(crate) fn update_address(&mut self, rr: usize, update: Update) {
        self.r[rr] = self.updated_address(rr, update);
    }

    /// `(Rn+Nn)` without updating `Rn`.
    pub(crate) fn indexed_address(&self, rr: usize) -> u16 {
        modify(self.r[rr], i32::from(self.n[rr] as i16), self.m[rr])
    }

    /// Pre-decrement `Rn` and return the new address.
    pub(crate) fn pre_decrement(&mut self, rr: usize) -> u16 {
        self.update_address(rr, Update::Decrement);
        self.r[rr]
    }
}
