//! Save states.
//!
//! A `DspState` is everything needed to resume the core bit-for-bit. The
//! binary form is a 4-byte magic, a little-endian `u16` version and a
//! MessagePack payload.

use emu_core::Ticks;
use serde::{Deserialize, Serialize};

use crate::cpu::{BootstrapMode, Dsp56156, PowerState};
use crate::error::SnapshotError;
use crate::interrupts::{FastInterrupt, Lines, Source};
use crate::registers::Registers;

const MAGIC: &[u8; 4] = b"D56K";
const VERSION: u16 = 1;

/// Complete core state, excluding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DspState {
    pub registers: Registers,
    pub lines: Lines,
    pub ipr: u16,
    /// Pending interrupts, oldest first.
    pub pending: Vec<Source>,
    pub fast_interrupt: Option<FastInterrupt>,
    pub power: PowerState,
    pub bootstrap_mode: BootstrapMode,
    pub reset_pending: bool,
    pub ppc: u16,
    /// Service overhead charged to the last step.
    pub interrupt_cycles: u32,
    /// Budget left in the current [`Dsp56156::run`].
    pub cycles_remaining: i32,
    pub total_cycles: Ticks,
}

impl DspState {
    /// Encode with header.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encode`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        let mut out = Vec::with_capacity(128);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        rmp_serde::encode::write(&mut out, self)?;
        Ok(out)
    }

    /// Decode a blob produced by [`DspState::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns an error if the magic or version do not match, or the payload
    /// does not decode.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let rest = bytes.strip_prefix(MAGIC.as_slice()).ok_or(SnapshotError::BadMagic)?;
        let (version, payload) = rest.split_first_chunk::<2>().ok_or(SnapshotError::BadMagic)?;
        let version = u16::from_le_bytes(*version);
        if version != VERSION {
            return Err(SnapshotError::UnsupportedVersion(version));
        }
        Ok(rmp_serde::from_slice(payload)?)
    }
}

impl Dsp56156 {
    #[must_use]
    pub fn snapshot(&self) -> DspState {
        DspState {
            registers: self.regs,
            lines: self.lines,
            ipr: self.interrupts.ipr,
            pending: self.interrupts.pending().to_vec(),
            fast_interrupt: self.fast_interrupt,
            power: self.power,
            bootstrap_mode: self.bootstrap_mode,
            reset_pending: self.reset_pending,
            ppc: self.ppc,
            interrupt_cycles: self.interrupt_cycles,
            cycles_remaining: self.cycles_remaining,
            total_cycles: self.total_cycles,
        }
    }

    /// Resume from a saved state. Configuration is kept.
    pub fn restore(&mut self, state: &DspState) {
        self.regs = state.registers;
        self.lines = state.lines;
        self.interrupts.ipr = state.ipr;
        self.interrupts.set_pending(state.pending.clone());
        self.fast_interrupt = state.fast_interrupt;
        self.power = state.power;
        self.bootstrap_mode = state.bootstrap_mode;
        self.reset_pending = state.reset_pending;
        self.ppc = state.ppc;
        self.interrupt_cycles = state.interrupt_cycles;
        self.cycles_remaining = state.cycles_remaining;
        self.total_cycles = state.total_cycles;
    }
}
