//! Motorola DSP56156 16-bit fixed-point DSP core.
//!
//! An instruction-stepped interpreter for the data ALU (two 40-bit
//! accumulators, X/Y input registers), the address generation unit
//! (R/N/M with linear, modulo and reverse-carry addressing) and the program
//! control unit (hardware stack, DO/REP loops, interrupts).
//!
//! One opcode word can carry a data ALU operation and a parallel move. The
//! two behave as if simultaneous: a move that reads the ALU destination sees
//! its value from before the operation.
//!
//! Memory is external. The host lends a [`emu_core::HarvardBus`] to each
//! [`Dsp56156::step`] call.

mod agu;
mod alu;
mod arith;
mod branches;
pub mod config;
pub mod cpu;
mod decode;
mod ea;
pub mod error;
pub mod flags;
pub mod interrupts;
mod misc;
mod moves;
mod operands;
mod parallel;
mod pcu;
pub mod registers;
pub mod snapshot;

pub use config::{CycleModel, DspConfig};
pub use cpu::{BootstrapMode, Dsp56156, PowerState};
pub use error::SnapshotError;
pub use interrupts::{FastInterrupt, Line, Lines, Source};
pub use registers::{Acc, Register, Registers, StackPair};
pub use snapshot::DspState;
