//! Core traits and types shared by the emulated chips.
//!
//! Processors retire whole instructions and report the master clock ticks
//! each one took. Memory sits on the host side of a bus trait, so a board
//! driver can wire several chips to the same RAM and schedule them itself.

mod bus;
mod cpu;
mod observable;
mod ticks;

pub use bus::{HarvardBus, WordMemory};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
