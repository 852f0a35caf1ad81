//! Instruction-stepped processor trait.

use crate::{HarvardBus, Ticks};

/// A processor core that retires whole instructions.
///
/// The bus is lent to the core for one step, never owned, so the host can
/// share memory with other chips between steps. Cores expose their internal
/// state for observation and debugging.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// External input lines (interrupt requests, mode pins, reset).
    type Line: Copy;

    /// Retire one instruction, including any interrupt it triggers, and
    /// return the ticks it consumed.
    ///
    /// Zero ticks means the core made no progress (held in reset, waiting
    /// for a bootstrap or sleeping until an interrupt).
    fn step(&mut self, bus: &mut dyn HarvardBus) -> Ticks;

    /// Returns the current program counter.
    fn pc(&self) -> u32;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the core is sleeping or held off the bus.
    fn is_halted(&self) -> bool;

    /// Drive an input line.
    fn set_line(&mut self, line: Self::Line, asserted: bool);

    /// Reset the core, including any memory side effects of leaving reset.
    fn reset(&mut self, bus: &mut dyn HarvardBus);
}
