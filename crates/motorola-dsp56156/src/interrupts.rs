//! Interrupt controller.
//!
//! Sources are queued in the order they are raised, without duplicates. At
//! each instruction boundary the highest-priority serviceable source is taken
//! (oldest first on a tie) and serviced as a fast interrupt: the two words at
//! its vector run inline and execution resumes at the interrupted PC. A
//! JSR/JScc in those words turns it into a long interrupt (see `branches.rs`).
//!
//! Priority comes from the IPR:
//!
//! | Bits   | Source group |
//! |--------|--------------|
//! | 1..0   | IRQA level (00 = disabled), bit 2 = edge-triggered |
//! | 4..3   | IRQB level (00 = disabled), bit 5 = edge-triggered |
//! | 7..6   | Codec |
//! | 9..8   | Timer |
//! | 11..10 | Host |
//! | 13..12 | SSI0 |
//! | 15..14 | SSI1 |
//!
//! Levels 01/10/11 map to priorities 0/1/2. RESET, illegal instruction,
//! stack error and SWI are level 3 and cannot be masked.

use emu_core::HarvardBus;
use serde::{Deserialize, Serialize};

use crate::cpu::{Dsp56156, PowerState};
use crate::flags::interrupt_mask;

/// Interrupt sources in vector order. The vector is `index * 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    HardwareReset,
    IllegalInstruction,
    StackError,
    Reserved3,
    SoftwareInterrupt,
    IrqA,
    IrqB,
    Reserved7,
    Ssi0ReceiveException,
    Ssi0Receive,
    Ssi0TransmitException,
    Ssi0Transmit,
    Ssi1ReceiveException,
    Ssi1Receive,
    Ssi1TransmitException,
    Ssi1Transmit,
    TimerOverflow,
    TimerCompare,
    HostDmaReceive,
    HostDmaTransmit,
    HostReceive,
    HostTransmit,
    HostCommand,
    CodecReceiveTransmit,
}

impl Source {
    pub const ALL: [Source; 24] = [
        Source::HardwareReset,
        Source::IllegalInstruction,
        Source::StackError,
        Source::Reserved3,
        Source::SoftwareInterrupt,
        Source::IrqA,
        Source::IrqB,
        Source::Reserved7,
        Source::Ssi0ReceiveException,
        Source::Ssi0Receive,
        Source::Ssi0TransmitException,
        Source::Ssi0Transmit,
        Source::Ssi1ReceiveException,
        Source::Ssi1Receive,
        Source::Ssi1TransmitException,
        Source::Ssi1Transmit,
        Source::TimerOverflow,
        Source::TimerCompare,
        Source::HostDmaReceive,
        Source::HostDmaTransmit,
        Source::HostReceive,
        Source::HostTransmit,
        Source::HostCommand,
        Source::CodecReceiveTransmit,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Program address of the two-word vector.
    #[must_use]
    pub fn vector(self) -> u16 {
        self as u16 * 2
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Source::HardwareReset => "Hardware RESET",
            Source::IllegalInstruction => "Illegal Instruction",
            Source::StackError => "Stack Error",
            Source::Reserved3 | Source::Reserved7 => "Reserved",
            Source::SoftwareInterrupt => "SWI",
            Source::IrqA => "IRQA",
            Source::IrqB => "IRQB",
            Source::Ssi0ReceiveException => "SSI0 Receive Data with Exception",
            Source::Ssi0Receive => "SSI0 Receive Data",
            Source::Ssi0TransmitException => "SSI0 Transmit Data with Exception",
            Source::Ssi0Transmit => "SSI0 Transmit Data",
            Source::Ssi1ReceiveException => "SSI1 Receive Data with Exception",
            Source::Ssi1Receive => "SSI1 Receive Data",
            Source::Ssi1TransmitException => "SSI1 Transmit Data with Exception",
            Source::Ssi1Transmit => "SSI1 Transmit Data",
            Source::TimerOverflow => "Timer Overflow",
            Source::TimerCompare => "Timer Compare",
            Source::HostDmaReceive => "Host DMA Receive Data",
            Source::HostDmaTransmit => "Host DMA Transmit Data",
            Source::HostReceive => "Host Receive Data",
            Source::HostTransmit => "Host Transmit Data",
            Source::HostCommand => "Host Command",
            Source::CodecReceiveTransmit => "Codec Receive/Transmit",
        }
    }
}

/// External input lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Line {
    /// MODA/IRQA.
    ModeA,
    /// MODB/IRQB.
    ModeB,
    /// MODC.
    ModeC,
    Reset,
}

/// Sampled state of the input lines (true = asserted).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lines {
    pub mod_a: bool,
    pub mod_b: bool,
    pub mod_c: bool,
    pub reset: bool,
}

impl Lines {
    #[must_use]
    pub fn get(&self, line: Line) -> bool {
        match line {
            Line::ModeA => self.mod_a,
            Line::ModeB => self.mod_b,
            Line::ModeC => self.mod_c,
            Line::Reset => self.reset,
        }
    }

    pub fn set(&mut self, line: Line, asserted: bool) {
        match line {
            Line::ModeA => self.mod_a = asserted,
            Line::ModeB => self.mod_b = asserted,
            Line::ModeC => self.mod_c = asserted,
            Line::Reset => self.reset = asserted,
        }
    }
}

/// A fast interrupt in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastInterrupt {
    pub vector: u16,
    /// PC of the interrupted instruction stream.
    pub return_pc: u16,
    pub level: u8,
}

/// Pending queue and priority register.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct InterruptController {
    pending: Vec<Source>,
    pub ipr: u16,
}

fn ipr_level(ipr: u16, shift: u32) -> Option<u8> {
    match (ipr >> shift) & 3 {
        0 => None,
        bits => Some(bits as u8 - 1),
    }
}

impl InterruptController {
    pub(crate) fn raise(&mut self, source: Source) {
        if !self.pending.contains(&source) {
            log::debug!("{} interrupt pending", source.name());
            self.pending.push(source);
        }
    }

    pub(crate) fn clear(&mut self, source: Source) {
        self.pending.retain(|&s| s != source);
    }

    pub(crate) fn pending(&self) -> &[Source] {
        &self.pending
    }

    pub(crate) fn set_pending(&mut self, pending: Vec<Source>) {
        self.pending = pending;
    }

    /// Priority of `source` under the current IPR; `None` when disabled.
    pub(crate) fn level(&self, source: Source) -> Option<u8> {
        let ipr = self.ipr;
        match source {
            Source::HardwareReset
            | Source::IllegalInstruction
            | Source::StackError
            | Source::SoftwareInterrupt => Some(3),
            Source::Reserved3 | Source::Reserved7 => None,
            Source::IrqA => ipr_level(ipr, 0),
            Source::IrqB => ipr_level(ipr, 3),
            Source::CodecReceiveTransmit => ipr_level(ipr, 6),
            Source::TimerOverflow | Source::TimerCompare => ipr_level(ipr, 8),
            Source::HostDmaReceive
            | Source::HostDmaTransmit
            | Source::HostReceive
            | Source::HostTransmit
            | Source::HostCommand => ipr_level(ipr, 10),
            Source::Ssi0ReceiveException
            | Source::Ssi0Receive
            | Source::Ssi0TransmitException
            | Source::Ssi0Transmit => ipr_level(ipr, 12),
            Source::Ssi1ReceiveException
            | Source::Ssi1Receive
            | Source::Ssi1TransmitException
            | Source::Ssi1Transmit => ipr_level(ipr, 14),
        }
    }

    /// IRQA/IRQB trigger on the asserting edge rather than the level.
    pub(crate) fn edge_triggered(&self, source: Source) -> bool {
        match source {
            Source::IrqA => self.ipr & (1 << 2) != 0,
            Source::IrqB => self.ipr & (1 << 5) != 0,
            _ => false,
        }
    }

    /// The source to service under interrupt mask `mask`, with its level.
    pub(crate) fn next(&self, mask: u8) -> Option<(Source, u8)> {
        let mut best: Option<(Source, u8)> = None;
        for &source in &self.pending {
            let Some(level) = self.level(source) else {
                continue;
            };
            if level < 3 && level < mask {
                continue;
            }
            if best.is_none_or(|(_, best_level)| level > best_level) {
                best = Some((source, level));
            }
        }
        best
    }
}

fn irq_source(line: Line) -> Option<Source> {
    match line {
        Line::ModeA => Some(Source::IrqA),
        Line::ModeB => Some(Source::IrqB),
        Line::ModeC | Line::Reset => None,
    }
}

impl Dsp56156 {
    /// Drive an input line.
    ///
    /// Deasserting RESET resets the core; the memory side of the reset
    /// (idle-loop seed, operating mode) runs at the start of the next step.
    pub fn set_line(&mut self, line: Line, asserted: bool) {
        let was = self.lines.get(line);
        self.lines.set(line, asserted);

        if line == Line::Reset {
            if was && !asserted {
                log::debug!("RESET released");
                self.reset_core();
                self.reset_pending = true;
            }
            return;
        }

        let Some(source) = irq_source(line) else {
            return;
        };
        if asserted
            && !was
            && !self.lines.reset
            && self.interrupts.edge_triggered(source)
            && self.interrupts.level(source).is_some()
        {
            self.interrupts.raise(source);
        }
    }

    /// Queue an interrupt from a peripheral or the host.
    pub fn raise_interrupt(&mut self, source: Source) {
        self.interrupts.raise(source);
    }

    /// Level-triggered IRQs follow their line.
    fn sample_irq_levels(&mut self) {
        for line in [Line::ModeA, Line::ModeB] {
            let Some(source) = irq_source(line) else {
                continue;
            };
            if self.interrupts.edge_triggered(source) {
                continue;
            }
            if self.lines.get(line) && self.interrupts.level(source).is_some() {
                self.interrupts.raise(source);
            } else {
                self.interrupts.clear(source);
            }
        }
    }

    /// Take the best pending interrupt, if any. Returns true if one was
    /// serviced.
    pub(crate) fn service_interrupts(&mut self, bus: &mut dyn HarvardBus) -> bool {
        if self.lines.reset {
            return false;
        }
        self.sample_irq_levels();
        if self.regs.rep_flag || self.fast_interrupt.is_some() {
            return false;
        }
        let Some((source, level)) = self.interrupts.next(interrupt_mask(self.regs.sr)) else {
            return false;
        };
        self.interrupts.clear(source);
        self.power = PowerState::Running;

        if source == Source::HardwareReset {
            log::debug!("servicing hardware RESET");
            self.reset(bus);
            return true;
        }

        let vector = source.vector();
        log::debug!(
            "servicing {} at P:${vector:04X}, return to P:${:04X}",
            source.name(),
            self.regs.pc
        );
        self.fast_interrupt = Some(FastInterrupt { vector, return_pc: self.regs.pc, level });
        self.regs.pc = vector;
        self.interrupt_cycles += 2;
        true
    }

    /// End a fast interrupt once both vector words have run.
    pub(crate) fn check_fast_return(&mut self) {
        let Some(context) = self.fast_interrupt else {
            return;
        };
        let pc = self.regs.pc;
        if pc == context.vector.wrapping_add(2) {
            self.regs.pc = context.return_pc;
            self.fast_interrupt = None;
        } else if pc.wrapping_sub(context.vector) >= 2 {
            self.fast_interrupt = None;
        }
    }
}
