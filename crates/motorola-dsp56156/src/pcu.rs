//! Program control unit: hardware stack and DO/REP loops.
//!
//! The stack holds 15 usable `(SSH, SSL)` pairs. SP bits 3..0 point at the
//! top pair (0 = empty). Overflow sets SE, underflow sets UF, and both raise
//! the stack error interrupt without touching the stack.
//!
//! A DO loop pushes `(LA, LC)` and then `(body start, SR)`. After every
//! retired instruction the loop processor compares PC with LA, the address
//! just past the last body instruction. REP saves LC in TEMP and replays the
//! following instruction until LC runs out.

use emu_core::HarvardBus;

use crate::cpu::Dsp56156;
use crate::decode::{Exec, instruction_words};
use crate::flags::{self, FV, LF};
use crate::interrupts::Source;
use crate::operands::{self, Width};
use crate::registers::{SP_POINTER, SP_SE, SP_UF, StackPair};

impl Dsp56156 {
    // === Hardware stack ===

    pub(crate) fn push_stack(&mut self, high: u16, low: u16) {
        let pointer = self.regs.sp & SP_POINTER;
        if pointer == SP_POINTER {
            log::debug!("stack overflow at P:${:04X}", self.ppc);
            self.regs.sp |= SP_SE;
            self.interrupts.raise(Source::StackError);
            return;
        }
        let pointer = pointer + 1;
        self.regs.sp = (self.regs.sp & !SP_POINTER) | pointer;
        self.regs.ss[usize::from(pointer)] = StackPair { high, low };
    }

    /// Pop the top pair. An empty stack returns pair 0 and flags underflow.
    pub(crate) fn pop_stack(&mut self) -> StackPair {
        let pointer = self.regs.sp & SP_POINTER;
        if pointer == 0 {
            log::debug!("stack underflow at P:${:04X}", self.ppc);
            self.regs.sp |= SP_UF;
            self.interrupts.raise(Source::StackError);
            return self.regs.ss[0];
        }
        let pair = self.regs.ss[usize::from(pointer)];
        self.regs.sp = (self.regs.sp & !SP_POINTER) | (pointer - 1);
        pair
    }

    /// A move to SSH: push, keeping whatever SSL the new slot held.
    pub(crate) fn push_high(&mut self, high: u16) {
        let next = (self.regs.stack_index() + 1) & usize::from(SP_POINTER);
        let low = self.regs.ss[next].low;
        self.push_stack(high, low);
    }

    /// RTS/RTI on an empty stack raise a stack error and leave SP alone.
    pub(crate) fn stack_empty(&mut self) -> bool {
        if self.regs.sp & SP_POINTER != 0 {
            return false;
        }
        log::debug!("return with empty stack at P:${:04X}", self.ppc);
        self.interrupts.raise(Source::StackError);
        true
    }

    // === Loop processing ===

    fn begin_loop(&mut self, count: Option<u16>, end: u16) -> Exec {
        if count == Some(0) {
            self.regs.pc = end;
            return Exec::jump(10);
        }
        let (la, lc) = (self.regs.la, self.regs.lc);
        self.push_stack(la, lc);
        self.regs.la = end;
        if let Some(count) = count {
            self.regs.lc = count;
        }
        let (start, sr) = (self.regs.pc.wrapping_add(2), self.regs.sr);
        self.push_stack(start, sr);
        self.regs.sr |= LF;
        if count.is_none() {
            self.regs.sr |= FV;
        } else {
            self.regs.sr &= !FV;
        }
        Exec::next(2, 6)
    }

    /// Leave the innermost loop: restore SR, then LA and LC.
    pub(crate) fn end_loop(&mut self) {
        let frame = self.pop_stack();
        self.regs.sr = frame.low;
        let outer = self.pop_stack();
        self.regs.la = outer.high;
        self.regs.lc = outer.low;
    }

    /// Runs after every instruction outside a fast interrupt.
    pub(crate) fn process_loops(&mut self) {
        let sr = self.regs.sr;
        if sr & (LF | FV) == 0 || self.regs.pc != self.regs.la {
            return;
        }
        if sr & FV != 0 {
            self.regs.lc = self.regs.lc.wrapping_sub(1);
            self.regs.pc = self.regs.ssh();
        } else if self.regs.lc <= 1 {
            self.end_loop();
        } else {
            self.regs.lc -= 1;
            self.regs.pc = self.regs.ssh();
        }
    }

    /// Replay the repeated instruction (`words` long) until LC runs out.
    pub(crate) fn process_rep(&mut self, words: u16) {
        if !self.regs.rep_flag || self.regs.pc != self.regs.rep_addr {
            return;
        }
        if self.regs.lc <= 1 {
            self.regs.lc = self.regs.temp;
            self.regs.rep_flag = false;
        } else {
            self.regs.lc -= 1;
            self.regs.pc = self.regs.pc.wrapping_sub(words);
        }
    }

    fn begin_repeat(&mut self, bus: &mut dyn HarvardBus, count: u16) -> Exec {
        if count == 0 {
            return Exec::next(1, 6);
        }
        let next = self.regs.pc.wrapping_add(1);
        let op = self.read_p(bus, next);
        let op2 = self.read_p(bus, next.wrapping_add(1));
        self.regs.temp = self.regs.lc;
        self.regs.lc = count;
        self.regs.rep_flag = true;
        self.regs.rep_addr = next.wrapping_add(instruction_words(op, op2));
        Exec::next(1, 4)
    }

    fn register_count(&mut self, bus: &mut dyn HarvardBus, op: u16) -> Option<u16> {
        let Some(reg) = operands::ddddd(op) else {
            log::warn!("reserved DDDDD register in ${op:04X} at P:${:04X}", self.ppc);
            return None;
        };
        Some(self.read_as(bus, reg.into(), Width::Word, None) as u16)
    }

    // ================================================================
    // DO: count, then the loop end address in the second word
    // ================================================================

    /// `0000 0000 110- --RR`: count from X:(Rn).
    pub(crate) fn op_do_indirect(&mut self, bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        let address = self.regs.r[usize::from(op & 3)];
        let count = self.read_x(bus, address);
        self.begin_loop(Some(count), op2)
    }

    /// `0000 1110 iiii iiii`.
    pub(crate) fn op_do_immediate(&mut self, _bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        self.begin_loop(Some(op & 0xFF), op2)
    }

    /// `0000 0100 000D DDDD`.
    pub(crate) fn op_do_register(&mut self, bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        match self.register_count(bus, op) {
            Some(count) => self.begin_loop(Some(count), op2),
            None => Exec::next(2, 6),
        }
    }

    /// `0000 0000 0000 0010`.
    pub(crate) fn op_do_forever(&mut self, _bus: &mut dyn HarvardBus, _op: u16, op2: u16) -> Exec {
        self.begin_loop(None, op2)
    }

    pub(crate) fn op_enddo(&mut self, _bus: &mut dyn HarvardBus, _op: u16, _op2: u16) -> Exec {
        self.end_loop();
        Exec::next(1, 2)
    }

    /// BRKcc `0000 0001 0001 cccc`: leave the loop at LA.
    pub(crate) fn op_brkcc(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        if !flags::condition(self.regs.sr, op & 0xF) {
            return Exec::next(1, 4);
        }
        let target = self.regs.la;
        self.end_loop();
        self.regs.pc = target;
        Exec::jump(4)
    }

    // ================================================================
    // REP
    // ================================================================

    /// `0000 0000 111- --RR`: count from X:(Rn).
    pub(crate) fn op_rep_indirect(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let address = self.regs.r[usize::from(op & 3)];
        let count = self.read_x(bus, address);
        self.begin_repeat(bus, count)
    }

    /// `0000 1111 iiii iiii`.
    pub(crate) fn op_rep_immediate(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        self.begin_repeat(bus, op & 0xFF)
    }

    /// `0000 0100 001D DDDD`.
    pub(crate) fn op_rep_register(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        match self.register_count(bus, op) {
            Some(count) => self.begin_repeat(bus, count),
            None => Exec::next(1, 6),
        }
    }
}
