//! Branches, jumps, subroutine calls and returns.
//!
//! Branch displacements are relative to the address of the branch itself.
//! Conditions use the `cccc` field (see `flags::condition`).

use emu_core::HarvardBus;

use crate::cpu::Dsp56156;
use crate::decode::Exec;
use crate::flags::{self, I0, I1};
use crate::operands;

/// A JSR/JScc fetched below this address during a fast interrupt makes it a
/// long interrupt.
const VECTOR_TABLE_END: u16 = 0x28;

fn condition_field(op: u16) -> u16 {
    op & 0xF
}

fn pointer(op: u16, shift: u32) -> usize {
    usize::from((op >> shift) & 3)
}

impl Dsp56156 {
    fn branch_if(&mut self, taken: bool, target: u16, words: u16) -> Exec {
        if taken {
            self.regs.pc = target;
            Exec::jump(4)
        } else {
            Exec::next(words, 4)
        }
    }

    fn relative(&self, displacement: u16) -> u16 {
        self.regs.pc.wrapping_add(displacement)
    }

    fn call(&mut self, target: u16, return_pc: u16) -> Exec {
        let sr = self.regs.sr;
        self.push_stack(return_pc, sr);
        self.regs.pc = target;
        Exec::jump(4)
    }

    /// JSR/JScc: inside the vector words of a fast interrupt this becomes a
    /// long interrupt that returns to the interrupted stream.
    fn call_from_vector(&mut self, target: u16, return_pc: u16) -> Exec {
        match self.fast_interrupt {
            Some(context) if self.ppc < VECTOR_TABLE_END => {
                log::debug!(
                    "long interrupt from P:${:04X}, return to P:${:04X}",
                    context.vector,
                    context.return_pc
                );
                let sr = self.regs.sr;
                self.push_stack(context.return_pc, sr);
                self.regs.sr = (sr & !(I1 | I0)) | (u16::from(context.level) << 8);
                self.regs.pc = target;
                self.fast_interrupt = None;
                Exec::jump(4)
            }
            _ => self.call(target, return_pc),
        }
    }

    fn holds(&self, op: u16) -> bool {
        flags::condition(self.regs.sr, condition_field(op))
    }

    // ================================================================
    // Bcc / BRA / BScc / BSR
    //
    // Long:     0000 0111 --11 cccc + displacement (pc + 2 + xxxx)
    // Short:    0010 11cc ccee eeee (pc + 1 + sign-extended e)
    // Register: 0000 0111 RR10 cccc (pc + 1 + Rn)
    // ================================================================

    pub(crate) fn op_bcc_long(&mut self, _bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        let target = self.relative(op2.wrapping_add(2));
        let taken = self.holds(op);
        self.branch_if(taken, target, 2)
    }

    pub(crate) fn op_bcc_short(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let target = self.relative(operands::sign_extend_6(op & 0x3F).wrapping_add(1));
        let taken = flags::condition(self.regs.sr, (op >> 6) & 0xF);
        self.branch_if(taken, target, 1)
    }

    pub(crate) fn op_bcc_register(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let target = self.relative(self.regs.r[pointer(op, 6)].wrapping_add(1));
        let taken = self.holds(op);
        self.branch_if(taken, target, 1)
    }

    /// `0000 0001 0011 11--` + displacement.
    pub(crate) fn op_bra_long(&mut self, _bus: &mut dyn HarvardBus, _op: u16, op2: u16) -> Exec {
        let target = self.relative(op2.wrapping_add(2));
        self.branch_if(true, target, 2)
    }

    /// `0000 1011 aaaa aaaa`.
    pub(crate) fn op_bra_short(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let target = self.relative(operands::sign_extend_8(op & 0xFF).wrapping_add(1));
        self.branch_if(true, target, 1)
    }

    /// `0000 0001 0010 11RR`.
    pub(crate) fn op_bra_register(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let target = self.relative(self.regs.r[pointer(op, 0)].wrapping_add(1));
        self.branch_if(true, target, 1)
    }

    /// `0000 0111 --01 cccc` + displacement.
    pub(crate) fn op_bscc_long(&mut self, _bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        if !self.holds(op) {
            return Exec::next(2, 4);
        }
        let target = self.relative(op2.wrapping_add(2));
        let return_pc = self.regs.pc.wrapping_add(2);
        self.call(target, return_pc)
    }

    /// `0000 0111 RR00 cccc`.
    pub(crate) fn op_bscc_register(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        if !self.holds(op) {
            return Exec::next(1, 4);
        }
        let target = self.relative(self.regs.r[pointer(op, 6)].wrapping_add(1));
        let return_pc = self.regs.pc.wrapping_add(1);
        self.call(target, return_pc)
    }

    /// `0000 0001 0011 10--` + displacement.
    pub(crate) fn op_bsr_long(&mut self, _bus: &mut dyn HarvardBus, _op: u16, op2: u16) -> Exec {
        let target = self.relative(op2.wrapping_add(2));
        let return_pc = self.regs.pc.wrapping_add(2);
        self.call(target, return_pc)
    }

    /// `0000 0001 0010 10RR`.
    pub(crate) fn op_bsr_register(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let target = self.relative(self.regs.r[pointer(op, 0)].wrapping_add(1));
        let return_pc = self.regs.pc.wrapping_add(1);
        self.call(target, return_pc)
    }

    // ================================================================
    // Jcc / JMP / JScc / JSR: absolute targets
    // ================================================================

    /// `0000 0110 --11 cccc` + address.
    pub(crate) fn op_jcc_long(&mut self, _bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        let taken = self.holds(op);
        self.branch_if(taken, op2, 2)
    }

    /// `0000 0110 RR10 cccc`.
    pub(crate) fn op_jcc_register(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let target = self.regs.r[pointer(op, 6)];
        let taken = self.holds(op);
        self.branch_if(taken, target, 1)
    }

    /// `0000 0001 0011 01--` + address.
    pub(crate) fn op_jmp_long(&mut self, _bus: &mut dyn HarvardBus, _op: u16, op2: u16) -> Exec {
        self.branch_if(true, op2, 2)
    }

    /// `0000 0001 0010 01RR`.
    pub(crate) fn op_jmp_register(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let target = self.regs.r[pointer(op, 0)];
        self.branch_if(true, target, 1)
    }

    /// `0000 0110 --01 cccc` + address.
    pub(crate) fn op_jscc_long(&mut self, _bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        if !self.holds(op) {
            return Exec::next(2, 4);
        }
        let return_pc = self.regs.pc.wrapping_add(2);
        self.call_from_vector(op2, return_pc)
    }

    /// `0000 0110 RR00 cccc`.
    pub(crate) fn op_jscc_register(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        if !self.holds(op) {
            return Exec::next(1, 4);
        }
        let target = self.regs.r[pointer(op, 6)];
        let return_pc = self.regs.pc.wrapping_add(1);
        self.call_from_vector(target, return_pc)
    }

    /// `0000 0001 0011 00--` + address.
    pub(crate) fn op_jsr_long(&mut self, _bus: &mut dyn HarvardBus, _op: u16, op2: u16) -> Exec {
        let return_pc = self.regs.pc.wrapping_add(2);
        self.call_from_vector(op2, return_pc)
    }

    /// `0000 1010 aaaa aaaa`: short absolute.
    pub(crate) fn op_jsr_short(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let return_pc = self.regs.pc.wrapping_add(1);
        self.call_from_vector(op & 0xFF, return_pc)
    }

    /// `0000 0001 0010 00RR`.
    pub(crate) fn op_jsr_register(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let target = self.regs.r[pointer(op, 0)];
        let return_pc = self.regs.pc.wrapping_add(1);
        self.call_from_vector(target, return_pc)
    }

    // ================================================================
    // Returns
    // ================================================================

    pub(crate) fn op_rts(&mut self, _bus: &mut dyn HarvardBus, _op: u16, _op2: u16) -> Exec {
        if self.stack_empty() {
            return Exec::next(1, 4);
        }
        self.regs.pc = self.pop_stack().high;
        Exec::jump(4)
    }

    pub(crate) fn op_rti(&mut self, _bus: &mut dyn HarvardBus, _op: u16, _op2: u16) -> Exec {
        if self.stack_empty() {
            return Exec::next(1, 4);
        }
        let frame = self.pop_stack();
        self.regs.pc = frame.high;
        self.regs.sr = frame.low;
        Exec::jump(4)
    }
}
