//! Non-parallel data moves: MOVE(C), MOVE(I), MOVE(M), MOVE(P), MOVE(S),
//! the displaced MOVE forms, LEA, Tcc and TFR(3).
//!
//! The `W` bit reads memory into the register when set and writes the
//! register out when clear.

use emu_core::HarvardBus;

use crate::agu::Update;
use crate::alu::AluDest;
use crate::cpu::Dsp56156;
use crate::decode::Exec;
use crate::flags;
use crate::operands::{self, Operand, Reg};
use crate::registers::Acc;

fn reads_memory(field: u16) -> bool {
    field & 1 != 0
}

impl Dsp56156 {
    /// Move between a register operand and a memory (or immediate) operand.
    fn memory_move(
        &mut self,
        bus: &mut dyn HarvardBus,
        reg: Reg,
        memory: Operand,
        read: bool,
        alias: Option<AluDest>,
    ) {
        if read {
            self.transfer(bus, memory, reg.into(), alias);
        } else {
            self.transfer(bus, reg.into(), memory, alias);
        }
    }

    fn control_register(&self, field: u16, op: u16) -> Option<Reg> {
        let reg = operands::ddddd(field);
        if reg.is_none() {
            log::warn!("reserved DDDDD register in ${op:04X} at P:${:04X}", self.ppc);
        }
        reg
    }

    fn displaced_address(&self, op: u16) -> u16 {
        self.regs.r[2].wrapping_add(operands::sign_extend_8(op & 0xFF))
    }

    // ================================================================
    // Short displacement: 0000 0101 BBBB BBBB | second word
    // ================================================================

    /// MOVE(C) X:(R2+xx): second word `0011 1WDD DDD0 ----`.
    pub(crate) fn op_movec_displaced(&mut self, bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        if let Some(reg) = self.control_register(op2 >> 5, op2) {
            let address = self.displaced_address(op);
            self.memory_move(bus, reg, Operand::x_memory(address), reads_memory(op2 >> 10), None);
        }
        Exec::next(2, 4)
    }

    /// MOVE(M) P:(R2+xx): second word `0000 001W --0- -HHH`.
    pub(crate) fn op_movem_displaced(&mut self, bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        let address = self.displaced_address(op);
        let reg = operands::hhh(op2);
        self.memory_move(bus, reg, Operand::p_memory(address), reads_memory(op2 >> 8), None);
        Exec::next(2, 4)
    }

    /// MOVE X:(R2+xx) with no data ALU operation: second word `---- HHHW 0000 0000`.
    pub(crate) fn op_move_displaced(&mut self, bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        let address = self.displaced_address(op);
        self.x_move(bus, address, op2, None);
        Exec::next(2, 4)
    }

    // ================================================================
    // MOVE(C): 0011 1WDD DDD. ....
    // ================================================================

    /// `0011 1WDD DDD0 MMRR`: X:(Rn) with post-update.
    pub(crate) fn op_movec_indirect(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let rr = usize::from(op & 3);
        if let Some(reg) = self.control_register(op >> 5, op) {
            let address = self.regs.r[rr];
            self.memory_move(bus, reg, Operand::x_memory(address), reads_memory(op >> 10), None);
        }
        self.regs.update_address(rr, Update::from_mm(op >> 2));
        Exec::next(1, 2)
    }

    /// `0011 1WDD DDD1 q0RR`: X:(Rn+Nn) or X:-(Rn).
    pub(crate) fn op_movec_indexed(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let rr = usize::from(op & 3);
        let address = if op & 0x08 == 0 {
            self.regs.indexed_address(rr)
        } else {
            self.regs.pre_decrement(rr)
        };
        if let Some(reg) = self.control_register(op >> 5, op) {
            self.memory_move(bus, reg, Operand::x_memory(address), reads_memory(op >> 10), None);
        }
        Exec::next(1, 4)
    }

    /// `0011 1WDD DDD1 Z11-`: X:(A1) or X:(B1).
    pub(crate) fn op_movec_accumulator(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let address = self.regs.acc1(Acc::from_bit(op >> 3));
        if let Some(reg) = self.control_register(op >> 5, op) {
            self.memory_move(bus, reg, Operand::x_memory(address), reads_memory(op >> 10), None);
        }
        Exec::next(1, 2)
    }

    /// `0011 1WDD DDD1 t10-` + word: X:abs (t = 0) or #xxxx (t = 1).
    pub(crate) fn op_movec_long(&mut self, bus: &mut dyn HarvardBus, op: u16, op2: u16) -> Exec {
        let memory = if op & 0x08 == 0 { Operand::x_memory(op2) } else { Operand::immediate(op2) };
        if let Some(reg) = self.control_register(op >> 5, op) {
            self.memory_move(bus, reg, memory, reads_memory(op >> 10), None);
        }
        Exec::next(2, 4)
    }

    /// `0010 10dd dddD DDDD`: register to register.
    pub(crate) fn op_movec_register(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let src = self.control_register(op >> 5, op);
        let dst = self.control_register(op, op);
        if let (Some(src), Some(dst)) = (src, dst) {
            self.transfer(bus, src.into(), dst.into(), None);
        }
        Exec::next(1, 2)
    }

    /// MOVE(I) `0010 00DD iiii iiii`: sign-extended 8-bit immediate.
    pub(crate) fn op_movei(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let value = operands::sign_extend_8(op & 0xFF);
        let dst = operands::dd(op >> 8);
        self.transfer(bus, Operand::immediate(value), dst.into(), None);
        Exec::next(1, 2)
    }

    // ================================================================
    // MOVE(M): program memory
    // ================================================================

    /// `0000 001W RR0M MHHH`: P:(Rn) with post-update.
    pub(crate) fn op_movem_indirect(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let rr = usize::from((op >> 6) & 3);
        let address = self.regs.r[rr];
        let reg = operands::hhh(op);
        self.memory_move(bus, reg, Operand::p_memory(address), reads_memory(op >> 8), None);
        self.regs.update_address(rr, Update::from_mm(op >> 3));
        Exec::next(1, 4)
    }

    /// `0000 001W RR11 mmRR`: P:(Rp) to X:(Rx) (W = 1) or back.
    pub(crate) fn op_movem_dual(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let rp = usize::from((op >> 6) & 3);
        let rx = usize::from(op & 3);
        let program = Operand::p_memory(self.regs.r[rp]);
        let data = Operand::x_memory(self.regs.r[rx]);
        if reads_memory(op >> 8) {
            self.transfer(bus, program, data, None);
        } else {
            self.transfer(bus, data, program, None);
        }
        let (up, ux) = Update::dual(op >> 2);
        self.regs.update_address(rp, up);
        self.regs.update_address(rx, ux);
        Exec::next(1, 4)
    }

    // ================================================================
    // MOVE(P) / MOVE(S): peripheral and short absolute
    // ================================================================

    /// `0001 100W HH1p pppp`: X:<<pp.
    pub(crate) fn op_movep_short(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let address = operands::low_peripheral(op);
        let reg = operands::hh(op >> 6);
        self.memory_move(bus, reg, Operand::x_memory(address), reads_memory(op >> 8), None);
        Exec::next(1, 2)
    }

    /// `0000 110W RRmp pppp`: X:<<pp to X:(Rn) (W = 1) or back.
    pub(crate) fn op_movep_indirect(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let rr = usize::from((op >> 6) & 3);
        let peripheral = Operand::x_memory(operands::low_peripheral(op));
        let data = Operand::x_memory(self.regs.r[rr]);
        if reads_memory(op >> 8) {
            self.transfer(bus, peripheral, data, None);
        } else {
            self.transfer(bus, data, peripheral, None);
        }
        self.regs.update_address(rr, Update::from_m(op >> 5));
        Exec::next(1, 4)
    }

    /// `0001 100W HH0a aaaa`: X:aa.
    pub(crate) fn op_moves(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let address = op & 0x1F;
        let reg = operands::hh(op >> 6);
        self.memory_move(bus, reg, Operand::x_memory(address), reads_memory(op >> 8), None);
        Exec::next(1, 2)
    }

    // ================================================================
    // Address and conditional transfers
    // ================================================================

    /// LEA `0000 0001 11TT MMRR`: effective address into Rn.
    pub(crate) fn op_lea_address(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let rr = usize::from(op & 3);
        let tt = usize::from((op >> 4) & 3);
        self.regs.r[tt] = self.regs.updated_address(rr, Update::from_mm(op >> 2));
        Exec::next(1, 2)
    }

    /// LEA `0000 0001 10NN MMRR`: effective address into Nn.
    pub(crate) fn op_lea_offset(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let rr = usize::from(op & 3);
        let nn = usize::from((op >> 4) & 3);
        self.regs.n[nn] = self.regs.updated_address(rr, Update::from_mm(op >> 2));
        Exec::next(1, 2)
    }

    /// Tcc `0001 00cc ccTT Fh0h`: conditional transfer to F and R0 to Rn.
    pub(crate) fn op_tcc(&mut self, _bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        if !flags::condition(self.regs.sr, (op >> 6) & 0xF) {
            return Exec::next(1, 2);
        }
        let Some(src) = operands::h0h(op) else {
            log::warn!("reserved Tcc source in ${op:04X} at P:${:04X}", self.ppc);
            return Exec::next(1, 2);
        };
        let value = self.alu_source(src);
        self.regs.set_acc(Acc::from_bit(op >> 3), value);
        let tt = usize::from((op >> 4) & 3);
        self.regs.r[tt] = self.regs.r[0];
        Exec::next(1, 2)
    }

    /// TFR(3) `0010 01mW RRDD FHHH`: DD into F, plus an X:(Rn) move.
    pub(crate) fn op_tfr3(&mut self, bus: &mut dyn HarvardBus, op: u16, _op2: u16) -> Exec {
        let f = Acc::from_bit(op >> 3);
        let value = self.alu_source(operands::dd(op >> 4));
        let prior = self.regs.acc(f);
        self.regs.set_acc(f, value);
        let dest = Some(AluDest { acc: f, prior });

        let rr = usize::from((op >> 6) & 3);
        let address = self.regs.r[rr];
        let reg = operands::hhh(op);
        self.memory_move(bus, reg, Operand::x_memory(address), reads_memory(op >> 8), dest);
        self.regs.update_address(rr, Update::from_m(op >> 9));
        Exec::next(1, 2)
    }
}
