//! Parallel data moves.
//!
//! The data ALU operation of the word runs first and reports the accumulator
//! it wrote together with that accumulator's previous value. The move then
//! executes as if it had happened at the same time: a source that aliases the
//! ALU destination reads the pre-update value.

use emu_core::HarvardBus;

use crate::agu::Update;
use crate::alu::AluDest;
use crate::cpu::Dsp56156;
use crate::decode::{Exec, ParallelForm};
use crate::operands::{self, Operand, Reg, RegisterMove};
use crate::registers::Acc;

impl Dsp56156 {
    pub(crate) fn parallel(
        &mut self,
        bus: &mut dyn HarvardBus,
        form: ParallelForm,
        op: u16,
        op2: u16,
    ) -> Exec {
        let displaced = form == ParallelForm::XMemoryDisplaced;
        let alu_byte = if displaced { op2 & 0xFF } else { op & 0xFF };
        let f = Acc::from_bit(alu_byte >> 3);
        let dest = self.parallel_alu(alu_byte);

        match form {
            ParallelForm::NoMove => {}
            ParallelForm::RegisterMove => match operands::iiii(op >> 8, f) {
                RegisterMove::Transfer(src, dst) => {
                    self.transfer(bus, src.into(), dst.into(), dest);
                }
                RegisterMove::Nothing => {}
                RegisterMove::Reserved => {
                    log::warn!("reserved IIII move in ${op:04X} at P:${:04X}", self.ppc);
                }
            },
            ParallelForm::AddressUpdate => {
                let rr = usize::from((op >> 8) & 3);
                self.regs.update_address(rr, Update::from_z(op >> 10));
            }
            ParallelForm::XMemory => {
                let rr = usize::from((op >> 12) & 3);
                let address = self.regs.r[rr];
                self.x_move(bus, address, op, dest);
                self.regs.update_address(rr, Update::from_m(op >> 14));
            }
            ParallelForm::XMemoryR0 => {
                let address = self.regs.r[0];
                self.x_move(bus, address, op, dest);
            }
            ParallelForm::XMemoryDisplaced => {
                let address = self.regs.r[2].wrapping_add(operands::sign_extend_8(op & 0xFF));
                self.x_move(bus, address, op2, dest);
            }
        }

        if displaced { Exec::next(2, 4) } else { Exec::next(1, 2) }
    }

    /// `HHHW` move between X:`address` and a register (W = 1 reads memory).
    pub(crate) fn x_move(
        &mut self,
        bus: &mut dyn HarvardBus,
        address: u16,
        field: u16,
        dest: Option<AluDest>,
    ) {
        let reg = Operand::from(operands::hhh(field >> 9));
        let memory = Operand::x_memory(address);
        if field & 0x0100 != 0 {
            self.transfer(bus, memory, reg, dest);
        } else {
            self.transfer(bus, reg, memory, dest);
        }
    }

    /// Dual X memory data read: `011m mKKK .rr. ....`.
    pub(crate) fn dual_read(&mut self, bus: &mut dyn HarvardBus, op: u16) -> Exec {
        self.dual_read_alu(op);

        let rr = usize::from((op >> 5) & 3);
        if rr == 3 {
            log::warn!("dual read names R3 twice in ${op:04X} at P:${:04X}", self.ppc);
        }
        let (d1, d2) = operands::kkk(op >> 8);
        if d1 == d2 {
            log::warn!("dual read with equal destinations in ${op:04X} at P:${:04X}", self.ppc);
        }

        let (first, second) = (self.regs.r[rr], self.regs.r[3]);
        let first = self.read_x(bus, first);
        let second = self.read_x(bus, second);
        self.write_reg(d1, first.into());
        self.write_reg(d2, second.into());

        let (u1, u3) = Update::dual(op >> 11);
        self.regs.update_address(rr, u1);
        self.regs.update_address(3, u3);
        Exec::next(1, 2)
    }

    /// X memory data write and register data move: `0001 011k RRDD FQQQ`.
    pub(crate) fn write_and_move(&mut self, bus: &mut dyn HarvardBus, op: u16) -> Exec {
        let f = Acc::from_bit(op >> 3);
        let accumulate = op & 0x0100 != 0;
        let (s1, s2) = operands::qqq(op);
        let dest = self.multiply_into(f, s1, s2, false, accumulate, false);

        let rr = usize::from((op >> 6) & 3);
        let address = self.regs.r[rr];
        self.transfer(bus, Reg::acc(f).into(), Operand::x_memory(address), dest);
        self.regs.update_address(rr, Update::from_m(op >> 8));

        let src = operands::dd(op >> 4);
        self.transfer(bus, src.into(), Reg::acc(f.other()).into(), dest);
        Exec::next(1, 2)
    }
}
