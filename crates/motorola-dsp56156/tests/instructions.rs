//! Instruction behaviour through the public stepping interface.

mod common;

use common::{boot, steps};
use motorola_dsp56156::flags::{C, L, N, V, Z};
use motorola_dsp56156::Register;

const NOP: u16 = 0x0000;
/// CLR A, no parallel move.
const CLR_A: u16 = 0x4A01;
/// INC A, no parallel move.
const INC_A: u16 = 0x4A22;
/// ABS A, no parallel move.
const ABS_A: u16 = 0x4A71;

#[test]
fn nop_advances_pc_only() {
    let (mut dsp, mut mem) = boot(&[NOP]);
    let sr = dsp.regs.sr;
    let ticks = dsp.step(&mut mem);
    assert_eq!(dsp.regs.pc, 1);
    assert_eq!(dsp.regs.sr, sr);
    assert_eq!(ticks.get(), 4);
    assert_eq!(dsp.ppc(), 0);
}

#[test]
fn clr_sets_zero_and_clears_n_v() {
    let (mut dsp, mut mem) = boot(&[CLR_A]);
    dsp.regs.a = 0xFF_8000_1234;
    dsp.regs.sr |= N | V;
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.a, 0);
    assert_ne!(dsp.regs.sr & Z, 0);
    assert_eq!(dsp.regs.sr & (N | V), 0);
}

#[test]
fn mac_adds_doubled_product() {
    // MAC +Y0,X0,A
    let (mut dsp, mut mem) = boot(&[0x4AA4]);
    dsp.set_register(Register::X0, 0xC000);
    dsp.set_register(Register::Y0, 0x4000);
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.a, 0xFF_E000_0000);
    assert_ne!(dsp.regs.sr & N, 0);
}

#[test]
fn inc_tests_zero_on_the_high_bits() {
    let (mut dsp, mut mem) = boot(&[INC_A, INC_A]);
    dsp.regs.a = 0x00_0000_FFFE;
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.a, 0x00_0000_FFFF);
    assert_ne!(dsp.regs.sr & Z, 0);
    assert_eq!(dsp.regs.sr & (V | C), 0);

    dsp.step(&mut mem);
    assert_eq!(dsp.regs.a, 0x00_0001_0000);
    assert_eq!(dsp.regs.sr & Z, 0);
}

#[test]
fn mpyr_round_carry_does_not_overflow() {
    // MPYR +Y0,X0,A
    let (mut dsp, mut mem) = boot(&[0x4A94]);
    dsp.set_register(Register::X0, 0x4000);
    dsp.set_register(Register::Y0, 0xFFFF);
    dsp.regs.a = 0x12_3456_789A;
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.a, 0);
    assert_ne!(dsp.regs.sr & Z, 0);
    assert_eq!(dsp.regs.sr & (V | L), 0);
}

#[test]
fn abs_of_most_negative_saturates() {
    let (mut dsp, mut mem) = boot(&[ABS_A, ABS_A]);
    dsp.regs.a = 0x80_0000_0000;
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.a, 0x7F_FFFF_FFFF);
    assert_ne!(dsp.regs.sr & V, 0);
    assert_ne!(dsp.regs.sr & L, 0);

    dsp.regs.a = 0xFF_FFFF_FFFF;
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.a, 1);
}

#[test]
fn register_move_sees_value_before_alu_update() {
    // CLR A  A,X0
    let (mut dsp, mut mem) = boot(&[0x4401]);
    dsp.regs.a = 0x00_1234_0000;
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.a, 0);
    assert_eq!(dsp.register(Register::X0), 0x1234);
    assert_eq!(dsp.regs.sr & L, 0);
}

#[test]
fn memory_write_sees_value_before_alu_update() {
    // INC A  A,X:(R0)+
    let (mut dsp, mut mem) = boot(&[0x8822]);
    dsp.regs.a = 0x00_7FFF_0000;
    dsp.regs.r[0] = 0x0040;
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.a, 0x00_7FFF_0001);
    assert_eq!(mem.data(0x0040), 0x7FFF);
    assert_eq!(dsp.regs.r[0], 0x0041);
}

#[test]
fn limited_accumulator_read_saturates() {
    // MOVE A,X:(R0)+ with no ALU effect
    let (mut dsp, mut mem) = boot(&[0x8811]);
    dsp.regs.a = 0x01_0000_0000;
    dsp.step(&mut mem);
    assert_eq!(mem.data(0), 0x7FFF);
    assert_ne!(dsp.regs.sr & L, 0);
}

#[test]
fn dual_read_loads_both_destinations() {
    // MOVE X:(R0)+,X0  X:(R3)+,X1
    let (mut dsp, mut mem) = boot(&[0x6010]);
    dsp.regs.r[0] = 0x10;
    dsp.regs.r[3] = 0x20;
    mem.load_data(0x10, &[0x1111]);
    mem.load_data(0x20, &[0x2222]);
    dsp.step(&mut mem);
    assert_eq!(dsp.register(Register::X0), 0x1111);
    assert_eq!(dsp.register(Register::X1), 0x2222);
    assert_eq!(dsp.regs.r[0], 0x11);
    assert_eq!(dsp.regs.r[3], 0x21);
}

#[test]
fn immediate_moves() {
    // MOVE(C) #$1234,R2 then MOVE(I) #-1,Y0
    let (mut dsp, mut mem) = boot(&[0x3E5C, 0x1234, 0x21FF]);
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.r[2], 0x1234);
    assert_eq!(dsp.regs.pc, 2);
    dsp.step(&mut mem);
    assert_eq!(dsp.register(Register::Y0), 0xFFFF);
}

#[test]
fn bit_field_set_in_memory() {
    // BFSET #$0F00,X:(R0)
    let (mut dsp, mut mem) = boot(&[0x14A0, 0x980F]);
    mem.load_data(0, &[0x0100]);
    dsp.regs.sr |= C;
    dsp.step(&mut mem);
    assert_eq!(mem.data(0), 0x0F00);
    assert_eq!(dsp.regs.sr & C, 0);
    assert_eq!(dsp.regs.pc, 2);
}

#[test]
fn logic_immediates_touch_only_their_half_of_sr() {
    // ANDI #$FE,CCR / ANDI #$FC,MR
    let (mut dsp, mut mem) = boot(&[0x1CFE, 0x1AFC]);
    dsp.regs.sr |= C | V | Z;
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.sr, 0x0300 | V | Z);
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.sr, V | Z);
}

#[test]
fn bit_field_with_reserved_bank_is_skipped() {
    // BFSET with BBB = 000
    let (mut dsp, mut mem) = boot(&[0x14A0, 0x180F]);
    mem.load_data(0, &[0x0100]);
    dsp.regs.sr |= C;
    dsp.step(&mut mem);
    assert_eq!(mem.data(0), 0x0100);
    assert_ne!(dsp.regs.sr & C, 0);
    assert_eq!(dsp.regs.pc, 2);
}

#[test]
fn subroutine_call_and_return() {
    let mut program = vec![0x0130, 0x0010, NOP];
    program.resize(0x10, NOP);
    program.push(0x0006);
    let (mut dsp, mut mem) = boot(&program);

    dsp.step(&mut mem);
    assert_eq!(dsp.regs.pc, 0x10);
    assert_eq!(dsp.regs.sp, 1);
    assert_eq!(dsp.stack_pair(1).high, 2);

    dsp.step(&mut mem);
    assert_eq!(dsp.regs.pc, 2);
    assert_eq!(dsp.regs.sp, 0);
}

#[test]
fn unrecognized_opcode_is_a_nop() {
    // Reserved control word.
    let (mut dsp, mut mem) = boot(&[0x0003, INC_A]);
    let before = dsp.regs;
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.pc, 1);
    assert_eq!(dsp.regs.a, before.a);
    steps(&mut dsp, &mut mem, 1);
    assert_eq!(dsp.regs.a, 1);
}
