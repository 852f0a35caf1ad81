//! Loops, the hardware stack, interrupts, reset and bootstrap.

mod common;

use common::{boot, boot_with, steps};
use emu_core::{Cpu, WordMemory};
use motorola_dsp56156::flags::{FV, LF, OMR_MA, OMR_MB};
use motorola_dsp56156::{
    BootstrapMode, CycleModel, Dsp56156, DspConfig, Line, PowerState, Source,
};

const NOP: u16 = 0x0000;
const INC_A: u16 = 0x4A22;
const RTS: u16 = 0x0006;
const RTI: u16 = 0x0007;
const WAIT: u16 = 0x000B;

/// IRQA enabled at level 0, edge-triggered.
const IRQA_EDGE: u16 = 0b101;

fn opcode_timed(program: &[u16]) -> (Dsp56156, WordMemory) {
    boot_with(DspConfig { cycle_model: CycleModel::Opcode, ..DspConfig::default() }, program)
}

/// `program` at P:$0000 and `handler` at the IRQA vector.
fn with_irqa_handler(program: &[u16], handler: &[u16]) -> (Dsp56156, WordMemory) {
    let (mut dsp, mut mem) = boot(program);
    mem.load_program(Source::IrqA.vector(), handler);
    dsp.regs.sr = 0;
    dsp.set_ipr(IRQA_EDGE);
    (dsp, mem)
}

// ================================================================
// DO / REP
// ================================================================

#[test]
fn do_loop_runs_body_count_times() {
    // DO #3,$0004 / INC A / NOP / NOP
    let (mut dsp, mut mem) = boot(&[0x0E03, 0x0004, INC_A, NOP, NOP]);

    dsp.step(&mut mem);
    assert_eq!(dsp.regs.sp, 2);
    assert_eq!(dsp.regs.la, 0x0004);
    assert_eq!(dsp.regs.lc, 3);
    assert_ne!(dsp.regs.sr & LF, 0);
    assert_eq!(dsp.regs.pc, 2);

    steps(&mut dsp, &mut mem, 6);
    assert_eq!(dsp.regs.a, 3);
    assert_eq!(dsp.regs.pc, 4);
    assert_eq!(dsp.regs.sp, 0);
    assert_eq!(dsp.regs.sr & LF, 0);
    assert_eq!(dsp.regs.la, 0);
    assert_eq!(dsp.regs.lc, 0);
}

#[test]
fn do_with_zero_count_skips_the_body() {
    let (mut dsp, mut mem) = opcode_timed(&[0x0E00, 0x0010, INC_A]);
    dsp.regs.lc = 0x1234;
    let ticks = dsp.step(&mut mem);
    assert_eq!(ticks.get(), 10);
    assert_eq!(dsp.regs.pc, 0x0010);
    assert_eq!(dsp.regs.sp, 0);
    assert_eq!(dsp.regs.lc, 0x1234);
    assert_eq!(dsp.regs.la, 0);
    assert_eq!(dsp.regs.a, 0);

    let (mut dsp, mut mem) = opcode_timed(&[0x0E02, 0x0010, INC_A]);
    assert_eq!(dsp.step(&mut mem).get(), 6);
}

#[test]
fn do_forever_keeps_looping() {
    // DO FOREVER,$0003 / INC A
    let (mut dsp, mut mem) = boot(&[0x0002, 0x0003, INC_A]);
    dsp.regs.lc = 7;
    steps(&mut dsp, &mut mem, 6);
    assert_eq!(dsp.regs.a, 5);
    assert_eq!(dsp.regs.pc, 2);
    assert_eq!(dsp.regs.sr & (FV | LF), FV | LF);
    assert_eq!(dsp.regs.lc, 2);
}

#[test]
fn enddo_restores_outer_loop_registers() {
    // DO #5,$0004 / ENDDO / NOP / NOP
    let (mut dsp, mut mem) = boot(&[0x0E05, 0x0004, 0x0009, NOP, NOP]);
    dsp.regs.la = 0x0777;
    dsp.regs.lc = 0x0042;
    steps(&mut dsp, &mut mem, 2);
    assert_eq!(dsp.regs.sp, 0);
    assert_eq!(dsp.regs.la, 0x0777);
    assert_eq!(dsp.regs.lc, 0x0042);
    assert_eq!(dsp.regs.sr & LF, 0);
    assert_eq!(dsp.regs.pc, 3);
}

#[test]
fn rep_replays_next_instruction() {
    // REP #3 / INC A / NOP
    let (mut dsp, mut mem) = boot(&[0x0F03, INC_A, NOP]);
    dsp.regs.lc = 0x0055;

    dsp.step(&mut mem);
    assert!(dsp.regs.rep_flag);
    assert_eq!(dsp.regs.rep_addr, 2);
    assert_eq!(dsp.regs.temp, 0x0055);

    steps(&mut dsp, &mut mem, 3);
    assert_eq!(dsp.regs.a, 3);
    assert_eq!(dsp.regs.pc, 2);
    assert!(!dsp.regs.rep_flag);
    assert_eq!(dsp.regs.lc, 0x0055);
}

#[test]
fn rep_with_zero_count_runs_once() {
    let (mut dsp, mut mem) = opcode_timed(&[0x0F00, INC_A, NOP]);
    assert_eq!(dsp.step(&mut mem).get(), 6);
    assert!(!dsp.regs.rep_flag);
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.a, 1);
    assert_eq!(dsp.regs.pc, 2);
}

#[test]
fn rep_holds_off_interrupts() {
    let (mut dsp, mut mem) = with_irqa_handler(&[0x0F02, INC_A, NOP], &[NOP, NOP]);
    dsp.step(&mut mem);
    dsp.set_line(Line::ModeA, true);
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.pc, 1);
    assert_eq!(dsp.pending_interrupts(), &[Source::IrqA]);
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.a, 2);
    assert_eq!(dsp.regs.pc, Source::IrqA.vector());
}

// ================================================================
// Stack
// ================================================================

#[test]
fn return_on_empty_stack_raises_stack_error() {
    let (mut dsp, mut mem) = boot(&[RTS]);
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.sp, 0);
    assert_eq!(dsp.ppc(), 0);
    // Level 3: taken even with the mask at 3.
    assert_eq!(dsp.regs.pc, Source::StackError.vector());
    assert!(dsp.pending_interrupts().is_empty());
}

#[test]
fn stack_overflow_sets_se() {
    // 16 nested JSR (R0) calls to P:$0000 itself.
    let (mut dsp, mut mem) = boot(&[0x0120]);
    steps(&mut dsp, &mut mem, 15);
    assert_eq!(dsp.regs.sp, 15);
    let top = dsp.stack_pair(15);
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.sp & 0x0F, 15);
    assert_ne!(dsp.regs.sp & 0x10, 0);
    assert_eq!(dsp.stack_pair(15), top);
    assert_eq!(dsp.regs.pc, Source::StackError.vector());
}

#[test]
#[should_panic(expected = "out of range")]
fn stack_pair_rejects_bad_index() {
    let dsp = Dsp56156::new();
    let _ = dsp.stack_pair(16);
}

// ================================================================
// Interrupts
// ================================================================

#[test]
fn fast_interrupt_returns_after_two_words() {
    let (mut dsp, mut mem) = with_irqa_handler(&[NOP, NOP, NOP], &[INC_A, NOP]);
    dsp.set_line(Line::ModeA, true);
    assert_eq!(dsp.pending_interrupts(), &[Source::IrqA]);

    let ticks = dsp.step(&mut mem);
    assert_eq!(ticks.get(), 6);
    assert_eq!(dsp.regs.pc, Source::IrqA.vector());

    steps(&mut dsp, &mut mem, 2);
    assert_eq!(dsp.regs.a, 1);
    assert_eq!(dsp.regs.pc, 1);
    assert_eq!(dsp.regs.sp, 0);

    // Held line does not retrigger an edge source.
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.pc, 2);
}

#[test]
fn jsr_in_vector_becomes_long_interrupt() {
    let mut program = vec![NOP; 0x20];
    program.push(RTI);
    let (mut dsp, mut mem) = with_irqa_handler(&program, &[0x0130, 0x0020]);
    dsp.regs.sr = 0x0100;
    dsp.set_ipr(0b110);
    dsp.set_line(Line::ModeA, true);

    dsp.step(&mut mem);
    assert_eq!(dsp.regs.pc, Source::IrqA.vector());
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.pc, 0x0020);
    assert_eq!(dsp.regs.sp, 1);
    assert_eq!(dsp.stack_pair(1).high, 1);
    assert_eq!(dsp.stack_pair(1).low, 0x0100);
    // Mask raised to the level of IRQA (IPR 10 = priority 1).
    assert_eq!(dsp.regs.sr & 0x0300, 0x0100);

    dsp.step(&mut mem);
    assert_eq!(dsp.regs.pc, 1);
    assert_eq!(dsp.regs.sp, 0);
    assert_eq!(dsp.regs.sr, 0x0100);
}

#[test]
fn masked_interrupts_wait() {
    let (mut dsp, mut mem) = with_irqa_handler(&[NOP, NOP], &[NOP, NOP]);
    dsp.regs.sr = 0x0300;
    dsp.set_line(Line::ModeA, true);
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.pc, 1);
    assert_eq!(dsp.pending_interrupts(), &[Source::IrqA]);
}

#[test]
fn level_irq_follows_its_line() {
    let (mut dsp, mut mem) = with_irqa_handler(&[NOP, NOP], &[NOP, NOP]);
    dsp.set_ipr(0b001);
    dsp.regs.sr = 0x0300;
    dsp.set_line(Line::ModeA, true);
    dsp.step(&mut mem);
    assert_eq!(dsp.pending_interrupts(), &[Source::IrqA]);
    dsp.set_line(Line::ModeA, false);
    dsp.step(&mut mem);
    assert!(dsp.pending_interrupts().is_empty());
}

#[test]
fn swi_is_serviced_at_level_three() {
    let (mut dsp, mut mem) = boot(&[0x0005, NOP]);
    dsp.step(&mut mem);
    assert_eq!(dsp.regs.pc, Source::SoftwareInterrupt.vector());
}

#[test]
fn wait_sleeps_until_an_interrupt() {
    let (mut dsp, mut mem) = with_irqa_handler(&[WAIT, NOP], &[NOP, NOP]);
    dsp.step(&mut mem);
    assert_eq!(dsp.power_state(), PowerState::Wait);
    assert!(dsp.is_halted());
    assert!(dsp.step(&mut mem).is_zero());
    assert_eq!(dsp.regs.pc, 1);

    dsp.set_line(Line::ModeA, true);
    assert_eq!(dsp.step(&mut mem).get(), 2);
    assert_eq!(dsp.power_state(), PowerState::Running);
    assert_eq!(dsp.regs.pc, Source::IrqA.vector());
    steps(&mut dsp, &mut mem, 2);
    assert_eq!(dsp.regs.pc, 1);
}

// ================================================================
// Reset and operating modes
// ================================================================

#[test]
fn reset_state() {
    let (dsp, mem) = boot(&[]);
    assert_eq!(dsp.regs.sr, 0x0300);
    assert_eq!(dsp.regs.omr & (OMR_MA | OMR_MB), OMR_MB);
    assert_eq!(dsp.regs.m, [0xFFFF; 4]);
    assert_eq!(dsp.regs.pc, 0);
    assert_eq!(mem.program(0), 0x0124);
}

#[test]
fn held_reset_stops_the_core() {
    let mut mem = WordMemory::new();
    mem.load_program(0xC000, &[INC_A]);
    let mut dsp = Dsp56156::new();
    dsp.set_line(Line::Reset, true);
    dsp.regs.a = 0x1234;
    assert!(dsp.step(&mut mem).is_zero());
    assert!(dsp.is_halted());

    // MODA = MODB = 0: bootstrap from ROM.
    dsp.set_line(Line::Reset, false);
    assert_eq!(dsp.regs.a, 0);
    dsp.step(&mut mem);
    assert_eq!(dsp.bootstrap_mode(), BootstrapMode::Rom);
    assert_eq!(mem.program(0), INC_A);
    assert_eq!(dsp.regs.omr & (OMR_MA | OMR_MB), OMR_MB);
    assert_eq!(dsp.regs.a, 1);
    assert_eq!(dsp.regs.pc, 1);
}

#[test]
fn cold_reset_with_empty_rom_idles() {
    let mut mem = WordMemory::new();
    let mut dsp = Dsp56156::new();
    dsp.reset(&mut mem);
    assert_eq!(dsp.bootstrap_mode(), BootstrapMode::Rom);
    assert_eq!(mem.program(0), 0x0124);
    assert_eq!(dsp.regs.omr & (OMR_MA | OMR_MB), OMR_MB);
    steps(&mut dsp, &mut mem, 3);
    assert_eq!(dsp.regs.pc, 0);
}

#[test]
fn development_mode_starts_high() {
    let mut mem = WordMemory::new();
    let mut dsp = Dsp56156::new();
    dsp.set_line(Line::ModeA, true);
    dsp.set_line(Line::ModeB, true);
    dsp.reset(&mut mem);
    assert_eq!(dsp.regs.pc, 0xE000);
    assert_eq!(dsp.regs.omr & (OMR_MA | OMR_MB), OMR_MA | OMR_MB);
    assert_eq!(mem.program(0), 0x0124);
}

#[test]
fn external_bootstrap_waits_for_host() {
    let mut mem = WordMemory::new();
    mem.load_program(0xC000, &[0x8000]);
    let mut dsp = Dsp56156::new();
    dsp.set_line(Line::ModeA, true);
    dsp.reset(&mut mem);
    assert_eq!(dsp.bootstrap_mode(), BootstrapMode::Ssi);
    assert!(dsp.step(&mut mem).is_zero());

    dsp.finish_bootstrap();
    // Idle loop: JMP (R0) with R0 = 0.
    assert_eq!(dsp.step(&mut mem).get(), 4);
    assert_eq!(dsp.regs.pc, 0);

    mem.load_program(0xC000, &[0x0000]);
    dsp.reset(&mut mem);
    assert_eq!(dsp.bootstrap_mode(), BootstrapMode::HostInterface);
}

#[test]
fn run_stops_at_budget() {
    let (mut dsp, mut mem) = boot(&[NOP; 16]);
    let used = dsp.run(&mut mem, 10);
    assert_eq!(used.get(), 12);
    assert_eq!(dsp.regs.pc, 3);
    assert_eq!(dsp.total_cycles().get(), 12);
}
