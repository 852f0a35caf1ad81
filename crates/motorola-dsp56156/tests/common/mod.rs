//! Shared setup for the integration tests.

#![allow(dead_code)]

use emu_core::WordMemory;
use motorola_dsp56156::{Dsp56156, DspConfig, Line};

/// A core reset into normal expanded mode with `program` at P:$0000.
pub fn boot(program: &[u16]) -> (Dsp56156, WordMemory) {
    boot_with(DspConfig::default(), program)
}

pub fn boot_with(config: DspConfig, program: &[u16]) -> (Dsp56156, WordMemory) {
    let mut mem = WordMemory::new();
    let mut dsp = Dsp56156::with_config(config);
    dsp.set_line(Line::ModeB, true);
    dsp.reset(&mut mem);
    dsp.set_line(Line::ModeB, false);
    mem.load_program(0, program);
    (dsp, mem)
}

/// Step `n` instructions.
pub fn steps(dsp: &mut Dsp56156, mem: &mut WordMemory, n: usize) {
    for _ in 0..n {
        dsp.step(mem);
    }
}
