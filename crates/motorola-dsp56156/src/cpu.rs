//! Motorola DSP56156 core.
//!
//! `step` retires one instruction: fetch the opcode and the word after it,
//! decode and execute, advance PC, then run the fast-interrupt return check,
//! the REP and DO loop processors, and finally the interrupt controller.
//! Instructions are atomic; interrupts are only taken between them.
//!
//! ## Reset and operating modes
//!
//! Leaving reset latches MODA/MODB into OMR MA/MB and applies the mode:
//!
//! | MB:MA | Mode |
//! |-------|------|
//! | 00 | Bootstrap from P:$C000 (copy $800 words to P:$0000) |
//! | 01 | Bootstrap over SSI or host interface (P:$C000 bit 15) |
//! | 10 | Normal expanded, PC = $0000 |
//! | 11 | Development expanded, PC = $E000 |

use emu_core::{Cpu, HarvardBus, Observable, Ticks, Value};
use serde::{Deserialize, Serialize};

use crate::config::{CycleModel, DspConfig};
use crate::decode::instruction_words;
use crate::flags::{self, C, E, FV, I0, I1, L, LF, N, OMR_MA, OMR_MB, S, U, V, Z};
use crate::interrupts::{FastInterrupt, InterruptController, Line, Lines, Source};
use crate::registers::{Register, Registers, STACK_DEPTH, StackPair};

/// `JMP (R0)`: seeded at P:$0000 so an empty program spins in place.
const IDLE_LOOP: u16 = 0x0124;
const BOOTSTRAP_ROM: u16 = 0xC000;
const BOOTSTRAP_WORDS: u16 = 0x0800;
const DEVELOPMENT_START: u16 = 0xE000;
const FLAT_CYCLES: u32 = 4;

/// Low-power state entered by WAIT or STOP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerState {
    #[default]
    Running,
    Wait,
    Stop,
}

/// Where the core is loading its program from after reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BootstrapMode {
    #[default]
    Off,
    /// Copied from the bootstrap ROM during reset.
    Rom,
    /// Waiting for the host to feed the program over SSI.
    Ssi,
    /// Waiting for the host to feed the program over the host interface.
    HostInterface,
}

/// Motorola DSP56156.
#[derive(Debug, Clone)]
pub struct Dsp56156 {
    // === Registers ===
    pub regs: Registers,

    // === Interrupts ===
    pub(crate) interrupts: InterruptController,
    pub(crate) lines: Lines,
    pub(crate) fast_interrupt: Option<FastInterrupt>,
    /// Service overhead charged to the current step.
    pub(crate) interrupt_cycles: u32,

    // === Execution state ===
    pub(crate) power: PowerState,
    pub(crate) bootstrap_mode: BootstrapMode,
    /// The memory side of a reset still has to run.
    pub(crate) reset_pending: bool,
    /// Address of the instruction being executed.
    pub(crate) ppc: u16,

    // === Timing ===
    pub(crate) cycles_remaining: i32,
    pub(crate) total_cycles: Ticks,

    config: DspConfig,
}

impl Dsp56156 {
    /// Create a core with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DspConfig::default())
    }

    #[must_use]
    pub fn with_config(config: DspConfig) -> Self {
        Self {
            regs: Registers::new(),
            interrupts: InterruptController::default(),
            lines: Lines::default(),
            fast_interrupt: None,
            interrupt_cycles: 0,
            power: PowerState::Running,
            bootstrap_mode: BootstrapMode::Off,
            reset_pending: false,
            ppc: 0,
            cycles_remaining: 0,
            total_cycles: Ticks::ZERO,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> DspConfig {
        self.config
    }

    // === Reset ===

    /// Full reset, including the operating-mode effects on memory.
    pub fn reset(&mut self, bus: &mut dyn HarvardBus) {
        self.reset_core();
        self.apply_reset(bus);
    }

    /// Register and controller reset. Leaves memory alone.
    pub(crate) fn reset_core(&mut self) {
        self.regs = Registers::new();
        self.regs.sr = I1 | I0;
        let mut omr = 0;
        if self.lines.mod_a {
            omr |= OMR_MA;
        }
        if self.lines.mod_b {
            omr |= OMR_MB;
        }
        self.regs.omr = omr;
        self.interrupts = InterruptController::default();
        self.fast_interrupt = None;
        self.interrupt_cycles = 0;
        self.power = PowerState::Running;
        self.bootstrap_mode = BootstrapMode::Off;
        self.reset_pending = false;
        self.ppc = 0;
    }

    fn apply_reset(&mut self, bus: &mut dyn HarvardBus) {
        self.reset_pending = false;
        match self.regs.omr & (OMR_MB | OMR_MA) {
            0 => {
                log::debug!("bootstrap from P:${BOOTSTRAP_ROM:04X}");
                for offset in 0..BOOTSTRAP_WORDS {
                    let word = self.read_p(bus, BOOTSTRAP_ROM + offset);
                    self.write_p(bus, offset, word);
                }
                self.bootstrap_mode = BootstrapMode::Rom;
                self.enter_normal_mode();
            }
            OMR_MA => {
                let select = self.read_p(bus, BOOTSTRAP_ROM);
                self.bootstrap_mode = if select & 0x8000 != 0 {
                    BootstrapMode::Ssi
                } else {
                    BootstrapMode::HostInterface
                };
                log::debug!("waiting for {:?} bootstrap", self.bootstrap_mode);
                self.enter_normal_mode();
            }
            OMR_MB => self.regs.pc = 0,
            _ => self.regs.pc = DEVELOPMENT_START,
        }
        self.seed_idle_loop(bus);
    }

    /// Park the core on `JMP (R0)` at P:$0000 until the host loads a
    /// program. A word copied in by the ROM bootstrap is left alone.
    fn seed_idle_loop(&mut self, bus: &mut dyn HarvardBus) {
        if !self.config.seed_idle_loop {
            return;
        }
        if self.bootstrap_mode == BootstrapMode::Rom && self.read_p(bus, 0) != 0 {
            return;
        }
        self.write_p(bus, 0, IDLE_LOOP);
    }

    fn enter_normal_mode(&mut self) {
        self.regs.omr = (self.regs.omr & !(OMR_MA | OMR_MB)) | OMR_MB;
        self.regs.pc = 0;
    }

    /// The host has finished loading a program over SSI or the host
    /// interface; start executing it at P:$0000.
    pub fn finish_bootstrap(&mut self) {
        log::debug!("bootstrap complete");
        self.bootstrap_mode = BootstrapMode::Off;
        self.regs.pc = 0;
    }

    // === Execution ===

    /// Retire one instruction. Returns zero ticks when the core is held in
    /// reset, waiting for a bootstrap, or asleep with nothing to wake it.
    pub fn step(&mut self, bus: &mut dyn HarvardBus) -> Ticks {
        if self.lines.reset {
            return Ticks::ZERO;
        }
        if self.reset_pending {
            self.apply_reset(bus);
        }
        if matches!(self.bootstrap_mode, BootstrapMode::Ssi | BootstrapMode::HostInterface) {
            return Ticks::ZERO;
        }
        self.interrupt_cycles = 0;

        if self.power != PowerState::Running {
            if !self.service_interrupts(bus) {
                return Ticks::ZERO;
            }
            let ticks = Ticks::from(self.interrupt_cycles);
            self.total_cycles += ticks;
            return ticks;
        }

        let pc = self.regs.pc;
        self.ppc = pc;
        let op = self.read_p(bus, pc);
        let op2 = self.read_p(bus, pc.wrapping_add(1));
        log::trace!("P:${pc:04X} ${op:04X} ${op2:04X}");

        let exec = self.execute(bus, op, op2);
        self.regs.pc = self.regs.pc.wrapping_add(exec.advance);

        if self.fast_interrupt.is_some() {
            self.check_fast_return();
        } else {
            self.process_rep(instruction_words(op, op2));
            self.process_loops();
        }
        self.service_interrupts(bus);

        let cost = match self.config.cycle_model {
            CycleModel::Flat => FLAT_CYCLES,
            CycleModel::Opcode => exec.cycles,
        };
        let ticks = Ticks::from(cost + self.interrupt_cycles);
        self.total_cycles += ticks;
        ticks
    }

    /// Step until `budget` ticks are used up or the core stops making
    /// progress. Returns the ticks consumed.
    pub fn run(&mut self, bus: &mut dyn HarvardBus, budget: u32) -> Ticks {
        self.cycles_remaining = i32::try_from(budget).unwrap_or(i32::MAX);
        let mut used = Ticks::ZERO;
        while self.cycles_remaining > 0 {
            let ticks = self.step(bus);
            if ticks.is_zero() {
                break;
            }
            used += ticks;
            self.cycles_remaining =
                self.cycles_remaining.saturating_sub(i32::try_from(ticks.get()).unwrap_or(i32::MAX));
        }
        used
    }

    // === Host interface ===

    #[must_use]
    pub fn register(&self, reg: Register) -> u64 {
        self.regs.get(reg)
    }

    pub fn set_register(&mut self, reg: Register, value: u64) {
        self.regs.set(reg, value);
    }

    /// One hardware stack slot.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below 16.
    #[must_use]
    pub fn stack_pair(&self, index: usize) -> StackPair {
        assert!(index < STACK_DEPTH, "DSP56156 stack index {index} out of range");
        self.regs.ss[index]
    }

    /// Address of the most recently executed instruction.
    #[must_use]
    pub fn ppc(&self) -> u16 {
        self.ppc
    }

    #[must_use]
    pub fn ipr(&self) -> u16 {
        self.interrupts.ipr
    }

    pub fn set_ipr(&mut self, ipr: u16) {
        self.interrupts.ipr = ipr;
    }

    #[must_use]
    pub fn pending_interrupts(&self) -> &[Source] {
        self.interrupts.pending()
    }

    #[must_use]
    pub fn lines(&self) -> Lines {
        self.lines
    }

    #[must_use]
    pub fn power_state(&self) -> PowerState {
        self.power
    }

    #[must_use]
    pub fn bootstrap_mode(&self) -> BootstrapMode {
        self.bootstrap_mode
    }

    #[must_use]
    pub fn total_cycles(&self) -> Ticks {
        self.total_cycles
    }

    fn sr_flag(&self, bit: u16) -> Value {
        (self.regs.sr & bit != 0).into()
    }

    fn set_sr_flag(&mut self, bit: u16, value: &Value) {
        if value.as_u64().is_some_and(|v| v != 0) {
            self.regs.sr |= bit;
        } else {
            self.regs.sr &= !bit;
        }
    }
}

impl Default for Dsp56156 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu for Dsp56156 {
    type Registers = Registers;
    type Line = Line;

    fn step(&mut self, bus: &mut dyn HarvardBus) -> Ticks {
        Dsp56156::step(self, bus)
    }

    fn pc(&self) -> u32 {
        u32::from(self.regs.pc)
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.lines.reset
            || self.power != PowerState::Running
            || matches!(self.bootstrap_mode, BootstrapMode::Ssi | BootstrapMode::HostInterface)
    }

    fn set_line(&mut self, line: Line, asserted: bool) {
        Dsp56156::set_line(self, line, asserted);
    }

    fn reset(&mut self, bus: &mut dyn HarvardBus) {
        Dsp56156::reset(self, bus);
    }
}

fn register_value(reg: Register, value: u64) -> Value {
    match reg {
        Register::A | Register::B => Value::U40(value),
        Register::X | Register::Y => Value::U32(value as u32),
        Register::A2 | Register::B2 | Register::Omr | Register::Sp => Value::U8(value as u8),
        _ => Value::U16(value as u16),
    }
}

const SR_FLAGS: [(&str, u16); 12] = [
    ("sr.c", C),
    ("sr.v", V),
    ("sr.z", Z),
    ("sr.n", N),
    ("sr.u", U),
    ("sr.e", E),
    ("sr.l", L),
    ("sr.s", S),
    ("sr.i0", I0),
    ("sr.i1", I1),
    ("sr.fv", FV),
    ("sr.lf", LF),
];

/// `ss[i].h` / `ss[i].l`: stack slot and whether the high word is meant.
fn stack_path(path: &str) -> Option<(usize, bool)> {
    let rest = path.strip_prefix("ss[")?;
    let (index, field) = rest.split_once("].")?;
    let index: usize = index.parse().ok()?;
    if index >= STACK_DEPTH {
        return None;
    }
    match field {
        "h" => Some((index, true)),
        "l" => Some((index, false)),
        _ => None,
    }
}

#[rustfmt::skip]
const DSP56156_QUERY_PATHS: &[&str] = &[
    "x0", "x1", "y0", "y1", "x", "y",
    "a0", "a1", "a2", "a", "b0", "b1", "b2", "b",
    "r0", "r1", "r2", "r3", "n0", "n1", "n2", "n3", "m0", "m1", "m2", "m3",
    "pc", "sr", "omr", "lc", "la", "sp", "ssh", "ssl", "temp",
    "sr.c", "sr.v", "sr.z", "sr.n", "sr.u", "sr.e", "sr.l", "sr.s",
    "sr.i0", "sr.i1", "sr.fv", "sr.lf",
    "ccr", "int_mask", "ppc", "ipr", "rep_flag", "rep_addr",
    "ss[n].h", "ss[n].l",
    "pending", "waiting", "stopped", "cycles",
];

impl Observable for Dsp56156 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(reg) = Register::from_name(path) {
            return Some(register_value(reg, self.regs.get(reg)));
        }
        if let Some(&(_, bit)) = SR_FLAGS.iter().find(|(name, _)| *name == path) {
            return Some(self.sr_flag(bit));
        }
        if let Some((index, high)) = stack_path(path) {
            let pair = self.regs.ss[index];
            return Some(Value::U16(if high { pair.high } else { pair.low }));
        }
        match path {
            "ccr" => Some(Value::U8(self.regs.sr as u8)),
            "int_mask" => Some(flags::interrupt_mask(self.regs.sr).into()),
            "ppc" => Some(self.ppc.into()),
            "ipr" => Some(self.interrupts.ipr.into()),
            "rep_flag" => Some(self.regs.rep_flag.into()),
            "rep_addr" => Some(self.regs.rep_addr.into()),
            "pending" => Some(Value::Array(
                self.interrupts.pending().iter().map(|s| Value::from(s.name())).collect(),
            )),
            "waiting" => Some((self.power == PowerState::Wait).into()),
            "stopped" => Some((self.power == PowerState::Stop).into()),
            "cycles" => Some(self.total_cycles.get().into()),
            _ => None,
        }
    }

    fn poke(&mut self, path: &str, value: Value) -> bool {
        let Some(raw) = value.as_u64() else {
            return false;
        };
        if let Some(reg) = Register::from_name(path) {
            self.regs.set(reg, raw);
            return true;
        }
        if let Some(&(_, bit)) = SR_FLAGS.iter().find(|(name, _)| *name == path) {
            self.set_sr_flag(bit, &value);
            return true;
        }
        if let Some((index, high)) = stack_path(path) {
            let pair = &mut self.regs.ss[index];
            if high {
                pair.high = raw as u16;
            } else {
                pair.low = raw as u16;
            }
            return true;
        }
        match path {
            "ccr" => {
                self.regs.sr = (self.regs.sr & 0xFF00) | (raw & 0xFF) as u16;
                true
            }
            "ipr" => {
                self.interrupts.ipr = raw as u16;
                true
            }
            _ => false,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        DSP56156_QUERY_PATHS
    }
}
