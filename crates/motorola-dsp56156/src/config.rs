//! DSP56156 core configuration.

use serde::{Deserialize, Serialize};

/// How `step` reports instruction cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleModel {
    /// Four ticks per instruction, plus interrupt overhead.
    #[default]
    Flat,
    /// Per-opcode estimates (DO with a zero count costs 10, a started DO 6).
    Opcode,
}

/// Configuration for constructing a `Dsp56156`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DspConfig {
    pub cycle_model: CycleModel,
    /// Write `JMP (R0)` to P:$0000 on reset so an unloaded core idles.
    pub seed_idle_loop: bool,
}

impl Default for DspConfig {
    fn default() -> Self {
        Self { cycle_model: CycleModel::Flat, seed_idle_loop: true }
    }
}
