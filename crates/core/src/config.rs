//! Configuration system for the simulator.
//!
//! This module defines all configuration structures and enums used to parameterize a
//! run. It provides:
//! 1. **Defaults:** Baseline limits and interrupt timings.
//! 2. **Structures:** Hierarchical config for general, CPU, interrupt, and output settings.
//! 3. **Enums:** EXEC rebinding mode, EXEC cost policy, and interrupt model.
//!
//! Configuration is supplied as JSON (`Config::from_json_str`) or taken from
//! `Config::default()`; the CLI applies its flags on top.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::error::{SimError, SimResult};

/// Default configuration constants for the simulator.
mod defaults {
    use crate::common::constants;

    /// Bound on dispatch steps before a run is declared non-terminating.
    pub const MAX_DISPATCH_STEPS: u64 = constants::MAX_DISPATCH_STEPS;

    /// Bound on the number of processes a run may create.
    pub const MAX_PROCESSES: usize = constants::MAX_PROCESSES;

    /// CPU speed multiplier (1.0 = bursts cost exactly their operand).
    pub const CPU_SPEED: f64 = 1.0;

    /// User/kernel mode switch cost.
    pub const SWITCH_MODE: u64 = constants::SWITCH_MODE_CYCLES;

    /// Context save/restore cost.
    pub const CONTEXT: u64 = constants::CONTEXT_CYCLES;

    /// Vector lookup cost.
    pub const VECTOR_LOOKUP: u64 = constants::VECTOR_LOOKUP_CYCLES;

    /// Cost of each ISR body activity.
    pub const ISR_ACTIVITY: u64 = constants::ISR_ACTIVITY_CYCLES;

    /// IRET cost.
    pub const IRET: u64 = constants::IRET_CYCLES;
}

/// How EXEC treats the sequence that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ExecMode {
    /// The program body runs in a new frame; when it is exhausted the process
    /// continues after the EXEC in the sequence that issued it.
    #[default]
    Resume,
    /// Classic exec: the issuing sequence is discarded.
    Replace,
}

/// Which load cost EXEC charges when the trace operand and the catalog disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ExecCostPolicy {
    /// A mismatch is an `InconsistentProgramCost` failure of the acting process.
    #[default]
    Strict,
    /// The catalog's registered cost is charged; the operand is ignored.
    Catalog,
    /// The operand is charged when present; the catalog cost otherwise.
    Operand,
}

/// Meaning of the SYSCALL and END_IO operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum InterruptModel {
    /// The operand is a cycle count charged as one log entry.
    #[default]
    Inline,
    /// The operand is a device number; the effect expands into a full interrupt
    /// service sequence timed by the vector and device tables.
    Vectored,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Limits and EXEC semantics.
    #[serde(default)]
    pub general: GeneralConfig,
    /// CPU burst scaling.
    #[serde(default)]
    pub cpu: CpuConfig,
    /// Interrupt model and timings.
    #[serde(default)]
    pub interrupts: InterruptConfig,
    /// Output artifact names.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Parses a JSON configuration; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SimError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: &Path) -> SimResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        Self::from_json_str(&json)
    }

    /// Rejects values no run can use.
    pub fn validate(&self) -> SimResult<()> {
        if self.general.max_dispatch_steps == 0 {
            return Err(SimError::InvalidConfig(
                "general.max_dispatch_steps must be at least 1".to_string(),
            ));
        }
        if self.general.max_processes == 0 {
            return Err(SimError::InvalidConfig(
                "general.max_processes must be at least 1".to_string(),
            ));
        }
        if !self.cpu.speed.is_finite() || self.cpu.speed <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "cpu.speed must be a positive number, got {}",
                self.cpu.speed
            )));
        }
        if self.output.execution_file.is_empty() || self.output.status_file.is_empty() {
            return Err(SimError::InvalidConfig(
                "output file names must not be empty".to_string(),
            ));
        }
        if self.output.execution_file == self.output.status_file {
            return Err(SimError::InvalidConfig(
                "output.execution_file and output.status_file must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Limits and EXEC semantics.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Maximum dispatch steps before the run is aborted.
    #[serde(default = "GeneralConfig::default_max_steps")]
    pub max_dispatch_steps: u64,

    /// Maximum number of processes (root included).
    #[serde(default = "GeneralConfig::default_max_processes")]
    pub max_processes: usize,

    /// EXEC frame rebinding.
    #[serde(default)]
    pub exec_mode: ExecMode,

    /// EXEC cost reconciliation.
    #[serde(default)]
    pub exec_cost: ExecCostPolicy,
}

impl GeneralConfig {
    fn default_max_steps() -> u64 {
        defaults::MAX_DISPATCH_STEPS
    }

    fn default_max_processes() -> usize {
        defaults::MAX_PROCESSES
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            max_dispatch_steps: defaults::MAX_DISPATCH_STEPS,
            max_processes: defaults::MAX_PROCESSES,
            exec_mode: ExecMode::default(),
            exec_cost: ExecCostPolicy::default(),
        }
    }
}

/// CPU burst scaling.
#[derive(Debug, Clone, Deserialize)]
pub struct CpuConfig {
    /// Speed multiplier; a `CPU,n` burst costs `round(n / speed)` cycles.
    #[serde(default = "CpuConfig::default_speed")]
    pub speed: f64,
}

impl CpuConfig {
    fn default_speed() -> f64 {
        defaults::CPU_SPEED
    }

    /// Returns the cycles charged for a burst of `cycles` at the configured speed.
    pub fn scale(&self, cycles: u64) -> u64 {
        if (self.speed - 1.0).abs() < f64::EPSILON {
            return cycles;
        }
        (cycles as f64 / self.speed).round() as u64
    }
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            speed: defaults::CPU_SPEED,
        }
    }
}

/// Interrupt model and interrupt-service timings.
#[derive(Debug, Clone, Deserialize)]
pub struct InterruptConfig {
    /// How SYSCALL and END_IO operands are interpreted.
    #[serde(default)]
    pub model: InterruptModel,

    /// Cycles to switch between user and kernel mode.
    #[serde(default = "InterruptConfig::default_switch_mode")]
    pub switch_mode: u64,

    /// Cycles to save or restore a context.
    #[serde(default = "InterruptConfig::default_context")]
    pub context: u64,

    /// Cycles to find the vector in memory.
    #[serde(default = "InterruptConfig::default_vector_lookup")]
    pub vector_lookup: u64,

    /// Cycles for each ISR body activity.
    #[serde(default = "InterruptConfig::default_isr_activity")]
    pub isr_activity: u64,

    /// Cycles for IRET.
    #[serde(default = "InterruptConfig::default_iret")]
    pub iret: u64,
}

impl InterruptConfig {
    fn default_switch_mode() -> u64 {
        defaults::SWITCH_MODE
    }

    fn default_context() -> u64 {
        defaults::CONTEXT
    }

    fn default_vector_lookup() -> u64 {
        defaults::VECTOR_LOOKUP
    }

    fn default_isr_activity() -> u64 {
        defaults::ISR_ACTIVITY
    }

    fn default_iret() -> u64 {
        defaults::IRET
    }
}

impl Default for InterruptConfig {
    fn default() -> Self {
        Self {
            model: InterruptModel::default(),
            switch_mode: defaults::SWITCH_MODE,
            context: defaults::CONTEXT,
            vector_lookup: defaults::VECTOR_LOOKUP,
            isr_activity: defaults::ISR_ACTIVITY,
            iret: defaults::IRET,
        }
    }
}

/// Output artifact names, relative to the output directory.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Execution log file name.
    #[serde(default = "OutputConfig::default_execution_file")]
    pub execution_file: String,

    /// System status file name.
    #[serde(default = "OutputConfig::default_status_file")]
    pub status_file: String,
}

impl OutputConfig {
    fn default_execution_file() -> String {
        crate::common::constants::EXECUTION_FILE.to_string()
    }

    fn default_status_file() -> String {
        crate::common::constants::STATUS_FILE.to_string()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            execution_file: Self::default_execution_file(),
            status_file: Self::default_status_file(),
        }
    }
}
