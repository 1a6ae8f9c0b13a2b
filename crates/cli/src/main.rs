//! Interrupt-driven process execution simulator CLI.
//!
//! This binary wires the four input files of a run to the simulator core. It performs:
//! 1. **Argument parsing:** Input paths, output directory, and configuration overrides.
//! 2. **Logging:** A `tracing` subscriber on stderr, so diagnostics never mix with the
//!    two data artifacts.
//! 3. **Run and report:** Loads the scenario, runs it to completion, writes
//!    `execution.txt` and `system_status.txt`, and optionally prints statistics.
//!
//! Exit status is 0 when every process terminated and both outputs were written, 1 on
//! any run-fatal error (nothing is written in that case), and 2 on bad arguments.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use procsim_core::config::{Config, ExecCostPolicy, ExecMode, InterruptModel};
use procsim_core::{RunReport, Scenario, ScenarioPaths, SimError, SimResult, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "procsim",
    author,
    version,
    about = "Interrupt-driven process execution simulator",
    long_about = "Interprets a trace of FORK/EXEC/CPU/SYSCALL/END_IO events with IF_CHILD/IF_PARENT/ENDIF blocks and writes a time-stamped execution log plus a final system status table.\n\nExamples:\n  procsim trace.txt vector_table.txt device_table.txt external_files.txt\n  procsim trace.txt vt.txt dt.txt ext.txt --programs progs --exec-cost catalog --stats"
)]
struct Cli {
    /// Trace executed by the root process.
    trace: PathBuf,

    /// Interrupt vector table (read by the vectored interrupt model).
    vector_table: PathBuf,

    /// Device delay table (read by the vectored interrupt model).
    device_table: PathBuf,

    /// External-files listing (`name,cost` per line).
    external_files: PathBuf,

    /// Directory holding `<program>.txt` bodies.
    #[arg(long, default_value = "programs")]
    programs: PathBuf,

    /// Directory receiving the output files.
    #[arg(short, long, default_value = "output_files")]
    output_dir: PathBuf,

    /// JSON configuration file; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// What EXEC does with the sequence that issued it.
    #[arg(long, value_enum)]
    exec_mode: Option<ExecModeArg>,

    /// Which load cost EXEC charges.
    #[arg(long, value_enum)]
    exec_cost: Option<ExecCostArg>,

    /// How SYSCALL and END_IO operands are interpreted.
    #[arg(long, value_enum)]
    interrupt_model: Option<InterruptModelArg>,

    /// CPU speed multiplier; bursts cost round(n / speed) cycles.
    #[arg(long, env = "CPU_SPEED")]
    cpu_speed: Option<f64>,

    /// Maximum dispatch steps before the run is aborted.
    #[arg(long)]
    max_steps: Option<u64>,

    /// Print run statistics to stdout.
    #[arg(long)]
    stats: bool,

    /// Write run statistics as JSON to this path.
    #[arg(long)]
    stats_json: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExecModeArg {
    Resume,
    Replace,
}

impl From<ExecModeArg> for ExecMode {
    fn from(arg: ExecModeArg) -> Self {
        match arg {
            ExecModeArg::Resume => Self::Resume,
            ExecModeArg::Replace => Self::Replace,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExecCostArg {
    Strict,
    Catalog,
    Operand,
}

impl From<ExecCostArg> for ExecCostPolicy {
    fn from(arg: ExecCostArg) -> Self {
        match arg {
            ExecCostArg::Strict => Self::Strict,
            ExecCostArg::Catalog => Self::Catalog,
            ExecCostArg::Operand => Self::Operand,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InterruptModelArg {
    Inline,
    Vectored,
}

impl From<InterruptModelArg> for InterruptModel {
    fn from(arg: InterruptModelArg) -> Self {
        match arg {
            InterruptModelArg::Inline => Self::Inline,
            InterruptModelArg::Vectored => Self::Vectored,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(report) => {
            if cli.stats {
                report.stats.print();
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the stderr `tracing` subscriber.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Builds the effective configuration: file (or defaults), then flag overrides.
fn build_config(cli: &Cli) -> SimResult<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if let Some(mode) = cli.exec_mode {
        config.general.exec_mode = mode.into();
    }
    if let Some(policy) = cli.exec_cost {
        config.general.exec_cost = policy.into();
    }
    if let Some(model) = cli.interrupt_model {
        config.interrupts.model = model.into();
    }
    if let Some(speed) = cli.cpu_speed {
        config.cpu.speed = speed;
    }
    if let Some(steps) = cli.max_steps {
        config.general.max_dispatch_steps = steps;
    }
    config.validate()?;
    Ok(config)
}

/// Loads, runs, and writes one scenario.
///
/// Outputs are written only after the run reached the all-terminated state.
fn run(cli: &Cli) -> SimResult<RunReport> {
    let config = build_config(cli)?;
    let paths = ScenarioPaths {
        trace: cli.trace.clone(),
        vector_table: cli.vector_table.clone(),
        device_table: cli.device_table.clone(),
        external_files: cli.external_files.clone(),
        programs_dir: cli.programs.clone(),
    };

    let scenario = Scenario::load(&paths, &config)?;
    let names = config.output.clone();
    let report = Simulator::new(scenario, config)?.run()?;
    let _ = report.write(&cli.output_dir, &names)?;

    if let Some(path) = &cli.stats_json {
        let json = serde_json::to_string_pretty(&report.stats)
            .map_err(|e| SimError::io(path, io::Error::from(e)))?;
        fs::write(path, json).map_err(|e| SimError::io(path, e))?;
    }
    Ok(report)
}
