//! Scenario Loading.
//!
//! This module turns the input files of a run into an immutable [`Scenario`]. It performs:
//! 1. **File reading:** Every input is read up front; a missing file is an I/O error
//!    naming its path.
//! 2. **Decoding:** The trace and every program body are decoded and preparsed, so all
//!    structural errors surface before any cycle is charged.
//! 3. **Catalog population:** The external-files listing registers each program's load
//!    cost, then bodies are loaded from the programs directory.
//! 4. **Device tables:** The vector and device tables are parsed only for the vectored
//!    interrupt model; otherwise their paths are carried untouched.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::common::constants::{COMMENT_PREFIX, FIELD_SEPARATOR, TRACE_PROGRAM};
use crate::common::error::{SimError, SimResult};
use crate::config::{Config, InterruptModel};
use crate::core::sequence::Sequence;
use crate::devices::DeviceTables;
use crate::sim::catalog::{DirectorySource, ProgramCatalog, ProgramSource};

/// Input file locations of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioPaths {
    /// Top-level trace for the root process.
    pub trace: PathBuf,
    /// Interrupt vector table.
    pub vector_table: PathBuf,
    /// Device delay table.
    pub device_table: PathBuf,
    /// External-files listing (`name,cost` per line).
    pub external_files: PathBuf,
    /// Directory holding `<name>.txt` program bodies.
    pub programs_dir: PathBuf,
}

/// Fully loaded, immutable inputs of a run.
#[derive(Debug)]
pub struct Scenario {
    /// Decoded trace run by the root process.
    pub trace: Arc<Sequence>,
    /// Registered programs with decoded bodies.
    pub catalog: ProgramCatalog,
    /// Vector and device tables (empty under the inline interrupt model).
    pub devices: DeviceTables,
}

impl Scenario {
    /// Assembles a scenario from already-built parts.
    pub fn new(trace: Arc<Sequence>, catalog: ProgramCatalog) -> Self {
        Self {
            trace,
            catalog,
            devices: DeviceTables::default(),
        }
    }

    /// Replaces the device tables.
    #[must_use]
    pub fn with_devices(mut self, devices: DeviceTables) -> Self {
        self.devices = devices;
        self
    }

    /// Builds a scenario from in-memory trace and listing text.
    ///
    /// # Arguments
    ///
    /// * `trace` - Trace source text.
    /// * `listing` - External-files listing text.
    /// * `bodies` - Supplier of program body text.
    pub fn from_sources(trace: &str, listing: &str, bodies: &dyn ProgramSource) -> SimResult<Self> {
        let trace = compile("trace", trace)?;
        let catalog = build_catalog(Path::new("external_files"), listing, bodies)?;
        Ok(Self::new(trace, catalog))
    }

    /// Reads, decodes, and validates every input of a run.
    pub fn load(paths: &ScenarioPaths, config: &Config) -> SimResult<Self> {
        let trace_text = read_text(&paths.trace)?;
        let trace = compile(&paths.trace.display().to_string(), &trace_text)?;

        let listing = read_text(&paths.external_files)?;
        let source = DirectorySource::new(&paths.programs_dir);
        let catalog = build_catalog(&paths.external_files, &listing, &source)?;

        let devices = match config.interrupts.model {
            InterruptModel::Vectored => DeviceTables::parse(
                &paths.vector_table,
                &read_text(&paths.vector_table)?,
                &paths.device_table,
                &read_text(&paths.device_table)?,
            )?,
            InterruptModel::Inline => DeviceTables::default(),
        };

        info!(
            trace = %paths.trace.display(),
            instructions = trace.len(),
            programs = catalog.len(),
            devices = devices.len(),
            "scenario loaded"
        );
        Ok(Self::new(trace, catalog).with_devices(devices))
    }
}

/// Reads a whole input file.
pub fn read_text(path: &Path) -> SimResult<String> {
    fs::read_to_string(path).map_err(|e| SimError::io(path, e))
}

/// Parses the external-files listing into `(name, cost)` pairs, in file order.
///
/// Blank lines and `#` comments are skipped. A missing name, a cost that is not a
/// non-negative integer, or a repeated name is a `MalformedTable` error.
pub fn parse_listing(path: &Path, text: &str) -> SimResult<Vec<(String, u64)>> {
    let mut seen = BTreeSet::new();
    let mut entries = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            continue;
        }
        let malformed = |reason: String| SimError::MalformedTable {
            path: path.to_path_buf(),
            line: idx + 1,
            reason,
        };

        let (name, cost) = line
            .split_once(FIELD_SEPARATOR)
            .map(|(name, cost)| (name.trim(), cost.trim()))
            .ok_or_else(|| malformed(format!("expected `name,cost`, got `{line}`")))?;
        if name.is_empty() {
            return Err(malformed("program name is empty".to_string()));
        }
        let cost = cost.parse::<u64>().map_err(|_| {
            malformed(format!(
                "load cost `{cost}` of `{name}` is not a non-negative integer"
            ))
        })?;
        if !seen.insert(name.to_string()) {
            return Err(malformed(format!("program `{name}` is listed twice")));
        }
        entries.push((name.to_string(), cost));
    }
    Ok(entries)
}

fn build_catalog(
    listing_path: &Path,
    listing: &str,
    source: &dyn ProgramSource,
) -> SimResult<ProgramCatalog> {
    let mut catalog = ProgramCatalog::new();
    for (name, cost) in parse_listing(listing_path, listing)? {
        catalog.register(&name, cost);
    }
    catalog.load_all(source)?;
    Ok(catalog)
}

fn compile(origin: &str, text: &str) -> SimResult<Arc<Sequence>> {
    Sequence::compile(TRACE_PROGRAM, text)
        .map(Arc::new)
        .map_err(|errors| SimError::Structural {
            origin: origin.to_string(),
            errors,
        })
}
