//! Simulation driver.
//!
//! This module contains everything between the input files and the output artifacts:
//! 1. **Catalog:** Registered programs and their bodies.
//! 2. **Loader:** Reading and validating the inputs of a run.
//! 3. **Simulator:** The run loop that dispatches live instructions pass by pass.

/// Program catalog and body sources.
pub mod catalog;

/// Input file reading and scenario assembly.
pub mod loader;

/// Run loop and instruction dispatch.
pub mod simulator;

pub use catalog::{DirectorySource, MemorySource, Program, ProgramCatalog, ProgramSource};
pub use loader::{Scenario, ScenarioPaths};
pub use simulator::{RunReport, Simulator};
