//! Program Catalog.
//!
//! Maps program names to their load cost and decoded body. The catalog is populated
//! once, before the trace starts, and is read-only afterwards; bodies are shared with
//! every process that EXECs them through `Arc<Sequence>`.
//!
//! Bodies come from a [`ProgramSource`]: [`DirectorySource`] reads
//! `<dir>/<name>.txt`, [`MemorySource`] serves in-memory text (tests, embedding).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::common::constants::PROGRAM_EXTENSION;
use crate::common::error::{ReferenceError, SimError, SimResult};
use crate::core::sequence::Sequence;

/// A registered program.
#[derive(Debug)]
pub struct Program {
    /// Program name.
    pub name: Arc<str>,
    /// Cycles consumed before its first instruction runs.
    pub cost: u64,
    /// Decoded, preparsed body.
    pub body: Arc<Sequence>,
}

/// Supplier of program body text.
pub trait ProgramSource {
    /// Returns the body text of `name`, or `None` if the program has no body file.
    fn read_body(&self, name: &str) -> SimResult<Option<String>>;
}

/// Reads bodies from `<dir>/<name>.txt`.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    /// Creates a source rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the body file for `name`.
    pub fn body_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{PROGRAM_EXTENSION}"))
    }
}

impl ProgramSource for DirectorySource {
    fn read_body(&self, name: &str) -> SimResult<Option<String>> {
        let path = self.body_path(name);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SimError::io(path, e)),
        }
    }
}

/// Serves bodies from memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    bodies: BTreeMap<String, String>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the body of `name`.
    #[must_use]
    pub fn with_body(mut self, name: &str, text: &str) -> Self {
        let _ = self.bodies.insert(name.to_string(), text.to_string());
        self
    }
}

impl ProgramSource for MemorySource {
    fn read_body(&self, name: &str) -> SimResult<Option<String>> {
        Ok(self.bodies.get(name).cloned())
    }
}

/// Name to program mapping, sorted by name.
#[derive(Debug, Default)]
pub struct ProgramCatalog {
    programs: BTreeMap<Arc<str>, Arc<Program>>,
}

impl ProgramCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` with its load cost and an empty body.
    ///
    /// Registering a name again updates its cost and keeps any loaded body.
    pub fn register(&mut self, name: &str, cost: u64) {
        let body = self
            .programs
            .get(name)
            .map_or_else(|| Arc::new(Sequence::empty(name)), |p| Arc::clone(&p.body));
        self.insert(name, cost, body);
    }

    /// Decodes the body of the registered program `name` from `source`.
    ///
    /// A missing body file leaves the program with an empty body.
    ///
    /// # Returns
    ///
    /// `Ok(false)` when the source had no body, `Ok(true)` when one was loaded.
    pub fn load_body(&mut self, name: &str, source: &dyn ProgramSource) -> SimResult<bool> {
        let Some(cost) = self.programs.get(name).map(|p| p.cost) else {
            return Err(SimError::InvalidConfig(format!(
                "program `{name}` must be registered before its body is loaded"
            )));
        };

        let Some(text) = source.read_body(name)? else {
            warn!(program = name, "no body file; program loads as an empty body");
            return Ok(false);
        };

        let body = Sequence::compile(name, &text).map_err(|errors| SimError::Structural {
            origin: format!("program `{name}`"),
            errors,
        })?;
        debug!(program = name, instructions = body.len(), "program body loaded");
        self.insert(name, cost, Arc::new(body));
        Ok(true)
    }

    /// Loads the body of every registered program.
    pub fn load_all(&mut self, source: &dyn ProgramSource) -> SimResult<()> {
        let names: Vec<Arc<str>> = self.programs.keys().cloned().collect();
        for name in names {
            let _ = self.load_body(&name, source)?;
        }
        Ok(())
    }

    /// Looks up a registered program.
    pub fn resolve(&self, name: &str) -> Result<Arc<Program>, ReferenceError> {
        self.programs
            .get(name)
            .cloned()
            .ok_or_else(|| ReferenceError::UnknownProgram {
                name: name.to_string(),
            })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.programs.keys().map(AsRef::as_ref)
    }

    /// Number of registered programs.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    fn insert(&mut self, name: &str, cost: u64, body: Arc<Sequence>) {
        let name: Arc<str> = Arc::from(name);
        let program = Program {
            name: Arc::clone(&name),
            cost,
            body,
        };
        let _ = self.programs.insert(name, Arc::new(program));
    }
}
