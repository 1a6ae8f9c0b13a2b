//! Interrupt Vector and Device Tables.
//!
//! The two auxiliary inputs of a run. Both are indexed by device number:
//! 1. **Vector table:** one ISR address per line (for example `0X01E3`).
//! 2. **Device table:** one non-negative I/O delay in cycles per line.
//!
//! They are only consulted by the vectored interrupt model; under the inline model the
//! loader never opens them.

use std::path::Path;

use tracing::warn;

use crate::common::constants::COMMENT_PREFIX;
use crate::common::error::{SimError, SimResult};

/// Vector and device tables of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTables {
    vectors: Vec<String>,
    delays: Vec<u64>,
}

impl DeviceTables {
    /// Builds tables from already-parsed entries.
    pub const fn new(vectors: Vec<String>, delays: Vec<u64>) -> Self {
        Self { vectors, delays }
    }

    /// Parses both tables from their file contents.
    ///
    /// # Arguments
    ///
    /// * `vector_path`, `vector_text` - Vector table path (for errors) and contents.
    /// * `device_path`, `device_text` - Device table path (for errors) and contents.
    pub fn parse(
        vector_path: &Path,
        vector_text: &str,
        device_path: &Path,
        device_text: &str,
    ) -> SimResult<Self> {
        let vectors = entries(vector_text)
            .map(|(_, entry)| entry.to_string())
            .collect();

        let delays = entries(device_text)
            .map(|(line, entry)| {
                entry
                    .parse::<u64>()
                    .map_err(|_| SimError::MalformedTable {
                        path: device_path.to_path_buf(),
                        line,
                        reason: format!("device delay `{entry}` is not a non-negative integer"),
                    })
            })
            .collect::<SimResult<Vec<_>>>()?;

        let tables = Self::new(vectors, delays);
        if tables.vectors.len() != tables.delays.len() {
            warn!(
                vectors = tables.vectors.len(),
                devices = tables.delays.len(),
                "{} and {} disagree on the device count; only the first {} devices are usable",
                vector_path.display(),
                device_path.display(),
                tables.len()
            );
        }
        Ok(tables)
    }

    /// ISR address for `device`.
    pub fn vector(&self, device: u64) -> Option<&str> {
        self.vectors
            .get(usize::try_from(device).ok()?)
            .map(String::as_str)
    }

    /// I/O delay for `device`.
    pub fn delay(&self, device: u64) -> Option<u64> {
        self.delays.get(usize::try_from(device).ok()?).copied()
    }

    /// Number of devices defined by both tables.
    pub fn len(&self) -> usize {
        self.vectors.len().min(self.delays.len())
    }

    /// Returns `true` if no device is usable.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Yields `(line, entry)` for every non-blank, non-comment line. The first
/// comma-separated field is the entry.
fn entries(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().filter_map(|(idx, line)| {
        let entry = line.split(',').next().unwrap_or_default().trim();
        (!entry.is_empty() && !entry.starts_with(COMMENT_PREFIX)).then_some((idx + 1, entry))
    })
}
