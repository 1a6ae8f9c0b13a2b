//! # Unit Components
//!
//! Tests grouped like the crate's own modules.



/// Vector and device table parsing.
pub mod devices;


/// Execution log and status table rendering, atomic writes.
pub mod output;


/// Catalog, loader, and simulator scenarios.
pub mod sim;

/// Run statistics.
pub mod stats;
