

/// End-to-end scenarios through the run loop.
pub mod simulator;
