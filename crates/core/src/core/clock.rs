//! Global cycle counter.
//!
//! The clock is the only shared mutable resource of a run. It is owned by the
//! simulator, never goes backwards, and only moves through [`GlobalClock::advance`].

/// Monotonic simulation clock, in cycles.
#[derive(Debug, Clone, Default)]
pub struct GlobalClock {
    now: u64,
}

impl GlobalClock {
    /// Creates a clock at cycle zero.
    pub const fn new() -> Self {
        Self { now: 0 }
    }

    /// Returns the current cycle.
    #[inline]
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Advances the clock by `cycles`.
    ///
    /// # Returns
    ///
    /// The cycle at which the advanced-over interval started.
    #[inline]
    pub(crate) const fn advance(&mut self, cycles: u64) -> u64 {
        let start = self.now;
        self.now = self.now.saturating_add(cycles);
        start
    }
}
