use chrono::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Counter of elapsed virtual duration for one execution branch
///
/// The counter is exclusively mutated by its owning branch; other branches
/// only see the value through an explicit synchronization event (`fork` copy,
/// `merge_max` on join, `set` on race completion). Those events happen at
/// points the executor has already serialized through its own completion
/// signaling; the acquire/release atomics here make the happens-before edge
/// explicit rather than relying on it.
///
/// Resolution is whole nanoseconds. Advancing saturates at the representable
/// maximum (roughly 292 years of virtual time).
pub struct LogicalClock {
    /// Elapsed virtual time in nanoseconds
    elapsed_ns: Arc<AtomicI64>,
}

impl LogicalClock {
    /// Create a clock at zero elapsed time
    pub fn new() -> Self {
        Self {
            elapsed_ns: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Create an independent copy initialized to the current value
    ///
    /// Subsequent mutation of either clock does not affect the other.
    pub fn fork(&self) -> Self {
        Self {
            elapsed_ns: Arc::new(AtomicI64::new(self.raw_ns())),
        }
    }

    /// Add a duration to the elapsed time
    ///
    /// Callable only by the owning branch. Negative deltas are clamped to
    /// zero so the operation is total; the executor rejects negative sleeps
    /// before they reach the clock.
    pub fn advance(&self, delta: Duration) {
        if delta <= Duration::zero() {
            return;
        }
        let nanos = delta.num_nanoseconds().unwrap_or(i64::MAX);
        let _ = self
            .elapsed_ns
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(nanos))
            });
    }

    /// Current elapsed virtual duration
    pub fn read(&self) -> Duration {
        Duration::nanoseconds(self.raw_ns())
    }

    /// Overwrite the elapsed time with another clock's value
    ///
    /// Used when a race completes: the ambient clock adopts the winner's
    /// elapsed time.
    pub fn set(&self, value: Duration) {
        let nanos = value.num_nanoseconds().unwrap_or(i64::MAX);
        self.elapsed_ns.store(nanos, Ordering::Release);
    }

    /// Merge another clock's value by taking the maximum
    ///
    /// Used on join: waiting for a branch that ran for virtual duration D
    /// advances the waiter to at least D.
    pub fn merge_max(&self, other: &LogicalClock) {
        self.elapsed_ns.fetch_max(other.raw_ns(), Ordering::AcqRel);
    }

    fn raw_ns(&self) -> i64 {
        self.elapsed_ns.load(Ordering::Acquire)
    }
}

impl Clone for LogicalClock {
    /// Shares the underlying counter: a clone is the same ambient clock
    /// handle, not an independent copy. Use [`LogicalClock::fork`] for that.
    fn clone(&self) -> Self {
        Self {
            elapsed_ns: Arc::clone(&self.elapsed_ns),
        }
    }
}

impl Default for LogicalClock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LogicalClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicalClock")
            .field("elapsed", &self.read())
            .finish()
    }
}
