use tempo_clock::LogicalClock;
use tempo_ports::Executor;

/// Handle to a fiber started under virtual time
///
/// Pairs the base executor's native handle with the clock fork the branch is
/// running under. The handle shares the branch's counter, so the branch's
/// final elapsed time is visible here once the base executor has signaled
/// completion.
///
/// Joining max-merges the fiber's clock into the caller's ambient clock
/// ("semantic blocking": waiting on a branch that ran for virtual duration D
/// advances the waiter to at least D). Cancelling touches no clock.
pub struct TimedFiber<E: Executor, A: Send + 'static> {
    clock: LogicalClock,
    inner: E::Handle<A>,
}

impl<E: Executor, A: Send + 'static> TimedFiber<E, A> {
    pub(crate) fn new(clock: LogicalClock, inner: E::Handle<A>) -> Self {
        Self { clock, inner }
    }

    /// The clock fork this fiber runs under
    pub fn clock(&self) -> &LogicalClock {
        &self.clock
    }

    pub(crate) fn into_parts(self) -> (LogicalClock, E::Handle<A>) {
        (self.clock, self.inner)
    }

    pub(crate) fn into_inner(self) -> E::Handle<A> {
        self.inner
    }
}
