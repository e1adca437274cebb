use tempo_clock::LogicalClock;
use tempo_ports::Executor;

/// A clock-ambient computation over a base executor
///
/// A timed task is a one-shot function from (base executor, ambient clock)
/// to a base task. Sequencing reuses the same ambient clock handle for every
/// step of a branch; only `start` and `race_pair` fork it.
///
/// Lowering is lazy: `provide` wraps the function in the base executor's
/// `defer`, so clock effects (fork/advance/read/merge) happen when the base
/// task actually runs, not when the computation is composed. Without this,
/// eagerly built arguments of two-task combinators (`force_r`, `on_cancel`)
/// would mutate the clock ahead of their turn.
pub struct TimedTask<E: Executor, A: Send + 'static> {
    run: Box<dyn FnOnce(&E, LogicalClock) -> E::Task<A> + Send + 'static>,
}

impl<E: Executor, A: Send + 'static> TimedTask<E, A> {
    pub(crate) fn new(run: impl FnOnce(&E, LogicalClock) -> E::Task<A> + Send + 'static) -> Self {
        Self { run: Box::new(run) }
    }

    /// Lower onto the base executor under the given ambient clock
    pub(crate) fn provide(self, base: &E, clock: LogicalClock) -> E::Task<A> {
        let run = self.run;
        let deferred_base = base.clone();
        base.defer(move || run(&deferred_base, clock))
    }
}

#[cfg(test)]
mod tests {
    use crate::VirtualExecutor;
    use tempo_core::Outcome;
    use tempo_ports::Executor;
    use tempo_runtime::TokioExecutor;

    #[tokio::test]
    async fn test_lift_round_trips_the_base_result() {
        let base = TokioExecutor::new();
        let vt = VirtualExecutor::new(base.clone());

        let direct = base.execute(base.lift(async { 41 + 1 })).await;
        let lifted = base
            .execute(vt.run(vt.lift(base.lift(async { 41 + 1 }))))
            .await;

        assert_eq!(direct, Outcome::Completed(42));
        assert_eq!(lifted, direct);
    }

    #[tokio::test]
    async fn test_lift_propagates_failure_unchanged() {
        let base = TokioExecutor::new();
        let vt = VirtualExecutor::new(base.clone());

        let error = tempo_core::ExecError::raised("base failure");
        let failing: tempo_runtime::TokioTask<i32> = base.raise_error(error.clone());
        let outcome = base.execute(vt.run(vt.lift(failing))).await;

        assert_eq!(outcome, Outcome::Errored(error));
    }

    #[tokio::test]
    async fn test_run_starts_from_a_zero_clock() {
        let base = TokioExecutor::new();
        let vt = VirtualExecutor::new(base.clone());

        // Each run gets its own fresh clock, even after a previous run slept
        for _ in 0..2 {
            let program = vt.flat_map(vt.sleep(chrono::Duration::milliseconds(30)), {
                let vt = vt.clone();
                move |_| vt.monotonic()
            });
            let outcome = base.execute(vt.run(program)).await;
            assert_eq!(
                outcome,
                Outcome::Completed(chrono::Duration::milliseconds(30))
            );
        }
    }
}
