use chrono::Duration;
use tempo_core::{ExecError, Outcome};

use crate::mask::MaskHandle;
use crate::race::RaceWinner;

/// One iteration of a bounded recursion (see [`Executor::tail_rec_m`])
pub enum Step<A, B> {
    /// Loop again with a new accumulator
    Continue(A),
    /// Finish with the result
    Done(B),
}

/// Port for a concurrent-effect executor
///
/// This is the full capability surface a scheduling runtime must provide:
/// pure values and sequencing, an error channel, cooperative cancellation
/// with maskable regions, fiber start/join/cancel, pair racing, and time.
///
/// Implementations:
/// - `tempo-runtime::TokioExecutor`: the reference executor over tokio
/// - `tempo-virtual::VirtualExecutor<E>`: the virtual-time layer, itself
///   generic over any `E: Executor`, so executors nest
///
/// Methods are combinators: they *describe* work by returning a
/// `Self::Task<A>`, they never run it. Execution is the implementation's
/// concern (for the reference executor, awaiting the task inside a tokio
/// runtime).
pub trait Executor: Clone + Send + Sync + 'static {
    /// A not-yet-running computation producing an `A`
    type Task<A: Send + 'static>: Send + 'static;

    /// Handle to a started fiber producing an `A`
    type Handle<A: Send + 'static>: Send + 'static;

    /// Poll handle passed to the body of an uncancelable region
    type Mask: MaskHandle<Self> + Clone + Send + Sync + 'static;

    /// A computation that immediately produces `value`
    fn pure<A>(&self, value: A) -> Self::Task<A>
    where
        A: Send + 'static;

    /// A computation that fails on the error channel
    fn raise_error<A>(&self, error: ExecError) -> Self::Task<A>
    where
        A: Send + 'static;

    /// Recover from an error; the handler runs in place of the failed task
    fn handle_error_with<A, H>(&self, task: Self::Task<A>, handler: H) -> Self::Task<A>
    where
        A: Send + 'static,
        H: FnOnce(ExecError) -> Self::Task<A> + Send + 'static;

    /// Sequence: run `task`, then the task produced from its value
    fn flat_map<A, B, F>(&self, task: Self::Task<A>, f: F) -> Self::Task<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        F: FnOnce(A) -> Self::Task<B> + Send + 'static;

    /// Map the produced value
    fn map<A, B, F>(&self, task: Self::Task<A>, f: F) -> Self::Task<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        F: FnOnce(A) -> B + Send + 'static,
    {
        let exec = self.clone();
        self.flat_map(task, move |a| exec.pure(f(a)))
    }

    /// Suspend construction of a task until execution time
    fn defer<A, F>(&self, thunk: F) -> Self::Task<A>
    where
        A: Send + 'static,
        F: FnOnce() -> Self::Task<A> + Send + 'static;

    /// Suspend a side effect until execution time
    fn delay<A, F>(&self, thunk: F) -> Self::Task<A>
    where
        A: Send + 'static,
        F: FnOnce() -> A + Send + 'static,
    {
        let exec = self.clone();
        self.defer(move || {
            let value = thunk();
            exec.pure(value)
        })
    }

    /// Stack-safe bounded recursion: iterate `step` until it returns
    /// [`Step::Done`]
    fn tail_rec_m<A, B, F>(&self, init: A, step: F) -> Self::Task<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        F: FnMut(A) -> Self::Task<Step<A, B>> + Send + 'static,
    {
        let exec = self.clone();
        let mut step = step;
        let first = step(init);
        self.flat_map(first, move |next| match next {
            Step::Continue(a) => exec.tail_rec_m(a, step),
            Step::Done(b) => exec.pure(b),
        })
    }

    /// Yield to other runnable fibers
    fn cede(&self) -> Self::Task<()>;

    /// A computation that never completes (but remains cancelable)
    fn never<A>(&self) -> Self::Task<A>
    where
        A: Send + 'static;

    /// Cancel the current fiber
    fn canceled(&self) -> Self::Task<()>;

    /// Run `first` for its effects, discarding its value or error, then
    /// run `second`; cancellation of `first` still short-circuits
    fn force_r<A, B>(&self, first: Self::Task<A>, second: Self::Task<B>) -> Self::Task<B>
    where
        A: Send + 'static,
        B: Send + 'static;

    /// Attach a finalizer that runs if the task ends up canceled
    fn on_cancel<A>(&self, task: Self::Task<A>, finalizer: Self::Task<()>) -> Self::Task<A>
    where
        A: Send + 'static;

    /// Run `body` masked from cancellation; the [`MaskHandle`] passed to it
    /// restores cancelability for the regions it wraps
    fn uncancelable<A, Body>(&self, body: Body) -> Self::Task<A>
    where
        A: Send + 'static,
        Body: FnOnce(Self::Mask) -> Self::Task<A> + Send + 'static;

    /// Start `task` as a concurrent fiber
    fn start<A>(&self, task: Self::Task<A>) -> Self::Task<Self::Handle<A>>
    where
        A: Send + 'static;

    /// Wait for a fiber and obtain its outcome
    fn join<A>(&self, handle: Self::Handle<A>) -> Self::Task<Outcome<A>>
    where
        A: Send + 'static;

    /// Cancel a fiber and wait until it has stopped
    fn cancel<A>(&self, handle: Self::Handle<A>) -> Self::Task<()>
    where
        A: Send + 'static;

    /// Race two tasks; completes with the first outcome and a handle to the
    /// still-running loser
    fn race_pair<A, B>(
        &self,
        left: Self::Task<A>,
        right: Self::Task<B>,
    ) -> Self::Task<RaceWinner<Self, A, B>>
    where
        A: Send + 'static,
        B: Send + 'static;

    /// Suspend for a duration; negative durations fail with
    /// [`ExecError::NegativeDuration`]
    fn sleep(&self, duration: Duration) -> Self::Task<()>;

    /// Elapsed time on this executor's monotonic clock
    fn monotonic(&self) -> Self::Task<Duration>;

    /// Wall-clock time (duration since the Unix epoch)
    fn real_time(&self) -> Self::Task<Duration>;
}
