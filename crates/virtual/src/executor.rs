use chrono::Duration;
use tempo_clock::LogicalClock;
use tempo_core::{ExecError, Outcome};
use tempo_ports::{Executor, MaskHandle, RaceWinner, Step};

use crate::context::TimedTask;
use crate::fiber::TimedFiber;

/// Virtual-time executor over a base executor
///
/// A second implementation of the [`Executor`] capability surface: every
/// primitive delegates to the base executor while an ambient
/// [`LogicalClock`] is threaded through the computation. `sleep` advances
/// the clock instead of suspending, `monotonic` reads it, and fibers carry
/// clock forks that are reconciled on join and race completion.
///
/// Since `VirtualExecutor<E>` is itself an `Executor`, layers nest:
/// `VirtualExecutor<VirtualExecutor<E>>` is well-formed.
pub struct VirtualExecutor<E: Executor> {
    base: E,
}

impl<E: Executor> VirtualExecutor<E> {
    pub fn new(base: E) -> Self {
        Self { base }
    }

    /// The wrapped base executor
    pub fn base(&self) -> &E {
        &self.base
    }

    /// Embed a base computation with no clock interaction
    pub fn lift<A>(&self, task: E::Task<A>) -> TimedTask<E, A>
    where
        A: Send + 'static,
    {
        TimedTask::new(move |_base, _clock| task)
    }

    /// Execute a timed computation from a fresh zero clock
    ///
    /// Returns the lowered base task; its result, failure, or cancellation
    /// is exactly what the base executor produces.
    pub fn run<A>(&self, task: TimedTask<E, A>) -> E::Task<A>
    where
        A: Send + 'static,
    {
        task.provide(&self.base, LogicalClock::new())
    }

    /// Pairwise combination of two results
    ///
    /// Both computations run to completion in sequence under the same
    /// ambient clock; there is no virtual-time interaction.
    pub fn combine<A>(&self, left: TimedTask<E, A>, right: TimedTask<E, A>) -> TimedTask<E, A>
    where
        A: std::ops::Add<Output = A> + Send + 'static,
    {
        let this = self.clone();
        self.flat_map(left, move |a| this.map(right, move |b| a + b))
    }

    /// Inverse of a result
    pub fn invert<A>(&self, task: TimedTask<E, A>) -> TimedTask<E, A>
    where
        A: std::ops::Neg<Output = A> + Send + 'static,
    {
        self.map(task, |a| -a)
    }
}

impl<E: Executor> Clone for VirtualExecutor<E> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
        }
    }
}

/// Poll handle for uncancelable regions under virtual time
///
/// Re-wraps the base executor's poll while threading the same ambient clock,
/// so code inside and outside the region observes the same logical time.
/// Masking semantics are entirely the base executor's.
pub struct TimedMask<E: Executor> {
    inner: E::Mask,
}

impl<E: Executor> Clone for TimedMask<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: Executor> MaskHandle<VirtualExecutor<E>> for TimedMask<E> {
    fn unmask<A>(&self, task: TimedTask<E, A>) -> TimedTask<E, A>
    where
        A: Send + 'static,
    {
        let inner = self.inner.clone();
        TimedTask::new(move |base: &E, clock| inner.unmask(task.provide(base, clock)))
    }
}

impl<E: Executor> Executor for VirtualExecutor<E> {
    type Task<A: Send + 'static> = TimedTask<E, A>;
    type Handle<A: Send + 'static> = TimedFiber<E, A>;
    type Mask = TimedMask<E>;

    fn pure<A>(&self, value: A) -> TimedTask<E, A>
    where
        A: Send + 'static,
    {
        TimedTask::new(move |base: &E, _clock| base.pure(value))
    }

    fn raise_error<A>(&self, error: ExecError) -> TimedTask<E, A>
    where
        A: Send + 'static,
    {
        TimedTask::new(move |base: &E, _clock| base.raise_error(error))
    }

    fn handle_error_with<A, H>(&self, task: TimedTask<E, A>, handler: H) -> TimedTask<E, A>
    where
        A: Send + 'static,
        H: FnOnce(ExecError) -> TimedTask<E, A> + Send + 'static,
    {
        TimedTask::new(move |base: &E, clock| {
            let handler_base = base.clone();
            let handler_clock = clock.clone();
            base.handle_error_with(task.provide(base, clock), move |e| {
                handler(e).provide(&handler_base, handler_clock)
            })
        })
    }

    fn flat_map<A, B, F>(&self, task: TimedTask<E, A>, f: F) -> TimedTask<E, B>
    where
        A: Send + 'static,
        B: Send + 'static,
        F: FnOnce(A) -> TimedTask<E, B> + Send + 'static,
    {
        TimedTask::new(move |base: &E, clock| {
            let next_base = base.clone();
            let next_clock = clock.clone();
            base.flat_map(task.provide(base, clock), move |a| {
                f(a).provide(&next_base, next_clock)
            })
        })
    }

    fn defer<A, F>(&self, thunk: F) -> TimedTask<E, A>
    where
        A: Send + 'static,
        F: FnOnce() -> TimedTask<E, A> + Send + 'static,
    {
        TimedTask::new(move |base: &E, clock| thunk().provide(base, clock))
    }

    // Delegates to the base recursion primitive; every iteration is lowered
    // under the same ambient clock.
    fn tail_rec_m<A, B, F>(&self, init: A, step: F) -> TimedTask<E, B>
    where
        A: Send + 'static,
        B: Send + 'static,
        F: FnMut(A) -> TimedTask<E, Step<A, B>> + Send + 'static,
    {
        TimedTask::new(move |base: &E, clock| {
            let step_base = base.clone();
            let mut step = step;
            base.tail_rec_m(init, move |a| step(a).provide(&step_base, clock.clone()))
        })
    }

    fn cede(&self) -> TimedTask<E, ()> {
        TimedTask::new(move |base: &E, _clock| base.cede())
    }

    fn never<A>(&self) -> TimedTask<E, A>
    where
        A: Send + 'static,
    {
        TimedTask::new(move |base: &E, _clock| base.never())
    }

    fn canceled(&self) -> TimedTask<E, ()> {
        TimedTask::new(move |base: &E, _clock| base.canceled())
    }

    fn force_r<A, B>(&self, first: TimedTask<E, A>, second: TimedTask<E, B>) -> TimedTask<E, B>
    where
        A: Send + 'static,
        B: Send + 'static,
    {
        TimedTask::new(move |base: &E, clock| {
            base.force_r(
                first.provide(base, clock.clone()),
                second.provide(base, clock),
            )
        })
    }

    fn on_cancel<A>(&self, task: TimedTask<E, A>, finalizer: TimedTask<E, ()>) -> TimedTask<E, A>
    where
        A: Send + 'static,
    {
        TimedTask::new(move |base: &E, clock| {
            base.on_cancel(
                task.provide(base, clock.clone()),
                finalizer.provide(base, clock),
            )
        })
    }

    fn uncancelable<A, Body>(&self, body: Body) -> TimedTask<E, A>
    where
        A: Send + 'static,
        Body: FnOnce(TimedMask<E>) -> TimedTask<E, A> + Send + 'static,
    {
        TimedTask::new(move |base: &E, clock| {
            let body_base = base.clone();
            base.uncancelable(move |mask| {
                let timed = TimedMask { inner: mask };
                body(timed).provide(&body_base, clock)
            })
        })
    }

    fn start<A>(&self, task: TimedTask<E, A>) -> TimedTask<E, TimedFiber<E, A>>
    where
        A: Send + 'static,
    {
        TimedTask::new(move |base: &E, clock| {
            let child_clock = clock.fork();
            let fiber_clock = child_clock.clone();
            let started = base.start(task.provide(base, child_clock));
            base.map(started, move |handle| TimedFiber::new(fiber_clock, handle))
        })
    }

    fn join<A>(&self, handle: TimedFiber<E, A>) -> TimedTask<E, Outcome<A>>
    where
        A: Send + 'static,
    {
        TimedTask::new(move |base: &E, clock| {
            let (fiber_clock, inner) = handle.into_parts();
            base.map(base.join(inner), move |outcome| {
                clock.merge_max(&fiber_clock);
                outcome
            })
        })
    }

    fn cancel<A>(&self, handle: TimedFiber<E, A>) -> TimedTask<E, ()>
    where
        A: Send + 'static,
    {
        TimedTask::new(move |base: &E, _clock| base.cancel(handle.into_inner()))
    }

    fn race_pair<A, B>(
        &self,
        left: TimedTask<E, A>,
        right: TimedTask<E, B>,
    ) -> TimedTask<E, RaceWinner<Self, A, B>>
    where
        A: Send + 'static,
        B: Send + 'static,
    {
        TimedTask::new(move |base: &E, clock| {
            let left_clock = clock.fork();
            let right_clock = clock.fork();
            let raced = base.race_pair(
                left.provide(base, left_clock.clone()),
                right.provide(base, right_clock.clone()),
            );
            // Winner selection is the base executor's real completion order;
            // the ambient clock adopts the winner's elapsed virtual time.
            base.map(raced, move |winner| match winner {
                RaceWinner::Left(outcome, loser) => {
                    clock.set(left_clock.read());
                    RaceWinner::Left(outcome, TimedFiber::new(right_clock, loser))
                }
                RaceWinner::Right(loser, outcome) => {
                    clock.set(right_clock.read());
                    RaceWinner::Right(TimedFiber::new(left_clock, loser), outcome)
                }
            })
        })
    }

    fn sleep(&self, duration: Duration) -> TimedTask<E, ()> {
        TimedTask::new(move |base: &E, clock| {
            if duration < Duration::zero() {
                base.raise_error(ExecError::NegativeDuration(
                    duration.num_nanoseconds().unwrap_or(i64::MIN),
                ))
            } else {
                clock.advance(duration);
                base.pure(())
            }
        })
    }

    fn monotonic(&self) -> TimedTask<E, Duration> {
        TimedTask::new(move |base: &E, clock| base.delay(move || clock.read()))
    }

    /// Wall-clock time is not modeled; always zero
    fn real_time(&self) -> TimedTask<E, Duration> {
        TimedTask::new(move |base: &E, _clock| base.pure(Duration::zero()))
    }
}
