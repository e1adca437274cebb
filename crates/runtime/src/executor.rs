use std::future::Future;
use std::time::Instant;

use chrono::Duration;
use tempo_core::{ExecError, Outcome};
use tempo_ports::{Executor, MaskHandle, RaceWinner, Step};

use crate::context::FiberCx;
use crate::fiber::{TokioFiber, settle};
use crate::task::TokioTask;

/// Reference executor over the tokio runtime
///
/// Fibers are tokio tasks, racing is `tokio::select!` over their join
/// handles, and cancellation is the cooperative protocol described in the
/// crate docs. `monotonic` measures elapsed time since this executor was
/// constructed.
///
/// Must be used from within a tokio runtime (`#[tokio::main]`,
/// `#[tokio::test]`).
#[derive(Clone)]
pub struct TokioExecutor {
    epoch: Instant,
}

impl TokioExecutor {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Embed an arbitrary future as a task on this executor
    pub fn lift<A, F>(&self, fut: F) -> TokioTask<A>
    where
        A: Send + 'static,
        F: Future<Output = A> + Send + 'static,
    {
        TokioTask::from_future(fut)
    }

    /// Run a task as a top-level fiber and wait for its outcome
    pub async fn execute<A>(&self, task: TokioTask<A>) -> Outcome<A>
    where
        A: Send + 'static,
    {
        task.run(FiberCx::root()).await
    }
}

impl Default for TokioExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll handle for uncancelable regions on the tokio executor
///
/// Remembers the mask depth in effect when its region was entered.
#[derive(Clone, Copy)]
pub struct TokioMask {
    restore: usize,
}

impl MaskHandle<TokioExecutor> for TokioMask {
    fn unmask<A>(&self, task: TokioTask<A>) -> TokioTask<A>
    where
        A: Send + 'static,
    {
        let restore = self.restore;
        TokioTask::new(move |cx| task.run(cx.with_mask(restore)))
    }
}

impl Executor for TokioExecutor {
    type Task<A: Send + 'static> = TokioTask<A>;
    type Handle<A: Send + 'static> = TokioFiber<A>;
    type Mask = TokioMask;

    fn pure<A>(&self, value: A) -> TokioTask<A>
    where
        A: Send + 'static,
    {
        TokioTask::new(move |_cx| Box::pin(async move { Outcome::Completed(value) }))
    }

    fn raise_error<A>(&self, error: ExecError) -> TokioTask<A>
    where
        A: Send + 'static,
    {
        TokioTask::new(move |_cx| Box::pin(async move { Outcome::Errored(error) }))
    }

    fn handle_error_with<A, H>(&self, task: TokioTask<A>, handler: H) -> TokioTask<A>
    where
        A: Send + 'static,
        H: FnOnce(ExecError) -> TokioTask<A> + Send + 'static,
    {
        TokioTask::new(move |cx| {
            Box::pin(async move {
                match task.run(cx.clone()).await {
                    Outcome::Errored(e) => handler(e).run(cx).await,
                    other => other,
                }
            })
        })
    }

    fn flat_map<A, B, F>(&self, task: TokioTask<A>, f: F) -> TokioTask<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        F: FnOnce(A) -> TokioTask<B> + Send + 'static,
    {
        TokioTask::new(move |cx| {
            Box::pin(async move {
                if cx.should_cancel() {
                    return Outcome::Canceled;
                }
                match task.run(cx.clone()).await {
                    Outcome::Completed(a) => {
                        if cx.should_cancel() {
                            return Outcome::Canceled;
                        }
                        f(a).run(cx).await
                    }
                    Outcome::Errored(e) => Outcome::Errored(e),
                    Outcome::Canceled => Outcome::Canceled,
                }
            })
        })
    }

    fn defer<A, F>(&self, thunk: F) -> TokioTask<A>
    where
        A: Send + 'static,
        F: FnOnce() -> TokioTask<A> + Send + 'static,
    {
        TokioTask::new(move |cx| Box::pin(async move { thunk().run(cx).await }))
    }

    // Loop instead of the recursive default: poll depth stays constant no
    // matter how many iterations run.
    fn tail_rec_m<A, B, F>(&self, init: A, step: F) -> TokioTask<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        F: FnMut(A) -> TokioTask<Step<A, B>> + Send + 'static,
    {
        TokioTask::new(move |cx| {
            Box::pin(async move {
                let mut step = step;
                let mut acc = init;
                loop {
                    if cx.should_cancel() {
                        return Outcome::Canceled;
                    }
                    match step(acc).run(cx.clone()).await {
                        Outcome::Completed(Step::Continue(a)) => acc = a,
                        Outcome::Completed(Step::Done(b)) => return Outcome::Completed(b),
                        Outcome::Errored(e) => return Outcome::Errored(e),
                        Outcome::Canceled => return Outcome::Canceled,
                    }
                }
            })
        })
    }

    fn cede(&self) -> TokioTask<()> {
        TokioTask::new(move |cx| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                if cx.should_cancel() {
                    Outcome::Canceled
                } else {
                    Outcome::Completed(())
                }
            })
        })
    }

    fn never<A>(&self) -> TokioTask<A>
    where
        A: Send + 'static,
    {
        TokioTask::new(move |cx| {
            Box::pin(async move {
                if cx.cancelable() {
                    cx.cancellation().await;
                    Outcome::Canceled
                } else {
                    std::future::pending().await
                }
            })
        })
    }

    fn canceled(&self) -> TokioTask<()> {
        TokioTask::new(move |cx| {
            Box::pin(async move {
                cx.request_self_cancel();
                if cx.cancelable() {
                    Outcome::Canceled
                } else {
                    // Masked: termination happens at the next unmasked boundary
                    Outcome::Completed(())
                }
            })
        })
    }

    fn force_r<A, B>(&self, first: TokioTask<A>, second: TokioTask<B>) -> TokioTask<B>
    where
        A: Send + 'static,
        B: Send + 'static,
    {
        TokioTask::new(move |cx| {
            Box::pin(async move {
                if cx.should_cancel() {
                    return Outcome::Canceled;
                }
                match first.run(cx.clone()).await {
                    Outcome::Canceled => Outcome::Canceled,
                    _ => second.run(cx).await,
                }
            })
        })
    }

    fn on_cancel<A>(&self, task: TokioTask<A>, finalizer: TokioTask<()>) -> TokioTask<A>
    where
        A: Send + 'static,
    {
        TokioTask::new(move |cx| {
            Box::pin(async move {
                match task.run(cx.clone()).await {
                    Outcome::Canceled => {
                        // Finalizers run masked
                        if let Outcome::Errored(e) = finalizer.run(cx.masked()).await {
                            log::warn!("cancellation finalizer failed: {}", e);
                        }
                        Outcome::Canceled
                    }
                    other => other,
                }
            })
        })
    }

    fn uncancelable<A, Body>(&self, body: Body) -> TokioTask<A>
    where
        A: Send + 'static,
        Body: FnOnce(TokioMask) -> TokioTask<A> + Send + 'static,
    {
        TokioTask::new(move |cx| {
            let mask = TokioMask {
                restore: cx.mask_depth(),
            };
            body(mask).run(cx.masked())
        })
    }

    fn start<A>(&self, task: TokioTask<A>) -> TokioTask<TokioFiber<A>>
    where
        A: Send + 'static,
    {
        TokioTask::new(move |cx| {
            let child = cx.child();
            let signal = child.signal();
            Box::pin(async move {
                let join = tokio::spawn(task.run(child));
                Outcome::Completed(TokioFiber::new(join, signal))
            })
        })
    }

    fn join<A>(&self, handle: TokioFiber<A>) -> TokioTask<Outcome<A>>
    where
        A: Send + 'static,
    {
        TokioTask::new(move |_cx| {
            Box::pin(async move { Outcome::Completed(handle.await_outcome().await) })
        })
    }

    fn cancel<A>(&self, handle: TokioFiber<A>) -> TokioTask<()>
    where
        A: Send + 'static,
    {
        TokioTask::new(move |_cx| {
            Box::pin(async move {
                log::debug!("fiber cancellation requested");
                handle.request_cancel();
                let _ = handle.await_outcome().await;
                Outcome::Completed(())
            })
        })
    }

    fn race_pair<A, B>(
        &self,
        left: TokioTask<A>,
        right: TokioTask<B>,
    ) -> TokioTask<RaceWinner<Self, A, B>>
    where
        A: Send + 'static,
        B: Send + 'static,
    {
        TokioTask::new(move |cx| {
            let left_cx = cx.child();
            let right_cx = cx.child();
            let left_signal = left_cx.signal();
            let right_signal = right_cx.signal();
            Box::pin(async move {
                let mut left_join = tokio::spawn(left.run(left_cx));
                let mut right_join = tokio::spawn(right.run(right_cx));
                tokio::select! {
                    l = &mut left_join => {
                        let outcome = settle(l);
                        let loser = TokioFiber::new(right_join, right_signal);
                        Outcome::Completed(RaceWinner::Left(outcome, loser))
                    }
                    r = &mut right_join => {
                        let outcome = settle(r);
                        let loser = TokioFiber::new(left_join, left_signal);
                        Outcome::Completed(RaceWinner::Right(loser, outcome))
                    }
                }
            })
        })
    }

    fn sleep(&self, duration: Duration) -> TokioTask<()> {
        TokioTask::new(move |cx| {
            Box::pin(async move {
                let wait = match duration.to_std() {
                    Ok(wait) => wait,
                    Err(_) => {
                        return Outcome::Errored(ExecError::NegativeDuration(
                            duration.num_nanoseconds().unwrap_or(i64::MIN),
                        ));
                    }
                };
                if cx.cancelable() {
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => Outcome::Completed(()),
                        _ = cx.cancellation() => Outcome::Canceled,
                    }
                } else {
                    tokio::time::sleep(wait).await;
                    Outcome::Completed(())
                }
            })
        })
    }

    fn monotonic(&self) -> TokioTask<Duration> {
        let epoch = self.epoch;
        TokioTask::new(move |_cx| {
            Box::pin(async move {
                let elapsed = Duration::from_std(epoch.elapsed())
                    .unwrap_or_else(|_| Duration::nanoseconds(i64::MAX));
                Outcome::Completed(elapsed)
            })
        })
    }

    fn real_time(&self) -> TokioTask<Duration> {
        TokioTask::new(move |_cx| {
            Box::pin(async move {
                let now = chrono::Utc::now().signed_duration_since(chrono::DateTime::UNIX_EPOCH);
                Outcome::Completed(now)
            })
        })
    }
}
