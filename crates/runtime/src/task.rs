use std::future::Future;

use tempo_core::{BoxFuture, Outcome};

use crate::context::FiberCx;

/// A not-yet-running computation on the tokio executor
///
/// A task is a one-shot function from a fiber context to a boxed future of
/// the fiber's [`Outcome`]. Construction is effect-free; nothing happens
/// until the executor applies the task to a context and awaits the result.
pub struct TokioTask<A: Send + 'static> {
    run: Box<dyn FnOnce(FiberCx) -> BoxFuture<Outcome<A>> + Send + 'static>,
}

impl<A: Send + 'static> TokioTask<A> {
    pub(crate) fn new(
        run: impl FnOnce(FiberCx) -> BoxFuture<Outcome<A>> + Send + 'static,
    ) -> Self {
        Self { run: Box::new(run) }
    }

    /// Embed an arbitrary future as a task
    ///
    /// The future itself does not observe cancellation; the surrounding
    /// sequencing boundaries do.
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = A> + Send + 'static,
    {
        Self::new(move |_cx| Box::pin(async move { Outcome::Completed(fut.await) }))
    }

    /// Apply the task to a fiber context, producing the running future
    pub(crate) fn run(self, cx: FiberCx) -> BoxFuture<Outcome<A>> {
        (self.run)(cx)
    }
}
