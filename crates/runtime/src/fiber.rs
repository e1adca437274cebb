use std::sync::Arc;

use tempo_core::Outcome;
use tokio::task::{JoinError, JoinHandle};

use crate::context::CancelSignal;

/// Handle to a started fiber on the tokio executor
///
/// Pairs the spawned task's join handle with the fiber's cancel signal.
/// Consumed by join or cancel.
pub struct TokioFiber<A: Send + 'static> {
    join: JoinHandle<Outcome<A>>,
    cancel: Arc<CancelSignal>,
}

impl<A: Send + 'static> TokioFiber<A> {
    pub(crate) fn new(join: JoinHandle<Outcome<A>>, cancel: Arc<CancelSignal>) -> Self {
        Self { join, cancel }
    }

    pub(crate) fn request_cancel(&self) {
        self.cancel.request();
    }

    /// Wait for the fiber and settle its result
    pub(crate) async fn await_outcome(self) -> Outcome<A> {
        settle(self.join.await)
    }
}

/// Settle a tokio join result into a fiber outcome
///
/// A panicked fiber resumes the panic on the joiner, mirroring the behavior
/// of awaiting the join handle directly.
pub(crate) fn settle<A: Send + 'static>(result: Result<Outcome<A>, JoinError>) -> Outcome<A> {
    match result {
        Ok(outcome) => outcome,
        Err(err) if err.is_cancelled() => Outcome::Canceled,
        Err(err) => std::panic::resume_unwind(err.into_panic()),
    }
}
