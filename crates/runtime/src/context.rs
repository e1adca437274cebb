use std::sync::Arc;
use tokio::sync::watch;

/// One fiber's cancellation signal
///
/// Requesting cancellation is sticky: once set it stays set for the life of
/// the fiber.
pub(crate) struct CancelSignal {
    tx: watch::Sender<bool>,
}

impl CancelSignal {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub(crate) fn request(&self) {
        let _ = self.tx.send_replace(true);
    }

    pub(crate) fn is_requested(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once cancellation has been requested
    pub(crate) async fn cancellation(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender gone: nobody can request cancellation anymore
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Execution context threaded through every task of one fiber
///
/// Cloning shares the cancel signal; the mask depth travels by value so a
/// masked sub-task cannot leak its mask to the surrounding code.
#[derive(Clone)]
pub(crate) struct FiberCx {
    signal: Arc<CancelSignal>,
    mask: usize,
}

impl FiberCx {
    /// Context for a top-level fiber
    pub(crate) fn root() -> Self {
        Self {
            signal: Arc::new(CancelSignal::new()),
            mask: 0,
        }
    }

    /// Context for a newly started child fiber: fresh signal, unmasked
    pub(crate) fn child(&self) -> Self {
        Self::root()
    }

    /// Same fiber, one mask level deeper
    pub(crate) fn masked(&self) -> Self {
        Self {
            signal: Arc::clone(&self.signal),
            mask: self.mask.saturating_add(1),
        }
    }

    /// Same fiber at an explicit mask depth (poll restore)
    pub(crate) fn with_mask(&self, mask: usize) -> Self {
        Self {
            signal: Arc::clone(&self.signal),
            mask,
        }
    }

    pub(crate) fn mask_depth(&self) -> usize {
        self.mask
    }

    pub(crate) fn cancelable(&self) -> bool {
        self.mask == 0
    }

    /// True when the fiber should stop at the next boundary
    pub(crate) fn should_cancel(&self) -> bool {
        self.cancelable() && self.signal.is_requested()
    }

    /// Mark this fiber as canceled by its own request
    pub(crate) fn request_self_cancel(&self) {
        self.signal.request();
    }

    pub(crate) fn signal(&self) -> Arc<CancelSignal> {
        Arc::clone(&self.signal)
    }

    pub(crate) async fn cancellation(&self) {
        self.signal.cancellation().await
    }
}
