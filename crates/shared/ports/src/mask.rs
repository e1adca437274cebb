use crate::executor::Executor;

/// Poll handle for an uncancelable region
///
/// `unmask` restores, for the wrapped task only, the cancelability that was
/// in effect when the region was entered. Wrapping a task that was already
/// cancelable is a no-op; nesting regions compose (the handle remembers the
/// masking depth at its own region's entry).
pub trait MaskHandle<E: Executor> {
    fn unmask<A>(&self, task: E::Task<A>) -> E::Task<A>
    where
        A: Send + 'static;
}
