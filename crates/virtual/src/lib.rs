//! Tempo Virtual
//!
//! Virtual-time execution over any [`tempo_ports::Executor`]: run
//! fork/join, racing, cancellation, and sleep/timeout logic while elapsed
//! logical time is tracked exactly and no real wall-clock delay occurs.
//!
//! ## How time flows
//!
//! ```text
//! VirtualExecutor<E>
//!     │  sleep(d)      -> advance ambient clock by d, return immediately
//!     │  monotonic     -> read ambient clock
//!     │  start         -> fork ambient clock into the child fiber
//!     │  join          -> max-merge the child's clock into the caller's
//!     │  race_pair     -> fork twice; winner's clock overwrites ambient
//!     ▼
//! E: Executor (real scheduling, cancellation, error channel)
//! ```
//!
//! Every other primitive (`pure`, `raise_error`, `handle_error_with`,
//! `cede`, `canceled`, `never`, `force_r`, `on_cancel`, `uncancelable`)
//! delegates to the base executor with the same ambient clock on every
//! sub-computation.
//!
//! ## Known limitation: races are won in real completion order
//!
//! `race_pair` reports whichever branch the *base* executor sees finish
//! first. A branch that sleeps for a huge virtual duration still wins if its
//! real computation steps complete before the other branch's do; nothing
//! forces the branch with less virtual time to win. This is deliberate and
//! covered by a test; do not rely on virtual-time ordering of race winners.

mod context;
mod executor;
mod fiber;

pub use context::TimedTask;
pub use executor::{TimedMask, VirtualExecutor};
pub use fiber::TimedFiber;
