//! Tempo Runtime
//!
//! Reference implementation of the [`tempo_ports::Executor`] capability
//! surface on top of tokio. This is the "underlying executor" the
//! virtual-time layer delegates to: it does the real scheduling, the
//! virtual-time layer only threads a logical clock through it.
//!
//! ## Cancellation model
//!
//! Cancellation is cooperative. Every fiber carries a cancel signal
//! (`tokio::sync::watch`) and a mask depth:
//! - the signal is checked at sequencing boundaries (`flat_map`, `cede`) and
//!   awaited inside `sleep` and `never`;
//! - while the mask depth is nonzero the signal is ignored; `uncancelable`
//!   raises the depth for its body and the poll handle restores the depth
//!   captured at region entry;
//! - `cancel` requests the signal and then waits for the fiber to stop.
//!
//! Fibers are never aborted out from under a masked region. A fiber that
//! awaits a lifted foreign future observes cancellation at the next
//! sequencing boundary after that future resolves.

mod context;
mod executor;
mod fiber;
mod task;

pub use executor::{TokioExecutor, TokioMask};
pub use fiber::TokioFiber;
pub use task::TokioTask;
