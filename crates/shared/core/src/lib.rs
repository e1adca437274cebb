//! Tempo Core
//!
//! Shared kernel types for the tempo virtual-time execution layer:
//! fiber outcomes, the executor error channel, and the boxed-future alias
//! used by executor implementations.

mod error;
mod outcome;

pub use error::{ExecError, Result};
pub use outcome::Outcome;

use std::future::Future;
use std::pin::Pin;

/// Owned, sendable boxed future used by executor task representations.
pub type BoxFuture<A> = Pin<Box<dyn Future<Output = A> + Send + 'static>>;
