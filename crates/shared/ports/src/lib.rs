//! Tempo Ports
//!
//! Port definitions (traits) for the tempo virtual-time execution layer.
//! These define the boundary between the virtual-time layer and the
//! underlying executor that does the real scheduling.
//!
//! The central port is [`Executor`]: the full concurrent-effect capability
//! surface (sequencing, error channel, cancellation, fibers, racing, time).
//! The virtual-time layer in `tempo-virtual` is a second implementation of
//! this same trait, generic over any first one, so layers can be stacked.

mod executor;
mod mask;
mod race;

pub use executor::{Executor, Step};
pub use mask::MaskHandle;
pub use race::RaceWinner;
