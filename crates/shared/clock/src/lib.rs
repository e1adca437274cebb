//! Tempo Clock Infrastructure
//!
//! The logical clock at the heart of virtual-time execution: a counter of
//! elapsed virtual duration, owned by exactly one execution branch at a time.
//!
//! ## Ownership model
//!
//! ```text
//! run() ── LogicalClock (zero)
//!              │
//!              ├── fork() ── child branch clock (independent copy)
//!              │                 │
//!              │                 └── advance() by the child only
//!              │
//!              └── merge on join (max) or race completion (overwrite)
//! ```
//!
//! Cloning a `LogicalClock` shares the underlying counter: a clone is the
//! ambient *handle* passed through every step of one branch. `fork` is the
//! only way to obtain an independent counter.

mod logical;

pub use logical::LogicalClock;
