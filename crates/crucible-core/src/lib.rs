//! # Crucible Core
//!
//! Shared, domain-agnostic plumbing used by every crate in this workspace:
//! a top-level error type that wraps each crate's own error enum, and a
//! tracing bootstrap helper so every binary initializes logging the same
//! way.
//!
//! This crate intentionally knows nothing about queries, targets, or any
//! other domain concept — those live in `crucible-query`.

pub mod error;
pub mod tracing_init;

pub use error::{CrucibleError, Result};
pub use tracing_init::init_tracing;
