//! Crate-level scenario tests.
//!
//! - `helpers.rs`: in-memory world, tables and a dispatch harness
//! - `dispatch.rs`: filtering, ordering, cancellation and failure containment
//! - `effects.rs`: the built-in effects end to end

mod dispatch;
mod helpers;

pub use helpers::*;
