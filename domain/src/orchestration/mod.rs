//! Fan-out orchestration domain
//!
//! Run phases, per-model task states, correlation identifiers and the
//! result types produced by a run.

pub mod correlation;
pub mod entities;
pub mod value_objects;
