//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod process_model;
pub mod run_orchestration;
pub(crate) mod shared;
pub mod synthesize;
