//! Application-level configuration.
//!
//! - [`RunParams`]: what one run fans out to and where its files go

pub mod run_params;

pub use run_params::RunParams;
