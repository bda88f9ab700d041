//! Core domain concepts shared across all subdomains.
//!
//! - [`instructions::Instructions`] — the task text fanned out to every model
//! - [`error::ModelError`] — a per-model failure reduced to one sentinel kind
//! - [`string::sanitize_filename`] — model name to output file token

pub mod error;
pub mod instructions;
pub mod string;
