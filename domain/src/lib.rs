//! Domain layer for council
//!
//! This crate contains the core business types: the model catalog, the
//! provider boundary taxonomy, and the values produced by a fan-out run.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! - **Catalog**: providers and the model aliases they host, validated as a unit
//! - **Run**: one set of instructions fanned out to several models at once
//! - **Synthesis**: the optional step merging every successful output into one

pub mod catalog;
pub mod core;
pub mod orchestration;
pub mod prompt;
pub mod provider;

// Re-export commonly used types
pub use catalog::{
    entities::{
        ModelDefinition, ModelInfo, ModelsConfig, ParameterDefinition, ParameterKind,
        ProviderDefinition,
    },
    validation::ConfigValidationError,
};
pub use core::{
    error::{FailureKind, ModelError},
    instructions::Instructions,
    string::{sanitize_filename, truncate},
};
pub use orchestration::{
    correlation::CorrelationId,
    entities::{RunPhase, RunTracker, TaskState},
    value_objects::{ProcessingResult, RunResult, RunStatus, RunSummary, SynthesisOutcome},
};
pub use prompt::PromptTemplate;
pub use provider::{
    error::{ErrorCategory, ProviderError, ResponseIssue},
    response::{GenerationResult, ModelParameters, SafetyRating},
};
