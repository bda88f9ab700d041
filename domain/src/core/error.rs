//! Domain error types
//!
//! [`FailureKind`] is the closed set of sentinel categories every model
//! failure is reduced to. [`ModelError`] pairs one sentinel with the model
//! name and the original detail text so nothing is silently discarded.

use crate::provider::error::ErrorCategory;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ModelInitializationFailed,
    ModelProcessingFailed,
    InvalidModelResponse,
    EmptyModelResponse,
    ContentFiltered,
    ModelRateLimited,
    ModelTokenLimitExceeded,
    OutputWriteFailed,
    ConfigurationInvalid,
    ProviderUnregistered,
    ModelUnknown,
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ModelInitializationFailed => "model initialization failed",
            FailureKind::ModelProcessingFailed => "model processing failed",
            FailureKind::InvalidModelResponse => "invalid model response",
            FailureKind::EmptyModelResponse => "empty model response",
            FailureKind::ContentFiltered => "content filtered",
            FailureKind::ModelRateLimited => "model rate limited",
            FailureKind::ModelTokenLimitExceeded => "model token limit exceeded",
            FailureKind::OutputWriteFailed => "output write failed",
            FailureKind::ConfigurationInvalid => "configuration invalid",
            FailureKind::ProviderUnregistered => "provider unregistered",
            FailureKind::ModelUnknown => "model unknown",
            FailureKind::Cancelled => "cancelled",
        }
    }

    /// Short label for status tables
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::ModelInitializationFailed => "INIT",
            FailureKind::ModelProcessingFailed => "FAILED",
            FailureKind::InvalidModelResponse => "INVALID",
            FailureKind::EmptyModelResponse => "EMPTY",
            FailureKind::ContentFiltered => "FILTERED",
            FailureKind::ModelRateLimited => "RATE-LIMITED",
            FailureKind::ModelTokenLimitExceeded => "TOKEN-LIMIT",
            FailureKind::OutputWriteFailed => "WRITE",
            FailureKind::ConfigurationInvalid => "CONFIG",
            FailureKind::ProviderUnregistered => "UNREGISTERED",
            FailureKind::ModelUnknown => "UNKNOWN",
            FailureKind::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A categorized per-model failure
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind} for model {model}: {detail}")]
pub struct ModelError {
    pub kind: FailureKind,
    pub model: String,
    pub detail: String,
    /// Provider-side category, when the failure originated at a provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
}

impl ModelError {
    pub fn new(kind: FailureKind, model: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
            detail: detail.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn cancelled(model: impl Into<String>) -> Self {
        Self::new(FailureKind::Cancelled, model, "operation cancelled")
            .with_category(ErrorCategory::Cancelled)
    }

    /// Append user-facing guidance to the detail text
    pub fn with_guidance(mut self, guidance: &str) -> Self {
        if !guidance.is_empty() {
            self.detail = format!("{}. {}", self.detail, guidance);
        }
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }
}
