//! Provider-side error classification
//!
//! Adapters classify every failure exactly once into an [`ErrorCategory`];
//! the core matches on that tag instead of inspecting message strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed classification of provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    #[default]
    Unknown,
    Auth,
    RateLimit,
    InvalidRequest,
    NotFound,
    Server,
    Network,
    Cancelled,
    InputLimit,
    ContentFiltered,
    InsufficientCredits,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Unknown => "unknown",
            ErrorCategory::Auth => "auth",
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::InvalidRequest => "invalid_request",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Server => "server",
            ErrorCategory::Network => "network",
            ErrorCategory::Cancelled => "cancelled",
            ErrorCategory::InputLimit => "input_limit",
            ErrorCategory::ContentFiltered => "content_filtered",
            ErrorCategory::InsufficientCredits => "insufficient_credits",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Problems detected while interpreting an otherwise successful response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseIssue {
    Empty,
    SafetyBlocked,
}

/// Error produced at the provider-adapter boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{category}] {message}")]
pub struct ProviderError {
    pub category: ErrorCategory,
    pub message: String,
    /// Raw provider detail (response body, status line, ...)
    pub details: Option<String>,
    pub issue: Option<ResponseIssue>,
}

impl ProviderError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            details: None,
            issue: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn empty_response(message: impl Into<String>) -> Self {
        Self {
            issue: Some(ResponseIssue::Empty),
            ..Self::new(ErrorCategory::InvalidRequest, message)
        }
    }

    pub fn safety_blocked(message: impl Into<String>) -> Self {
        Self {
            issue: Some(ResponseIssue::SafetyBlocked),
            ..Self::new(ErrorCategory::ContentFiltered, message)
        }
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorCategory::Cancelled, "request cancelled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::new(ErrorCategory::RateLimit, "too many requests");
        assert_eq!(err.to_string(), "[rate_limit] too many requests");
    }

    #[test]
    fn test_response_issue_constructors() {
        let empty = ProviderError::empty_response("no content");
        assert_eq!(empty.issue, Some(ResponseIssue::Empty));

        let blocked = ProviderError::safety_blocked("blocked");
        assert_eq!(blocked.issue, Some(ResponseIssue::SafetyBlocked));
        assert_eq!(blocked.category, ErrorCategory::ContentFiltered);
    }
}
