//! Raw generation results returned by provider clients

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolved generation parameters (name -> value)
pub type ModelParameters = BTreeMap<String, serde_json::Value>;

/// Safety assessment attached to a generation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyRating {
    pub category: String,
    pub blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<String>,
}

/// Uninterpreted output of a single generate call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety: Vec<SafetyRating>,
    #[serde(default)]
    pub truncated: bool,
}

impl GenerationResult {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            finish_reason: Some("stop".to_string()),
            ..Default::default()
        }
    }

    /// Whether any safety rating blocked the output
    pub fn is_safety_blocked(&self) -> bool {
        self.safety.iter().any(|r| r.blocked)
            || matches!(
                self.finish_reason.as_deref(),
                Some("safety") | Some("content_filter")
            )
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_blocked_by_rating() {
        let result = GenerationResult {
            safety: vec![SafetyRating {
                category: "harassment".to_string(),
                blocked: true,
                probability: Some("high".to_string()),
            }],
            ..Default::default()
        };
        assert!(result.is_safety_blocked());
    }

    #[test]
    fn test_safety_blocked_by_finish_reason() {
        let result = GenerationResult {
            finish_reason: Some("content_filter".to_string()),
            ..Default::default()
        };
        assert!(result.is_safety_blocked());
        assert!(!GenerationResult::text("hi").is_safety_blocked());
    }

    #[test]
    fn test_has_content_ignores_whitespace() {
        assert!(!GenerationResult::text("  \n").has_content());
        assert!(GenerationResult::text("answer").has_content());
    }
}
