//! Correlation identifier threading every log line and audit record of a run.

use serde::{Deserialize, Serialize};

/// Opaque, immutable run identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Adopt a caller-supplied identifier; blank input generates a new one
    pub fn adopt(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.trim().is_empty() {
            Self::generate()
        } else {
            Self(id)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(CorrelationId::generate(), CorrelationId::generate());
    }

    #[test]
    fn test_adopt_keeps_caller_id() {
        assert_eq!(CorrelationId::adopt("run-42").as_str(), "run-42");
        assert!(!CorrelationId::adopt("  ").as_str().trim().is_empty());
    }
}
