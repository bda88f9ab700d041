//! Port for the structured audit trail.
//!
//! Every pipeline step records an `InProgress` entry before it starts and a
//! `Success` or `Failure` entry when it ends. Entries carry the run's
//! correlation id so a whole run can be reconstructed from the log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures a machine-readable
//! record of what each model was asked and what came back.

use crate::context::RunContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Stage of an audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    InProgress,
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::InProgress => "InProgress",
            AuditStatus::Success => "Success",
            AuditStatus::Failure => "Failure",
        }
    }
}

/// One audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub correlation_id: String,
    pub operation: String,
    pub status: AuditStatus,
    pub inputs: Value,
    pub outputs: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit log write failed: {0}")]
    Write(String),

    #[error("Audit entry serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Sink for audit records.
///
/// Must tolerate concurrent calls from every model task; each call is one
/// independent, atomic append.
pub trait AuditLogger: Send + Sync {
    fn log(&self, entry: AuditEntry) -> Result<(), AuditError>;

    /// Convenience wrapper stamping the entry with the run's correlation id
    fn log_op(
        &self,
        ctx: &RunContext,
        operation: &str,
        status: AuditStatus,
        inputs: Value,
        outputs: Value,
        error: Option<&str>,
    ) -> Result<(), AuditError> {
        self.log(AuditEntry {
            correlation_id: ctx.correlation_id().to_string(),
            operation: operation.to_string(),
            status,
            inputs,
            outputs,
            error: error.map(str::to_string),
        })
    }
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAuditLogger;

impl AuditLogger for NoAuditLogger {
    fn log(&self, _entry: AuditEntry) -> Result<(), AuditError> {
        Ok(())
    }
}
