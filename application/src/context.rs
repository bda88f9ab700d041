//! Per-run context shared by every concurrent task.

use council_domain::CorrelationId;
use tokio_util::sync::CancellationToken;

/// Correlation id plus the cancellation token governing one run.
///
/// Cheap to clone; every model task gets its own copy. Both fields are
/// immutable for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct RunContext {
    correlation_id: CorrelationId,
    cancellation: CancellationToken,
}

impl RunContext {
    /// New context with a freshly generated correlation id
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            correlation_id: CorrelationId::generate(),
            cancellation,
        }
    }

    /// Context adopting a caller-supplied correlation id
    pub fn with_correlation_id(id: CorrelationId, cancellation: CancellationToken) -> Self {
        Self {
            correlation_id: id,
            cancellation,
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}
