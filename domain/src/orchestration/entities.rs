//! Orchestration domain entities
//!
//! A run moves through [`RunPhase`]s; each model inside it moves through
//! [`TaskState`]s. Both expose `can_transition_to` so the orchestrator can
//! refuse illegal moves instead of silently overwriting state.

use serde::{Deserialize, Serialize};

/// Phase of a fan-out run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Start,
    Dispatching,
    Aggregating,
    Synthesizing,
    Done,
    PartialFailure,
    TotalFailure,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Start => "start",
            RunPhase::Dispatching => "dispatching",
            RunPhase::Aggregating => "aggregating",
            RunPhase::Synthesizing => "synthesizing",
            RunPhase::Done => "done",
            RunPhase::PartialFailure => "partial_failure",
            RunPhase::TotalFailure => "total_failure",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunPhase::Done | RunPhase::PartialFailure | RunPhase::TotalFailure
        )
    }

    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Start, Dispatching)
                | (Dispatching, Aggregating)
                | (Aggregating, Synthesizing)
                | (Aggregating, Done)
                | (Aggregating, PartialFailure)
                | (Aggregating, TotalFailure)
                | (Synthesizing, Done)
                | (Synthesizing, PartialFailure)
        )
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of one model's task within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }

    pub fn can_transition_to(&self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Failed) | (Running, Completed) | (Running, Failed)
        )
    }

    /// Move to `next`; returns false (and keeps the current state) if the
    /// move is not allowed.
    pub fn advance(&mut self, next: TaskState) -> bool {
        if !self.can_transition_to(next) {
            return false;
        }
        *self = next;
        true
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the phase of a single run and rejects illegal transitions
#[derive(Debug, Clone)]
pub struct RunTracker {
    phase: RunPhase,
    history: Vec<RunPhase>,
}

impl Default for RunTracker {
    fn default() -> Self {
        Self {
            phase: RunPhase::Start,
            history: vec![RunPhase::Start],
        }
    }
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn history(&self) -> &[RunPhase] {
        &self.history
    }

    /// Advance to `next`; returns false (and keeps the current phase) if
    /// the move is not allowed.
    pub fn advance(&mut self, next: RunPhase) -> bool {
        if !self.phase.can_transition_to(next) {
            return false;
        }
        self.phase = next;
        self.history.push(next);
        true
    }
}
