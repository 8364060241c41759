//! Core run types for the orchestration loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::types::ToolResult;

/// Unique run identifier.
pub type RunId = Uuid;

/// Observable state of the conversation loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LoopState {
    AwaitingProvider,
    Dispatching,
    AwaitingUserAction,
    Completed,
    Aborted,
    Errored,
}

impl LoopState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Errored)
    }
}

/// Run lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Aborted,
    Errored,
}

/// Result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub fn completed() -> Self {
        Self {
            status: RunStatus::Completed,
            error: None,
            finished_at: Utc::now(),
        }
    }

    pub fn aborted(reason: Option<String>) -> Self {
        Self {
            status: RunStatus::Aborted,
            error: reason,
            finished_at: Utc::now(),
        }
    }

    pub fn errored(error: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Errored,
            error: Some(error.into()),
            finished_at: Utc::now(),
        }
    }
}

/// Outcome of dispatching one batch of tool calls.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// One result per call, in the provider's order.
    Results(Vec<ToolResult>),
    /// A terminal UI was shown; the session ends without another round trip.
    Completed,
}
