//! Run lifecycle as reported by the assistant service.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::RunId;

/// Status of a run.
///
/// ```text
/// queued | in_progress | cancelling   (active, polled)
///     └──> completed                  (reply available)
///     └──> anything else              (no reply)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    /// Status string this build does not know about.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Returns true while the service is still working on the run.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling
        )
    }

    /// Returns true if the run finished and produced a reply.
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub id: RunId,
    pub status: RunStatus,
    /// Failure description supplied by the service, if any.
    pub last_error: Option<String>,
}

impl Run {
    /// Creates a run snapshot without error details.
    pub fn new(id: RunId, status: RunStatus) -> Self {
        Self {
            id,
            status,
            last_error: None,
        }
    }

    /// Attaches the service's failure description.
    pub fn with_last_error(mut self, message: impl Into<String>) -> Self {
        self.last_error = Some(message.into());
        self
    }
}
