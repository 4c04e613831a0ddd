use std::fmt;

use crate::error::AssistantError;

/// Lifecycle status of a hosted assistant run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Incomplete,
    Other(String),
}

impl RunStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "requires_action" => RunStatus::RequiresAction,
            "cancelling" => RunStatus::Cancelling,
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            "cancelled" => RunStatus::Cancelled,
            "expired" => RunStatus::Expired,
            "incomplete" => RunStatus::Incomplete,
            other => RunStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Other(s) => s,
        }
    }

    /// Terminal states other than `Completed`. The assistant is configured
    /// without tools, so `requires_action` can never be satisfied.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired | RunStatus::Incomplete | RunStatus::RequiresAction
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slice of a hosted thread-based assistant API the orchestrator uses.
pub trait AssistantApi: Send + Sync {
    /// Returns the new thread id.
    fn create_thread(&self) -> Result<String, AssistantError>;
    fn add_user_message(&self, thread_id: &str, content: &str) -> Result<(), AssistantError>;
    /// Returns the new run id.
    fn create_run(&self, thread_id: &str) -> Result<String, AssistantError>;
    fn run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, AssistantError>;
    /// Text of the newest message in the thread, if it has any text part.
    fn latest_reply(&self, thread_id: &str) -> Result<Option<String>, AssistantError>;
}
