//! Conversation Client Port - Interface to the hosted assistant service.
//!
//! The service keeps all conversation state (threads, messages, runs). This
//! port exposes the handful of primitives the gateway needs and hides the
//! wire protocol behind them, so the orchestration can be tested against an
//! in-memory double.
//!
//! # Example
//!
//! ```ignore
//! let thread_id = client.create_thread().await?;
//! client.append_message(&thread_id, MessageRole::User, "Hi").await?;
//! let run = client.start_run(&thread_id, &assistant_id).await?;
//! let run = client.get_run(&thread_id, &run.id).await?;
//! let messages = client.list_messages(&thread_id).await?;
//! ```

use async_trait::async_trait;

use crate::domain::assistant::{AssistantId, MessageRole, Run, RunId, ThreadId, ThreadMessage};

/// Port for the hosted assistant's thread/run API.
///
/// Every call is a network round trip that may mutate remote state.
#[async_trait]
pub trait ConversationClient: Send + Sync {
    /// Creates an empty thread.
    async fn create_thread(&self) -> Result<ThreadId, UpstreamError>;

    /// Appends a message to a thread.
    async fn append_message(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        content: &str,
    ) -> Result<(), UpstreamError>;

    /// Starts processing the thread with the given assistant.
    ///
    /// Returns immediately; the run continues asynchronously.
    async fn start_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Run, UpstreamError>;

    /// Fetches the current state of a run.
    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, UpstreamError>;

    /// Requests cancellation of a run.
    async fn cancel_run(&self, thread_id: &ThreadId, run_id: &RunId)
        -> Result<Run, UpstreamError>;

    /// Lists a thread's messages, newest first.
    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<ThreadMessage>, UpstreamError>;
}

/// Failures talking to the assistant service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    /// API key rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Unknown thread, run or assistant.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the service.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The service rejected the request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The service is failing or overloaded.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// Transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

impl UpstreamError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
