//! Mock Conversation Client for testing.
//!
//! Provides a configurable in-memory implementation of the ConversationClient
//! port, allowing tests to run without calling the real assistant service.
//!
//! # Features
//!
//! - Scripted run status sequences
//! - Canned thread messages
//! - Error injection per operation
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let client = MockConversationClient::new()
//!     .with_run_statuses([RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed])
//!     .with_message(ThreadMessage::assistant("The answer is 4."));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::assistant::{
    AssistantId, MessageRole, Run, RunId, RunStatus, ThreadId, ThreadMessage,
};
use crate::ports::{ConversationClient, UpstreamError};

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    CreateThread,
    AppendMessage,
    StartRun,
    GetRun,
    CancelRun,
    ListMessages,
}

/// A recorded call to the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    CreateThread,
    AppendMessage {
        thread_id: ThreadId,
        role: MessageRole,
        content: String,
    },
    StartRun {
        thread_id: ThreadId,
        assistant_id: AssistantId,
    },
    GetRun {
        thread_id: ThreadId,
        run_id: RunId,
    },
    CancelRun {
        thread_id: ThreadId,
        run_id: RunId,
    },
    ListMessages {
        thread_id: ThreadId,
    },
}

#[derive(Debug, Default)]
struct MockState {
    /// Statuses reported by `start_run` and then each `get_run`, in order.
    /// The last one repeats once the queue is drained.
    statuses: VecDeque<RunStatus>,
    last_status: Option<RunStatus>,
    last_error: Option<String>,
    messages: Vec<ThreadMessage>,
    failures: Vec<(MockOperation, UpstreamError)>,
    calls: Vec<MockCall>,
    runs_started: u32,
}

/// Mock conversation client for testing.
#[derive(Debug, Clone, Default)]
pub struct MockConversationClient {
    state: Arc<Mutex<MockState>>,
}

impl MockConversationClient {
    /// Creates a mock whose runs complete immediately with no messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the statuses reported for each run, starting with `start_run`.
    pub fn with_run_statuses(self, statuses: impl IntoIterator<Item = RunStatus>) -> Self {
        self.state.lock().unwrap().statuses = statuses.into_iter().collect();
        self
    }

    /// Sets the failure description attached to reported runs.
    pub fn with_run_error(self, message: impl Into<String>) -> Self {
        self.state.lock().unwrap().last_error = Some(message.into());
        self
    }

    /// Adds a message to the listing (listing order is insertion order).
    pub fn with_message(self, message: ThreadMessage) -> Self {
        self.state.lock().unwrap().messages.push(message);
        self
    }

    /// Makes every call to `operation` fail with `error`.
    pub fn with_failure(self, operation: MockOperation, error: UpstreamError) -> Self {
        self.state.lock().unwrap().failures.push((operation, error));
        self
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Returns the number of `get_run` polls made.
    pub fn poll_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockCall::GetRun { .. }))
            .count()
    }

    /// Returns the assistants runs were started with.
    pub fn started_assistants(&self) -> Vec<AssistantId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::StartRun { assistant_id, .. } => Some(assistant_id),
                _ => None,
            })
            .collect()
    }

    /// Returns the messages appended, in order.
    pub fn appended_messages(&self) -> Vec<(ThreadId, MessageRole, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::AppendMessage {
                    thread_id,
                    role,
                    content,
                } => Some((thread_id, role, content)),
                _ => None,
            })
            .collect()
    }

    /// Returns true if any run was cancelled.
    pub fn was_cancelled(&self) -> bool {
        self.calls()
            .iter()
            .any(|c| matches!(c, MockCall::CancelRun { .. }))
    }

    /// Records the call and returns the injected failure, if any.
    fn record(&self, operation: MockOperation, call: MockCall) -> Result<(), UpstreamError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failures.iter().find(|(op, _)| *op == operation) {
            Some((_, error)) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Produces the next scripted run snapshot.
    fn next_run(&self, run_id: RunId) -> Run {
        let mut state = self.state.lock().unwrap();
        let status = state
            .statuses
            .pop_front()
            .or(state.last_status)
            .unwrap_or(RunStatus::Completed);
        state.last_status = Some(status);

        let run = Run::new(run_id, status);
        match state.last_error.clone() {
            Some(message) => run.with_last_error(message),
            None => run,
        }
    }
}

#[async_trait]
impl ConversationClient for MockConversationClient {
    async fn create_thread(&self) -> Result<ThreadId, UpstreamError> {
        self.record(MockOperation::CreateThread, MockCall::CreateThread)?;

        Ok(ThreadId::new(format!(
            "thread_{}",
            uuid::Uuid::new_v4().simple()
        )))
    }

    async fn append_message(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        content: &str,
    ) -> Result<(), UpstreamError> {
        self.record(
            MockOperation::AppendMessage,
            MockCall::AppendMessage {
                thread_id: thread_id.clone(),
                role,
                content: content.to_string(),
            },
        )
    }

    async fn start_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Run, UpstreamError> {
        self.record(
            MockOperation::StartRun,
            MockCall::StartRun {
                thread_id: thread_id.clone(),
                assistant_id: assistant_id.clone(),
            },
        )?;

        let run_id = {
            let mut state = self.state.lock().unwrap();
            state.runs_started += 1;
            RunId::new(format!("run_{}", state.runs_started))
        };
        Ok(self.next_run(run_id))
    }

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, UpstreamError> {
        self.record(
            MockOperation::GetRun,
            MockCall::GetRun {
                thread_id: thread_id.clone(),
                run_id: run_id.clone(),
            },
        )?;

        Ok(self.next_run(run_id.clone()))
    }

    async fn cancel_run(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<Run, UpstreamError> {
        self.record(
            MockOperation::CancelRun,
            MockCall::CancelRun {
                thread_id: thread_id.clone(),
                run_id: run_id.clone(),
            },
        )?;

        Ok(Run::new(run_id.clone(), RunStatus::Cancelling))
    }

    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<ThreadMessage>, UpstreamError> {
        self.record(
            MockOperation::ListMessages,
            MockCall::ListMessages {
                thread_id: thread_id.clone(),
            },
        )?;

        Ok(self.state.lock().unwrap().messages.clone())
    }
}
