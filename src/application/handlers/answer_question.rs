//! AnswerQuestionHandler - Relay a question to the assistant and shape its reply

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::domain::assistant::{
    latest_assistant_reply, split_reply, AssistantId, AssistantIdentities, AssistantKind,
    AssistantReply, MessageRole, ReplyParseError, Run, RunStatus, ThreadId,
};
use crate::ports::{ConversationClient, UpstreamError};

/// Command to answer one question
#[derive(Debug, Clone)]
pub struct AnswerQuestionCommand {
    pub question: String,
    /// Thread to continue; a new one is created when absent
    pub thread_id: Option<ThreadId>,
    pub assistant: AssistantKind,
}

/// Limits for waiting on a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status checks
    pub interval: Duration,
    /// Total wait before giving up
    pub timeout: Duration,
    /// Maximum number of status checks
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(600),
            max_attempts: 600,
        }
    }
}

/// Texts returned when no assistant answer can be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackReplies {
    /// The run finished (or was abandoned) without a usable reply
    pub no_reply: String,
    /// The assistant service could not be reached or rejected a call
    pub error: String,
}

impl Default for FallbackReplies {
    fn default() -> Self {
        Self {
            no_reply: "Could not obtain a reply from the assistant.".to_string(),
            error: "An error occurred while processing the question.".to_string(),
        }
    }
}

/// Why a question went unanswered
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("assistant service call failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Extraction(#[from] ReplyParseError),

    #[error("run completed without an assistant message")]
    NoReply,

    #[error("run ended with status {status}")]
    RunNotCompleted {
        status: RunStatus,
        last_error: Option<String>,
    },

    #[error("run still {status} after {attempts} status checks over {waited:?}")]
    TimedOut {
        status: RunStatus,
        attempts: u32,
        waited: Duration,
    },
}

/// Result of handling a question, before it is shaped for the caller
#[derive(Debug)]
pub struct AnswerQuestionResult {
    /// Thread used for the exchange; `None` only when creating it failed
    pub thread_id: Option<ThreadId>,
    pub outcome: Result<AssistantReply, AnswerError>,
}

/// Answer delivered to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAnswer {
    pub response: String,
    pub thread_id: Option<ThreadId>,
    pub json: Option<Value>,
}

impl AnswerQuestionResult {
    /// Maps the outcome onto the caller-facing answer.
    ///
    /// Malformed embedded JSON still delivers the prose that preceded it.
    pub fn into_answer(self, fallbacks: &FallbackReplies) -> QueryAnswer {
        let (response, json) = match self.outcome {
            Ok(reply) => (reply.text, reply.json),
            Err(AnswerError::Extraction(err)) => (err.preamble, None),
            Err(AnswerError::NoReply)
            | Err(AnswerError::RunNotCompleted { .. })
            | Err(AnswerError::TimedOut { .. }) => (fallbacks.no_reply.clone(), None),
            Err(AnswerError::Upstream(_)) => (fallbacks.error.clone(), None),
        };

        QueryAnswer {
            response,
            thread_id: self.thread_id,
            json,
        }
    }
}

/// Handler relaying questions to the hosted assistant
pub struct AnswerQuestionHandler<C: ?Sized + ConversationClient> {
    client: Arc<C>,
    assistants: AssistantIdentities,
    policy: PollPolicy,
    fallbacks: FallbackReplies,
}

impl<C: ?Sized + ConversationClient> AnswerQuestionHandler<C> {
    pub fn new(client: Arc<C>, assistants: AssistantIdentities) -> Self {
        Self {
            client,
            assistants,
            policy: PollPolicy::default(),
            fallbacks: FallbackReplies::default(),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_fallbacks(mut self, fallbacks: FallbackReplies) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    /// Answers a question. Never fails: every failure becomes a fallback answer.
    pub async fn handle(&self, cmd: AnswerQuestionCommand) -> QueryAnswer {
        let result = self.execute(cmd).await;

        if let Err(err) = &result.outcome {
            log_failure(result.thread_id.as_ref(), err);
        }

        result.into_answer(&self.fallbacks)
    }

    /// Runs one question/answer exchange and reports the typed outcome.
    pub async fn execute(&self, cmd: AnswerQuestionCommand) -> AnswerQuestionResult {
        // 1. Resolve which assistant runs
        let assistant_id = self.assistants.resolve(cmd.assistant);

        // 2. Continue the caller's thread or open a new one
        let thread_id = match cmd.thread_id {
            Some(thread_id) => {
                tracing::info!(thread_id = %thread_id, "Using existing thread");
                thread_id
            }
            None => match self.client.create_thread().await {
                Ok(thread_id) => {
                    tracing::info!(thread_id = %thread_id, "Created new thread");
                    thread_id
                }
                Err(err) => {
                    return AnswerQuestionResult {
                        thread_id: None,
                        outcome: Err(err.into()),
                    }
                }
            },
        };

        // 3-6. Post the question, run the assistant, read the reply
        let outcome = self.exchange(&thread_id, assistant_id, &cmd.question).await;

        AnswerQuestionResult {
            thread_id: Some(thread_id),
            outcome,
        }
    }

    async fn exchange(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
        question: &str,
    ) -> Result<AssistantReply, AnswerError> {
        self.client
            .append_message(thread_id, MessageRole::User, question)
            .await?;

        let run = self.client.start_run(thread_id, assistant_id).await?;
        tracing::info!(
            thread_id = %thread_id,
            run_id = %run.id,
            assistant_id = %assistant_id,
            status = %run.status,
            "Started run"
        );

        let run = self.wait_for_run(thread_id, run).await?;
        if !run.status.is_completed() {
            return Err(AnswerError::RunNotCompleted {
                status: run.status,
                last_error: run.last_error,
            });
        }

        let messages = self.client.list_messages(thread_id).await?;
        let reply = latest_assistant_reply(&messages).ok_or(AnswerError::NoReply)?;
        tracing::debug!(thread_id = %thread_id, reply = %reply.content, "Assistant replied");

        Ok(split_reply(&reply.content)?)
    }

    /// Polls until the run leaves its active states or the policy runs out.
    async fn wait_for_run(&self, thread_id: &ThreadId, mut run: Run) -> Result<Run, AnswerError> {
        let started = Instant::now();
        let mut attempts = 0;

        while run.status.is_active() {
            if attempts >= self.policy.max_attempts || started.elapsed() >= self.policy.timeout {
                self.abandon_run(thread_id, &run).await;
                return Err(AnswerError::TimedOut {
                    status: run.status,
                    attempts,
                    waited: started.elapsed(),
                });
            }

            sleep(self.policy.interval).await;
            attempts += 1;

            run = self.client.get_run(thread_id, &run.id).await?;
            tracing::debug!(
                thread_id = %thread_id,
                run_id = %run.id,
                status = %run.status,
                attempt = attempts,
                "Polled run"
            );
        }

        Ok(run)
    }

    /// Best-effort cancel so the abandoned run does not keep the thread busy.
    async fn abandon_run(&self, thread_id: &ThreadId, run: &Run) {
        match self.client.cancel_run(thread_id, &run.id).await {
            Ok(cancelled) => tracing::info!(
                thread_id = %thread_id,
                run_id = %run.id,
                status = %cancelled.status,
                "Cancelled abandoned run"
            ),
            Err(err) => tracing::warn!(
                thread_id = %thread_id,
                run_id = %run.id,
                "Failed to cancel abandoned run: {}",
                err
            ),
        }
    }
}

fn log_failure(thread_id: Option<&ThreadId>, err: &AnswerError) {
    let thread_id = thread_id.map(ThreadId::as_str).unwrap_or("<none>");

    match err {
        AnswerError::Upstream(_) => {
            tracing::error!(thread_id, "Failed to answer question: {}", err)
        }
        AnswerError::RunNotCompleted {
            last_error: Some(detail),
            ..
        } => tracing::warn!(thread_id, detail = %detail, "Run not completed: {}", err),
        _ => tracing::warn!(thread_id, "Question left unanswered: {}", err),
    }
}
