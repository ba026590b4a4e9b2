//! HTTP DTOs for the query endpoint
//!
//! Field names follow the public wire contract (`thread_id`, `assistant_type`).

use serde::{Deserialize, Serialize};

use crate::application::handlers::{AnswerQuestionCommand, QueryAnswer};
use crate::domain::assistant::{AssistantKind, ThreadId};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to answer a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    /// Thread to continue; omitted, null or empty starts a new one
    #[serde(default)]
    pub thread_id: Option<String>,
    /// `"registration"` selects the registration assistant
    #[serde(default)]
    pub assistant_type: Option<String>,
}

impl QueryRequest {
    pub fn into_command(self) -> AnswerQuestionCommand {
        AnswerQuestionCommand {
            assistant: AssistantKind::from_tag(self.assistant_type.as_deref()),
            thread_id: ThreadId::from_optional(self.thread_id),
            question: self.question,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Answer to a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<serde_json::Value>,
}

impl From<QueryAnswer> for QueryResponse {
    fn from(answer: QueryAnswer) -> Self {
        Self {
            response: answer.response,
            thread_id: answer.thread_id.map(ThreadId::into_inner),
            json: answer.json,
        }
    }
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
