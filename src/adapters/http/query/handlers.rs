//! HTTP handlers for the query endpoint

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};

use crate::adapters::http::error::ApiError;
use crate::application::handlers::AnswerQuestionHandler;
use crate::ports::ConversationClient;

use super::dto::{QueryRequest, QueryResponse};

/// Shared application state
#[derive(Clone)]
pub struct QueryAppState {
    pub handler: Arc<AnswerQuestionHandler<dyn ConversationClient>>,
}

impl QueryAppState {
    pub fn new(handler: AnswerQuestionHandler<dyn ConversationClient>) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

/// Answer a question
///
/// POST /query
///
/// Assistant failures still produce 200 with a fallback text; only a body
/// the extractor rejects becomes an error response.
pub async fn query(
    State(app_state): State<QueryAppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(req) = payload?;

    let answer = app_state.handler.handle(req.into_command()).await;

    Ok(Json(answer.into()))
}
