//! Integration tests for the query HTTP endpoint.
//!
//! These tests drive the full router (middleware included) against the
//! in-memory conversation client:
//! 1. Questions are answered and threads are created or reused
//! 2. Embedded JSON is split from the reply text
//! 3. Assistant failures degrade to fallback texts with status 200
//! 4. Malformed requests are rejected with a `detail` body

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use assistant_gateway::adapters::ai::{MockCall, MockConversationClient, MockOperation};
use assistant_gateway::adapters::http::{app, QueryAppState};
use assistant_gateway::application::handlers::{
    AnswerQuestionHandler, FallbackReplies, PollPolicy,
};
use assistant_gateway::config::ServerConfig;
use assistant_gateway::domain::assistant::{
    AssistantId, AssistantIdentities, MessageRole, RunStatus, ThreadId, ThreadMessage,
};
use assistant_gateway::ports::{ConversationClient, UpstreamError};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn identities() -> AssistantIdentities {
    AssistantIdentities::new(AssistantId::new("asst_primary"), AssistantId::new("asst_reg"))
}

fn test_app(mock: &MockConversationClient) -> Router {
    let client: Arc<dyn ConversationClient> = Arc::new(mock.clone());
    let handler = AnswerQuestionHandler::new(client, identities()).with_poll_policy(PollPolicy {
        interval: Duration::from_millis(1),
        timeout: Duration::from_secs(5),
        max_attempts: 20,
    });

    app(QueryAppState::new(handler), &ServerConfig::default())
}

async fn post_query(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/query")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// Answering Questions
// =============================================================================

#[tokio::test]
async fn answers_question_on_new_thread() {
    let mock = MockConversationClient::new()
        .with_run_statuses([RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed])
        .with_message(ThreadMessage::assistant("2+2 equals 4."));

    let (status, body) = post_query(test_app(&mock), json!({"question": "What is 2+2?"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "2+2 equals 4.");
    assert!(body.get("json").is_none());

    let thread_id = body["thread_id"].as_str().unwrap();
    assert!(thread_id.starts_with("thread_"));

    let appended = mock.appended_messages();
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0].0.as_str(), thread_id);
    assert_eq!(appended[0].1, MessageRole::User);
    assert_eq!(appended[0].2, "What is 2+2?");
}

#[tokio::test]
async fn reuses_supplied_thread_and_extracts_json() {
    let mock = MockConversationClient::new().with_message(ThreadMessage::assistant(
        "Here you go:\n```json\n{\"name\": \"Ada\", \"age\": 36}\n```",
    ));

    let (status, body) = post_query(
        test_app(&mock),
        json!({"question": "Register me", "thread_id": "abc123"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Here you go:");
    assert_eq!(body["thread_id"], "abc123");
    assert_eq!(body["json"], json!({"name": "Ada", "age": 36}));

    assert_eq!(
        mock.appended_messages()[0].0,
        ThreadId::new("abc123"),
        "no new thread should be created"
    );
}

#[tokio::test]
async fn whitespace_thread_id_is_reused_verbatim() {
    let mock = MockConversationClient::new().with_message(ThreadMessage::assistant("ok"));

    let (status, body) = post_query(
        test_app(&mock),
        json!({"question": "Q", "thread_id": "  "}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["thread_id"], "  ");
    assert!(!mock.calls().contains(&MockCall::CreateThread));
}

#[tokio::test]
async fn empty_thread_id_starts_new_thread() {
    let mock = MockConversationClient::new().with_message(ThreadMessage::assistant("ok"));

    let (_, body) = post_query(test_app(&mock), json!({"question": "Q", "thread_id": ""})).await;

    assert!(body["thread_id"].as_str().unwrap().starts_with("thread_"));
    assert!(mock.calls().contains(&MockCall::CreateThread));
}

#[tokio::test]
async fn registration_assistant_is_selected_by_type() {
    let mock = MockConversationClient::new().with_message(ThreadMessage::assistant("ok"));

    post_query(
        test_app(&mock),
        json!({"question": "Sign me up", "assistant_type": "registration"}),
    )
    .await;

    assert_eq!(mock.started_assistants(), vec![AssistantId::new("asst_reg")]);
}

#[tokio::test]
async fn unknown_assistant_type_uses_primary() {
    let mock = MockConversationClient::new().with_message(ThreadMessage::assistant("ok"));

    post_query(
        test_app(&mock),
        json!({"question": "Hi", "assistant_type": "sales"}),
    )
    .await;

    assert_eq!(
        mock.started_assistants(),
        vec![AssistantId::new("asst_primary")]
    );
}

// =============================================================================
// Fallback Replies
// =============================================================================

#[tokio::test]
async fn failed_run_returns_no_reply_fallback() {
    let mock = MockConversationClient::new()
        .with_run_statuses([RunStatus::InProgress, RunStatus::Failed])
        .with_run_error("server_error: boom");

    let (status, body) = post_query(
        test_app(&mock),
        json!({"question": "Q", "thread_id": "t-1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], FallbackReplies::default().no_reply);
    assert_eq!(body["thread_id"], "t-1");
    assert!(body.get("json").is_none());
}

#[tokio::test]
async fn upstream_failure_returns_error_fallback() {
    let mock = MockConversationClient::new().with_failure(
        MockOperation::CreateThread,
        UpstreamError::unavailable("service down"),
    );

    let (status, body) = post_query(test_app(&mock), json!({"question": "Q"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], FallbackReplies::default().error);
    assert_eq!(body["thread_id"], Value::Null);
}

#[tokio::test]
async fn malformed_json_block_keeps_preamble() {
    let mock = MockConversationClient::new()
        .with_message(ThreadMessage::assistant("Summary\n```json\n{not json}\n```"));

    let (status, body) = post_query(test_app(&mock), json!({"question": "Q"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Summary");
    assert!(body.get("json").is_none());
}

// =============================================================================
// Request Validation
// =============================================================================

#[tokio::test]
async fn missing_question_is_unprocessable() {
    let mock = MockConversationClient::new();

    let (status, body) = post_query(test_app(&mock), json!({"thread_id": "abc"})).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().is_some());
    assert!(mock.calls().is_empty());
}

// =============================================================================
// Middleware and Health
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let mock = MockConversationClient::new();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = test_app(&mock).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn responses_carry_request_id() {
    let mock = MockConversationClient::new();
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();

    let response = test_app(&mock).oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn request_id_is_generated_when_absent() {
    let mock = MockConversationClient::new();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = test_app(&mock).oneshot(request).await.unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
