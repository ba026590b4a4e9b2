//! OpenAI Threads Client - Implementation of ConversationClient for the
//! OpenAI Assistants API (v2).
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIThreadsConfig::new(api_key)
//!     .with_base_url("https://api.openai.com/v1")
//!     .with_timeout(Duration::from_secs(60));
//!
//! let client = OpenAIThreadsClient::new(config)?;
//! ```
//!
//! # Endpoints
//!
//! - `POST /threads`
//! - `POST /threads/{thread_id}/messages`
//! - `GET  /threads/{thread_id}/messages?order=desc`
//! - `POST /threads/{thread_id}/runs`
//! - `GET  /threads/{thread_id}/runs/{run_id}`
//! - `POST /threads/{thread_id}/runs/{run_id}/cancel`

use async_trait::async_trait;
use reqwest::{Client, Request, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::assistant::{
    AssistantId, MessageRole, Run, RunId, RunStatus, ThreadId, ThreadMessage,
};
use crate::ports::{ConversationClient, UpstreamError};

/// Header selecting the Assistants API version.
const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Configuration for the OpenAI threads client.
#[derive(Debug, Clone)]
pub struct OpenAIThreadsConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl OpenAIThreadsConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Assistants API client.
///
/// Holds one pooled `reqwest::Client`; build once and share behind an `Arc`.
pub struct OpenAIThreadsClient {
    config: OpenAIThreadsConfig,
    base_url: Url,
    client: Client,
}

impl OpenAIThreadsClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: OpenAIThreadsConfig) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                UpstreamError::InvalidRequest(format!("Invalid base URL: {}", config.base_url))
            })?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    /// Builds an endpoint URL below the base URL, one path segment per element.
    ///
    /// Each segment is percent-encoded, so caller-supplied ids can never add
    /// path components, a query or a fragment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        if let Some(segment) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(UpstreamError::InvalidRequest(format!(
                "Invalid identifier: '{}'",
                segment
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                UpstreamError::InvalidRequest(format!("Invalid base URL: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Adds authentication and version headers and finalizes the request.
    fn build(&self, builder: RequestBuilder) -> Result<Request, UpstreamError> {
        builder
            .bearer_auth(self.config.api_key())
            .header(BETA_HEADER.0, BETA_HEADER.1)
            .build()
            .map_err(|e| UpstreamError::InvalidRequest(format!("Failed to build request: {}", e)))
    }

    fn create_thread_request(&self) -> Result<Request, UpstreamError> {
        let url = self.endpoint(&["threads"])?;
        self.build(self.client.post(url).json(&EmptyBody {}))
    }

    fn append_message_request(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        content: &str,
    ) -> Result<Request, UpstreamError> {
        let url = self.endpoint(&["threads", thread_id.as_str(), "messages"])?;
        let body = CreateMessageRequest {
            role: role.as_str(),
            content,
        };
        self.build(self.client.post(url).json(&body))
    }

    fn start_run_request(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Request, UpstreamError> {
        let url = self.endpoint(&["threads", thread_id.as_str(), "runs"])?;
        let body = CreateRunRequest {
            assistant_id: assistant_id.as_str(),
        };
        self.build(self.client.post(url).json(&body))
    }

    fn get_run_request(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Request, UpstreamError> {
        let url = self.endpoint(&["threads", thread_id.as_str(), "runs", run_id.as_str()])?;
        self.build(self.client.get(url))
    }

    fn cancel_run_request(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<Request, UpstreamError> {
        let url = self.endpoint(&[
            "threads",
            thread_id.as_str(),
            "runs",
            run_id.as_str(),
            "cancel",
        ])?;
        self.build(self.client.post(url))
    }

    /// Newest first, so the first assistant message is the latest reply.
    fn list_messages_request(&self, thread_id: &ThreadId) -> Result<Request, UpstreamError> {
        let url = self.endpoint(&["threads", thread_id.as_str(), "messages"])?;
        self.build(self.client.get(url).query(&[("order", "desc")]))
    }

    /// Sends a request and decodes a successful JSON body.
    async fn send<T: DeserializeOwned>(&self, request: Request) -> Result<T, UpstreamError> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = Self::handle_response_status(response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::parse(format!("Failed to parse response: {}", e)))
    }

    fn transport_error(&self, e: reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            UpstreamError::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            }
        } else if e.is_connect() {
            UpstreamError::network(format!("Connection failed: {}", e))
        } else {
            UpstreamError::network(e.to_string())
        }
    }

    /// Passes successful responses through and converts the rest to errors.
    async fn handle_response_status(response: Response) -> Result<Response, UpstreamError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(status = %status, "Failed to read error response body: {}", e);
                String::new()
            }
        };
        Err(error_for_status(status.as_u16(), &error_body))
    }
}

/// Maps a non-success status and its body to an upstream error.
fn error_for_status(status: u16, error_body: &str) -> UpstreamError {
    let message = error_message(error_body);

    match status {
        401 | 403 => UpstreamError::AuthenticationFailed,
        404 => UpstreamError::NotFound(message),
        429 => UpstreamError::RateLimited(message),
        400 | 409 | 422 => UpstreamError::InvalidRequest(message),
        500..=599 => UpstreamError::unavailable(format!("Server error {}: {}", status, message)),
        _ => UpstreamError::network(format!("Unexpected status {}: {}", status, message)),
    }
}

/// Pulls `error.message` out of an API error body, or returns the raw body.
fn error_message(error_body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(error_body)
        .map(|body| body.error.message)
        .unwrap_or_else(|_| error_body.to_string())
}

#[async_trait]
impl ConversationClient for OpenAIThreadsClient {
    async fn create_thread(&self) -> Result<ThreadId, UpstreamError> {
        let thread: ThreadObject = self.send(self.create_thread_request()?).await?;

        Ok(ThreadId::new(thread.id))
    }

    async fn append_message(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        content: &str,
    ) -> Result<(), UpstreamError> {
        let request = self.append_message_request(thread_id, role, content)?;

        let _: MessageObject = self.send(request).await?;
        Ok(())
    }

    async fn start_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &AssistantId,
    ) -> Result<Run, UpstreamError> {
        let run: RunObject = self
            .send(self.start_run_request(thread_id, assistant_id)?)
            .await?;
        Ok(run.into())
    }

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, UpstreamError> {
        let run: RunObject = self.send(self.get_run_request(thread_id, run_id)?).await?;
        Ok(run.into())
    }

    async fn cancel_run(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<Run, UpstreamError> {
        let run: RunObject = self.send(self.cancel_run_request(thread_id, run_id)?).await?;
        Ok(run.into())
    }

    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<ThreadMessage>, UpstreamError> {
        let list: MessageList = self.send(self.list_messages_request(thread_id)?).await?;

        Ok(list.data.into_iter().map(ThreadMessage::from).collect())
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct EmptyBody {}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: RunStatus,
    last_error: Option<RunLastError>,
}

#[derive(Debug, Deserialize)]
struct RunLastError {
    code: Option<String>,
    message: String,
}

impl From<RunObject> for Run {
    fn from(run: RunObject) -> Self {
        let converted = Run::new(RunId::new(run.id), run.status);
        match run.last_error {
            Some(RunLastError {
                code: Some(code),
                message,
            }) => converted.with_last_error(format!("{}: {}", code, message)),
            Some(RunLastError { code: None, message }) => converted.with_last_error(message),
            None => converted,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    role: MessageRole,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TextContent {
    value: String,
}

impl From<MessageObject> for ThreadMessage {
    fn from(message: MessageObject) -> Self {
        let text = message
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text.value),
                ContentBlock::Other => None,
            })
            .unwrap_or_default();

        ThreadMessage::new(message.role, text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_works() {
        let config = OpenAIThreadsConfig::new("sk-test")
            .with_base_url("https://proxy.example.com/v1")
            .with_timeout(Duration::from_secs(15));

        assert_eq!(config.base_url, "https://proxy.example.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.api_key(), "sk-test");
    }

    #[test]
    fn config_debug_redacts_api_key() {
        let config = OpenAIThreadsConfig::new("sk-very-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-very-secret"));
    }

    fn client() -> OpenAIThreadsClient {
        OpenAIThreadsClient::new(OpenAIThreadsConfig::new("sk-test")).unwrap()
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = OpenAIThreadsConfig::new("sk-test").with_base_url("http://localhost:9000/v1/");
        let client = OpenAIThreadsClient::new(config).unwrap();

        assert_eq!(
            client.endpoint(&["threads", "t1", "runs"]).unwrap().as_str(),
            "http://localhost:9000/v1/threads/t1/runs"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = OpenAIThreadsConfig::new("sk-test").with_base_url("not a url");
        assert!(matches!(
            OpenAIThreadsClient::new(config),
            Err(UpstreamError::InvalidRequest(_))
        ));
    }

    // ════════════════════════════════════════════════════════════════════════
    // Request construction
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn list_messages_requests_newest_first() {
        let request = client()
            .list_messages_request(&ThreadId::new("thread_1"))
            .unwrap();

        assert_eq!(request.method(), &reqwest::Method::GET);
        assert_eq!(
            request.url().as_str(),
            "https://api.openai.com/v1/threads/thread_1/messages?order=desc"
        );
    }

    #[test]
    fn requests_carry_auth_and_beta_headers() {
        let request = client()
            .start_run_request(&ThreadId::new("thread_1"), &AssistantId::new("asst_1"))
            .unwrap();

        let headers = request.headers();
        assert_eq!(headers["authorization"].to_str().unwrap(), "Bearer sk-test");
        assert_eq!(headers["openai-beta"].to_str().unwrap(), "assistants=v2");
        assert_eq!(request.method(), &reqwest::Method::POST);
        assert_eq!(request.url().path(), "/v1/threads/thread_1/runs");
    }

    #[test]
    fn thread_id_cannot_escape_threads_path() {
        let request = client()
            .append_message_request(
                &ThreadId::new("x/../../files?purpose="),
                MessageRole::User,
                "hi",
            )
            .unwrap();
        let url = request.url();

        assert_eq!(url.host_str(), Some("api.openai.com"));
        assert!(url.path().starts_with("/v1/threads/"));
        assert!(url.path().ends_with("/messages"));
        assert_eq!(
            url.path_segments().unwrap().collect::<Vec<_>>(),
            vec!["v1", "threads", "x%2F..%2F..%2Ffiles%3Fpurpose=", "messages"]
        );
        assert_eq!(url.query(), None);
    }

    #[test]
    fn run_id_cannot_add_query_or_fragment() {
        let request = client()
            .cancel_run_request(&ThreadId::new("t#frag"), &RunId::new("run_1?x=1"))
            .unwrap();
        let url = request.url();

        assert_eq!(url.path_segments().unwrap().count(), 6);
        assert!(url.path().starts_with("/v1/threads/"));
        assert!(url.path().ends_with("/cancel"));
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn dot_segment_ids_are_rejected() {
        let client = client();

        assert!(matches!(
            client.get_run_request(&ThreadId::new(".."), &RunId::new("run_1")),
            Err(UpstreamError::InvalidRequest(_))
        ));
        assert!(matches!(
            client.get_run_request(&ThreadId::new("thread_1"), &RunId::new(".")),
            Err(UpstreamError::InvalidRequest(_))
        ));
    }

    #[test]
    fn whitespace_thread_id_is_encoded_not_trimmed() {
        let request = client()
            .get_run_request(&ThreadId::new("  "), &RunId::new("run_1"))
            .unwrap();

        assert_eq!(request.url().path(), "/v1/threads/%20%20/runs/run_1");
    }

    // ════════════════════════════════════════════════════════════════════════
    // Round trips against a local server
    // ════════════════════════════════════════════════════════════════════════

    async fn serve(router: axum::Router) -> OpenAIThreadsClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = OpenAIThreadsConfig::new("sk-test").with_base_url(format!("http://{}/v1", addr));
        OpenAIThreadsClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn list_messages_sends_order_and_decodes_listing() {
        use axum::extract::RawQuery;
        use axum::http::HeaderMap;

        let router = axum::Router::new().route(
            "/v1/threads/:thread_id/messages",
            axum::routing::get(|RawQuery(query): RawQuery, headers: HeaderMap| async move {
                let beta = headers
                    .get("openai-beta")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                axum::Json(serde_json::json!({
                    "object": "list",
                    "data": [{
                        "role": "assistant",
                        "content": [{
                            "type": "text",
                            "text": {"value": format!("{}|{}", query.unwrap_or_default(), beta)}
                        }]
                    }]
                }))
            }),
        );
        let client = serve(router).await;

        let messages = client
            .list_messages(&ThreadId::new("thread_1"))
            .await
            .unwrap();

        assert_eq!(messages, vec![ThreadMessage::assistant("order=desc|assistants=v2")]);
    }

    #[tokio::test]
    async fn error_status_maps_through_response_handling() {
        let router = axum::Router::new().route(
            "/v1/threads/:thread_id/runs/:run_id",
            axum::routing::get(|| async {
                (
                    axum::http::StatusCode::NOT_FOUND,
                    axum::Json(serde_json::json!({
                        "error": {"message": "No run found with id 'run_9'.", "type": "invalid_request_error"}
                    })),
                )
            }),
        );
        let client = serve(router).await;

        let result = client
            .get_run(&ThreadId::new("thread_1"), &RunId::new("run_9"))
            .await;

        assert!(matches!(
            result,
            Err(UpstreamError::NotFound(ref m)) if m == "No run found with id 'run_9'."
        ));
    }

    #[tokio::test]
    async fn unparseable_success_body_is_parse_error() {
        let router = axum::Router::new().route(
            "/v1/threads",
            axum::routing::post(|| async { "not json" }),
        );
        let client = serve(router).await;

        assert!(matches!(
            client.create_thread().await,
            Err(UpstreamError::Parse(_))
        ));
    }

    #[test]
    fn run_object_converts_with_error_details() {
        let json = r#"{
            "id": "run_abc",
            "object": "thread.run",
            "status": "failed",
            "last_error": {"code": "rate_limit_exceeded", "message": "Slow down"}
        }"#;
        let run: Run = serde_json::from_str::<RunObject>(json).unwrap().into();

        assert_eq!(run.id.as_str(), "run_abc");
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.last_error.as_deref(), Some("rate_limit_exceeded: Slow down"));
    }

    #[test]
    fn run_object_without_error() {
        let json = r#"{"id": "run_1", "status": "queued", "last_error": null}"#;
        let run: Run = serde_json::from_str::<RunObject>(json).unwrap().into();

        assert_eq!(run.status, RunStatus::Queued);
        assert!(run.last_error.is_none());
    }

    #[test]
    fn message_list_keeps_first_text_block() {
        let json = r#"{
            "object": "list",
            "data": [
                {
                    "id": "msg_2",
                    "role": "assistant",
                    "content": [
                        {"type": "image_file", "image_file": {"file_id": "file_1"}},
                        {"type": "text", "text": {"value": "The answer is 4.", "annotations": []}}
                    ]
                },
                {
                    "id": "msg_1",
                    "role": "user",
                    "content": [{"type": "text", "text": {"value": "What is 2+2?", "annotations": []}}]
                }
            ],
            "has_more": false
        }"#;
        let list: MessageList = serde_json::from_str(json).unwrap();
        let messages: Vec<ThreadMessage> = list.data.into_iter().map(Into::into).collect();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ThreadMessage::assistant("The answer is 4."));
        assert_eq!(messages[1], ThreadMessage::user("What is 2+2?"));
    }

    #[test]
    fn message_without_text_has_empty_content() {
        let json = r#"{"role": "assistant", "content": [{"type": "image_file", "image_file": {}}]}"#;
        let message: ThreadMessage = serde_json::from_str::<MessageObject>(json).unwrap().into();

        assert_eq!(message.content, "");
        assert!(message.is_assistant());
    }

    #[test]
    fn status_codes_map_to_upstream_errors() {
        let body = r#"{"error": {"message": "No thread found with id 'abc'.", "type": "invalid_request_error"}}"#;

        assert!(matches!(
            error_for_status(401, body),
            UpstreamError::AuthenticationFailed
        ));
        assert!(matches!(
            error_for_status(404, body),
            UpstreamError::NotFound(ref m) if m == "No thread found with id 'abc'."
        ));
        assert!(matches!(error_for_status(429, body), UpstreamError::RateLimited(_)));
        assert!(matches!(error_for_status(400, body), UpstreamError::InvalidRequest(_)));
        assert!(matches!(error_for_status(503, body), UpstreamError::Unavailable(_)));
        assert!(matches!(error_for_status(418, body), UpstreamError::Network(_)));
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(error_message("upstream exploded"), "upstream exploded");
        assert_eq!(error_message(""), "");
    }

    #[test]
    fn request_bodies_serialize() {
        let body = CreateMessageRequest {
            role: MessageRole::User.as_str(),
            content: "hi",
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"role":"user","content":"hi"}"#
        );

        let run = CreateRunRequest {
            assistant_id: "asst_1",
        };
        assert_eq!(
            serde_json::to_string(&run).unwrap(),
            r#"{"assistant_id":"asst_1"}"#
        );
        assert_eq!(serde_json::to_string(&EmptyBody {}).unwrap(), "{}");
    }
}
