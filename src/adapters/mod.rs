//! Adapters - Implementations of port interfaces and inbound transports.
//!
//! - `ai` - Conversation clients (OpenAI Assistants API, in-memory mock)
//! - `http` - axum router exposing the query endpoint

pub mod ai;
pub mod http;

pub use ai::{MockConversationClient, OpenAIThreadsClient, OpenAIThreadsConfig};
pub use self::http::{app, QueryAppState};
