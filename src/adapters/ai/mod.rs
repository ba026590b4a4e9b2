//! Assistant Service Adapters.
//!
//! Implementations of the ConversationClient port.
//!
//! ## Available Adapters
//!
//! - `OpenAIThreadsClient` - OpenAI Assistants API (threads, messages, runs)
//! - `MockConversationClient` - Scripted in-memory client for testing

mod mock_client;
mod openai_threads;

pub use mock_client::{MockCall, MockConversationClient, MockOperation};
pub use openai_threads::{OpenAIThreadsClient, OpenAIThreadsConfig};
