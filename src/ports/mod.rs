//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! - `ConversationClient` - Thread, message and run primitives of the hosted
//!   assistant service

mod conversation_client;

pub use conversation_client::{ConversationClient, UpstreamError};
