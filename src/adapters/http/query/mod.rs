//! HTTP adapter for answering questions
//!
//! Exposes `POST /query`, the gateway's only business endpoint.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::QueryAppState;
pub use routes::query_router;
