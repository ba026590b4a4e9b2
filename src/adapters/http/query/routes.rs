//! Route definitions for the query endpoint

use axum::routing::post;
use axum::Router;

use super::handlers::{query, QueryAppState};

/// Create the query router
///
/// # Endpoints
///
/// - `POST /query` - Answer a question, optionally continuing a thread
pub fn query_router() -> Router<QueryAppState> {
    Router::new().route("/query", post(query))
}
