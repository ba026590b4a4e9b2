//! Assistant Gateway server entry point.
//!
//! Loads configuration, builds the assistant client once, and serves the
//! HTTP API until interrupted.

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use assistant_gateway::adapters::ai::OpenAIThreadsClient;
use assistant_gateway::adapters::http::{app, QueryAppState};
use assistant_gateway::application::handlers::AnswerQuestionHandler;
use assistant_gateway::config::{AppConfig, ServerConfig};
use assistant_gateway::ports::ConversationClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let client: Arc<dyn ConversationClient> =
        Arc::new(OpenAIThreadsClient::new(config.assistant.client_config())?);

    let handler = AnswerQuestionHandler::new(client, config.assistant.identities())
        .with_poll_policy(config.assistant.poll_policy())
        .with_fallbacks(config.reply.fallbacks());

    let router = app(QueryAppState::new(handler), &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        base_url = %config.assistant.base_url,
        "Assistant gateway listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Assistant gateway stopped");
    Ok(())
}

/// Install the global subscriber: JSON lines in production, human-readable otherwise.
///
/// `RUST_LOG` takes precedence over the configured filter.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if server.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
