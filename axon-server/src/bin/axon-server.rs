//! Development server wiring an echo agent behind the full HTTP surface,
//! for smoke-testing clients against the Responses API without a model
//! backend.

use async_trait::async_trait;
use axon_adapters::adapt_text;
use axon_core::{AgentRequest, EventStream, Result};
use axon_runner::{Agent, InMemorySessionService, Runner};
use axon_server::ServerConfig;
use std::sync::Arc;

struct EchoAgent;

#[async_trait]
impl Agent for EchoAgent {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "echoes the last user message back, word by word"
    }

    async fn stream(&self, request: AgentRequest) -> Result<EventStream> {
        let text = request
            .input
            .last()
            .map(|m| m.joined_text())
            .unwrap_or_default();
        let chunks: Vec<Result<String>> = text
            .split_inclusive(' ')
            .map(|w| Ok(w.to_string()))
            .collect();
        Ok(adapt_text(futures::stream::iter(chunks)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .init();

    let runner = Arc::new(Runner::new(Arc::new(InMemorySessionService::new())));
    let config = ServerConfig::new(Arc::new(EchoAgent), runner);
    axon_server::serve(config, "0.0.0.0:8080").await?;
    Ok(())
}
