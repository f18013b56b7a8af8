//! # axon-server
//!
//! HTTP surface for the Axon agent runtime: the OpenAI-Responses-API
//! compatible endpoint (`POST /compatible-mode/v1/responses`, streaming and
//! non-streaming) and the A2A protocol adapter with its agent discovery
//! card.

pub mod a2a;
pub mod config;
pub mod responses;
pub mod rest;

pub use config::{SecurityConfig, ServerConfig};
pub use rest::create_app;

use axon_core::Result;

/// Serves the application until ctrl-c.
pub async fn serve(config: ServerConfig, addr: &str) -> Result<()> {
    let app = create_app(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "axon server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
