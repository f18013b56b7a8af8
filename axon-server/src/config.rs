//! Server configuration.

use axon_runner::{Runner, SharedAgent};
use std::sync::Arc;
use std::time::Duration;

/// Transport hardening knobs applied as tower layers in `create_app`.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Overall deadline for one request, streaming included.
    pub request_timeout: Duration,
    /// Maximum accepted request body size, in bytes.
    pub body_limit: usize,
    /// Allowed CORS origins; empty means allow any.
    pub cors_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(300),
            body_limit: 2 * 1024 * 1024,
            cors_origins: Vec::new(),
        }
    }
}

/// Everything the HTTP surface needs to serve one agent.
#[derive(Clone)]
pub struct ServerConfig {
    pub agent: SharedAgent,
    pub runner: Arc<Runner>,
    pub security: SecurityConfig,
    /// Public base URL advertised in the agent card.
    pub base_url: String,
}

impl ServerConfig {
    pub fn new(agent: SharedAgent, runner: Arc<Runner>) -> Self {
        Self {
            agent,
            runner,
            security: SecurityConfig::default(),
            base_url: "http://localhost:8080".to_string(),
        }
    }

    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
