//! Service interfaces the runner depends on, plus the in-memory session
//! store used by tests and local runs.

use async_trait::async_trait;
use axon_core::{AgentRequest, EventStream, Message, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An agent that can be invoked with a canonical request and streams
/// canonical events back. Implementations typically wrap a framework
/// client behind one of the axon-adapters entry points.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Starts one invocation. The returned stream carries message and
    /// content events only; response-envelope events are the runner's job.
    async fn stream(&self, request: AgentRequest) -> Result<EventStream>;
}

/// Conversation history, keyed by session id.
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn append_message(
        &self,
        session_id: &str,
        user_id: Option<&str>,
        message: Message,
    ) -> Result<()>;

    async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>>;
}

/// Long-term memory, keyed by user id. The runner only consumes this
/// interface; real backends live outside the workspace.
#[async_trait]
pub trait MemoryService: Send + Sync {
    async fn add_memory(&self, user_id: &str, messages: &[Message]) -> Result<()>;

    async fn search_memory(&self, user_id: &str, query: &str) -> Result<Vec<String>>;
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn append_message(
        &self,
        session_id: &str,
        _user_id: Option<&str>,
        message: Message,
    ) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.to_string()).or_default().push(message);
        Ok(())
    }

    async fn get_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }
}

/// Convenience alias used across the server surface.
pub type SharedAgent = Arc<dyn Agent>;
