use crate::error::Result;
use crate::message::{Content, Message, RunStatus};
use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use uuid::Uuid;

/// Structured error carried by a failed [`AgentResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

/// Top-level envelope for one agent invocation.
///
/// `sequence_number` is assigned by the emitting side (the HTTP layer for
/// SSE streams), never by the builders: it must be unique and increasing
/// across all events of one invocation, including content-level events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub status: RunStatus,
    #[serde(default)]
    pub output: Vec<Message>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl AgentResponse {
    pub fn new(session_id: Option<String>) -> Self {
        Self {
            id: format!("resp_{}", Uuid::new_v4().simple()),
            session_id,
            status: RunStatus::Created,
            output: Vec::new(),
            created_at: Utc::now(),
            sequence_number: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One canonical event: a response-level lifecycle update, a message-level
/// update, or an incremental content fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentEvent {
    Response(AgentResponse),
    Message(Message),
    Content(Content),
}

impl AgentEvent {
    /// True for the single terminal response event of one invocation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::Response(r) if r.is_terminal())
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            AgentEvent::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_content(&self) -> Option<&Content> {
        match self {
            AgentEvent::Content(c) => Some(c),
            _ => None,
        }
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent>> + Send>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageType, Role};

    #[test]
    fn test_response_creation() {
        let resp = AgentResponse::new(Some("sess-1".to_string()));
        assert!(resp.id.starts_with("resp_"));
        assert_eq!(resp.status, RunStatus::Created);
        assert!(resp.output.is_empty());
        assert!(!resp.is_terminal());
    }

    #[test]
    fn test_terminal_event() {
        let mut resp = AgentResponse::new(None);
        resp.status = RunStatus::Failed;
        assert!(AgentEvent::Response(resp).is_terminal());

        let msg = Message::new(Role::Assistant, MessageType::Message);
        assert!(!AgentEvent::Message(msg).is_terminal());
    }

    #[test]
    fn test_event_serialization_tag() {
        let msg = Message::new(Role::Assistant, MessageType::Message);
        let v = serde_json::to_value(AgentEvent::Message(msg)).unwrap();
        assert!(v.get("message").is_some());
    }
}
