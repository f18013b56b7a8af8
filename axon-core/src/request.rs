use crate::message::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical invocation input, the protocol-neutral form every HTTP surface
/// converts into before reaching the runner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentRequest {
    #[serde(default)]
    pub input: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Canonical tool declarations: `{"type": "function", "function": {...}}`.
    #[serde(default)]
    pub tools: Vec<Value>,
    #[serde(default)]
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl AgentRequest {
    pub fn new(input: Vec<Message>) -> Self {
        Self { input, ..Default::default() }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageType, Role};

    #[test]
    fn test_request_builder_methods() {
        let req = AgentRequest::new(vec![Message::new(Role::User, MessageType::Message)])
            .with_session_id("sess-1")
            .with_user_id("u-1")
            .with_model("gpt-4.1");
        assert_eq!(req.session_id.as_deref(), Some("sess-1"));
        assert_eq!(req.user_id.as_deref(), Some("u-1"));
        assert_eq!(req.input.len(), 1);
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let req: AgentRequest = serde_json::from_str("{}").unwrap();
        assert!(req.input.is_empty());
        assert!(!req.stream);
        assert!(req.tools.is_empty());
    }
}
