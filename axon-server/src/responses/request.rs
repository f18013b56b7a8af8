//! Typed Responses-API request body and its conversion to the canonical
//! [`AgentRequest`]. Unknown fields are dropped silently by construction.

use axon_core::{AgentRequest, Content, ContentPart, Message, MessageType, Role, RunStatus};
use serde::Deserialize;
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsesRequest {
    pub input: Option<ResponsesInput>,
    pub model: Option<String>,
    pub instructions: Option<String>,
    /// Remapped to the canonical session id.
    pub conversation: Option<ConversationRef>,
    /// Remapped to the canonical user id.
    pub user: Option<String>,
    #[serde(default)]
    pub tools: Vec<ResponsesTool>,
    #[serde(default)]
    pub stream: bool,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// `input` is either a bare string or a structured item list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResponsesInput {
    Text(String),
    Items(Vec<InputItem>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputItem {
    #[serde(default = "default_role")]
    pub role: String,
    pub content: InputContent,
}

fn default_role() -> String {
    "user".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InputContent {
    Text(String),
    Parts(Vec<InputPart>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputPart {
    InputText { text: String },
    OutputText { text: String },
    InputImage { image_url: Option<String> },
    #[serde(untagged)]
    Other(Value),
}

/// `conversation` arrives as either a bare id or `{"id": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConversationRef {
    Id(String),
    Object { id: String },
}

impl ConversationRef {
    pub fn id(&self) -> &str {
        match self {
            ConversationRef::Id(id) | ConversationRef::Object { id } => id,
        }
    }
}

/// Responses-API flat tool declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesTool {
    #[serde(rename = "type", default = "default_tool_type")]
    pub tool_type: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub parameters: Option<Value>,
}

fn default_tool_type() -> String {
    "function".to_string()
}

impl ResponsesRequest {
    /// Converts to the canonical request: explicit remaps
    /// (`conversation` → session id, `user` → user id), string-or-items
    /// input, and flat tools into the nested canonical shape.
    pub fn to_agent_request(&self) -> AgentRequest {
        let input = match &self.input {
            None => Vec::new(),
            Some(ResponsesInput::Text(text)) => vec![user_text_message(text)],
            Some(ResponsesInput::Items(items)) => items.iter().map(item_to_message).collect(),
        };
        AgentRequest {
            input,
            session_id: self.conversation.as_ref().map(|c| c.id().to_string()),
            user_id: self.user.clone(),
            model: self.model.clone(),
            instructions: self.instructions.clone(),
            tools: self.tools.iter().map(tool_to_canonical).collect(),
            stream: self.stream,
            temperature: self.temperature,
            top_p: self.top_p,
            max_output_tokens: self.max_output_tokens,
            metadata: self.metadata.clone(),
        }
    }
}

fn user_text_message(text: &str) -> Message {
    let mut message = Message::new(Role::User, MessageType::Message);
    attach_text(&mut message, 0, text);
    message.status = RunStatus::Completed;
    message
}

fn item_to_message(item: &InputItem) -> Message {
    let role = match item.role.as_str() {
        "assistant" => Role::Assistant,
        "system" | "developer" => Role::System,
        "tool" => Role::Tool,
        _ => Role::User,
    };
    let mut message = Message::new(role, MessageType::Message);
    match &item.content {
        InputContent::Text(text) => attach_text(&mut message, 0, text),
        InputContent::Parts(parts) => {
            for (index, part) in parts.iter().enumerate() {
                match part {
                    InputPart::InputText { text } | InputPart::OutputText { text } => {
                        attach_text(&mut message, index, text);
                    }
                    InputPart::InputImage { image_url } => {
                        message.attach(Content {
                            part: ContentPart::Image { image_url: image_url.clone() },
                            index,
                            msg_id: message.id.clone(),
                            delta: false,
                            status: RunStatus::Completed,
                        });
                    }
                    InputPart::Other(value) => {
                        // unmappable part: keep it as stringified text
                        attach_text(&mut message, index, &value.to_string());
                    }
                }
            }
        }
    }
    message.status = RunStatus::Completed;
    message
}

fn attach_text(message: &mut Message, index: usize, text: &str) {
    message.attach(Content {
        part: ContentPart::Text { text: text.to_string() },
        index,
        msg_id: message.id.clone(),
        delta: false,
        status: RunStatus::Completed,
    });
}

fn tool_to_canonical(tool: &ResponsesTool) -> Value {
    json!({
        "type": tool.tool_type,
        "function": {
            "name": tool.name.clone().unwrap_or_default(),
            "description": tool.description.clone().unwrap_or_default(),
            "parameters": tool.parameters.clone().unwrap_or_else(|| json!({})),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_input_becomes_user_message() {
        let req: ResponsesRequest =
            serde_json::from_value(json!({"input": "hello", "stream": true})).unwrap();
        let agent_req = req.to_agent_request();
        assert!(agent_req.stream);
        assert_eq!(agent_req.input.len(), 1);
        assert_eq!(agent_req.input[0].role, Role::User);
        assert_eq!(agent_req.input[0].joined_text(), "hello");
    }

    #[test]
    fn test_item_input_with_parts() {
        let req: ResponsesRequest = serde_json::from_value(json!({
            "input": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": [
                    {"type": "input_text", "text": "what is this?"},
                    {"type": "input_image", "image_url": "https://x/img.png"}
                ]}
            ]
        }))
        .unwrap();
        let agent_req = req.to_agent_request();
        assert_eq!(agent_req.input.len(), 2);
        assert_eq!(agent_req.input[0].role, Role::System);
        assert_eq!(agent_req.input[1].content.len(), 2);
        assert!(matches!(
            agent_req.input[1].content[1].part,
            ContentPart::Image { .. }
        ));
    }

    #[test]
    fn test_remaps_and_flat_tools() {
        let req: ResponsesRequest = serde_json::from_value(json!({
            "input": "q",
            "conversation": {"id": "conv_9"},
            "user": "u_1",
            "model": "gpt-4.1",
            "tools": [{"type": "function", "name": "search", "parameters": {"type": "object"}}],
            "unknown_field": {"ignored": true}
        }))
        .unwrap();
        let agent_req = req.to_agent_request();
        assert_eq!(agent_req.session_id.as_deref(), Some("conv_9"));
        assert_eq!(agent_req.user_id.as_deref(), Some("u_1"));
        assert_eq!(agent_req.tools.len(), 1);
        assert_eq!(agent_req.tools[0]["function"]["name"], json!("search"));
        assert_eq!(agent_req.tools[0]["type"], json!("function"));
    }

    #[test]
    fn test_bare_conversation_id() {
        let req: ResponsesRequest =
            serde_json::from_value(json!({"conversation": "conv_1"})).unwrap();
        assert_eq!(req.to_agent_request().session_id.as_deref(), Some("conv_1"));
    }
}
