use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Message,
    Reasoning,
    PluginCall,
    PluginCallOutput,
    FunctionCall,
    FunctionCallOutput,
    McpToolCall,
    McpToolCallOutput,
    McpListTools,
    Error,
}

/// Lifecycle state shared by responses, messages, and content parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Created,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Incomplete,
    Rejected,
    Unknown,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Incomplete
                | RunStatus::Rejected
        )
    }
}

/// The typed payload of a [`Content`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    Image {
        #[serde(skip_serializing_if = "Option::is_none")]
        image_url: Option<String>,
    },
    Audio {
        data: String,
    },
    Data {
        data: Map<String, Value>,
    },
    Refusal {
        refusal: String,
    },
    File {
        #[serde(skip_serializing_if = "Option::is_none")]
        file_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
}

/// One content slot of a [`Message`].
///
/// `index` is a replace key within the owning message, not purely an array
/// offset: attaching a content with an existing index replaces that slot.
/// When `delta` is true the payload is an incremental fragment; the terminal
/// event for a `(msg_id, index)` pair always carries the full accumulated
/// value with `delta = false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(flatten)]
    pub part: ContentPart,
    pub index: usize,
    pub msg_id: String,
    pub delta: bool,
    pub status: RunStatus,
}

impl Content {
    pub fn text(&self) -> Option<&str> {
        match &self.part {
            ContentPart::Text { text } => Some(text.as_str()),
            ContentPart::Refusal { refusal } => Some(refusal.as_str()),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        match &self.part {
            ContentPart::Data { data } => Some(data),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// One logical unit of agent output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub role: Role,
    pub status: RunStatus,
    #[serde(default)]
    pub content: Vec<Content>,
    /// Opaque passthrough map, used to preserve original framework ids and
    /// names across round-trips.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Message {
    pub fn new(role: Role, message_type: MessageType) -> Self {
        Self {
            id: format!("msg_{}", Uuid::new_v4().simple()),
            message_type,
            role,
            status: RunStatus::Created,
            content: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// Replace-or-append by content index. The attached content's `msg_id`
    /// is rewritten to this message's id.
    pub fn attach(&mut self, mut content: Content) {
        content.msg_id = self.id.clone();
        if self.status == RunStatus::Created {
            self.status = RunStatus::InProgress;
        }
        if let Some(slot) = self.content.iter_mut().find(|c| c.index == content.index) {
            *slot = content;
        } else {
            self.content.push(content);
        }
    }

    /// Concatenated text of all text contents, in slot order.
    pub fn joined_text(&self) -> String {
        self.content.iter().filter_map(|c| c.text()).collect()
    }

    /// Looks up a value in the first data content, if any.
    pub fn data_value(&self, key: &str) -> Option<&Value> {
        self.content.iter().find_map(|c| c.data()).and_then(|d| d.get(key))
    }

    /// Looks up a string value in the first data content, if any.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data_value(key).and_then(|v| v.as_str())
    }
}
