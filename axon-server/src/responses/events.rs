//! Responses-API wire types: the final response object, output items, and
//! the tagged stream-event enum with its `response.*` wire names.

use axon_core::{AgentResponse, ContentPart, Message, MessageType, RunStatus};
use serde::{Deserialize, Serialize};

/// Responses-API error codes this surface is allowed to emit. Canonical
/// codes outside this list degrade to `server_error` instead of failing the
/// conversion.
const ALLOWED_ERROR_CODES: &[&str] =
    &["server_error", "rate_limit_exceeded", "invalid_prompt", "invalid_request", "timeout"];

pub fn normalize_error_code(code: &str) -> String {
    if ALLOWED_ERROR_CODES.contains(&code) {
        code.to_string()
    } else {
        "server_error".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: String,
    pub message: String,
}

/// One part of a message item's content array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePart {
    OutputText { text: String },
    Refusal { refusal: String },
    ReasoningText { text: String },
}

/// One entry of `Response.output`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseItem {
    Message {
        id: String,
        status: String,
        role: String,
        content: Vec<ResponsePart>,
    },
    Reasoning {
        id: String,
        status: String,
        content: Vec<ResponsePart>,
    },
    FunctionCall {
        id: String,
        status: String,
        call_id: String,
        name: String,
        arguments: String,
    },
    FunctionCallOutput {
        id: String,
        status: String,
        call_id: String,
        output: String,
    },
    PluginCall {
        id: String,
        status: String,
        call_id: String,
        name: String,
        arguments: String,
    },
    PluginCallOutput {
        id: String,
        status: String,
        call_id: String,
        output: String,
    },
    McpCall {
        id: String,
        status: String,
        call_id: String,
        name: String,
        arguments: String,
    },
    McpCallOutput {
        id: String,
        status: String,
        call_id: String,
        output: String,
    },
    McpListTools {
        id: String,
        status: String,
        tools: Vec<serde_json::Value>,
    },
}

impl ResponseItem {
    /// Wire representation of a canonical message at its current state.
    /// Used both for the `output_item.added` skeleton and the
    /// `output_item.done` full item.
    pub fn from_message(message: &Message) -> Self {
        let id = message.id.clone();
        let status = status_str(message.status);
        let call_id = message.data_str("call_id").unwrap_or_default().to_string();
        let name = message.data_str("name").unwrap_or_default().to_string();
        let arguments = message.data_str("arguments").unwrap_or_default().to_string();
        let output = message.data_str("output").unwrap_or_default().to_string();
        match message.message_type {
            MessageType::Reasoning => ResponseItem::Reasoning {
                id,
                status,
                content: parts_of(message),
            },
            MessageType::FunctionCall => {
                ResponseItem::FunctionCall { id, status, call_id, name, arguments }
            }
            MessageType::FunctionCallOutput => {
                ResponseItem::FunctionCallOutput { id, status, call_id, output }
            }
            MessageType::PluginCall => {
                ResponseItem::PluginCall { id, status, call_id, name, arguments }
            }
            MessageType::PluginCallOutput => {
                ResponseItem::PluginCallOutput { id, status, call_id, output }
            }
            MessageType::McpToolCall => {
                ResponseItem::McpCall { id, status, call_id, name, arguments }
            }
            MessageType::McpToolCallOutput => {
                ResponseItem::McpCallOutput { id, status, call_id, output }
            }
            MessageType::McpListTools => ResponseItem::McpListTools {
                id,
                status,
                tools: message
                    .data_value("tools")
                    .and_then(|v| v.as_array().cloned())
                    .unwrap_or_default(),
            },
            MessageType::Message | MessageType::Error => ResponseItem::Message {
                id,
                status,
                role: role_str(message),
                content: parts_of(message),
            },
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ResponseItem::Message { id, .. }
            | ResponseItem::Reasoning { id, .. }
            | ResponseItem::FunctionCall { id, .. }
            | ResponseItem::FunctionCallOutput { id, .. }
            | ResponseItem::PluginCall { id, .. }
            | ResponseItem::PluginCallOutput { id, .. }
            | ResponseItem::McpCall { id, .. }
            | ResponseItem::McpCallOutput { id, .. }
            | ResponseItem::McpListTools { id, .. } => id,
        }
    }
}

fn status_str(status: RunStatus) -> String {
    match status {
        RunStatus::Created | RunStatus::InProgress => "in_progress".to_string(),
        RunStatus::Completed => "completed".to_string(),
        RunStatus::Incomplete => "incomplete".to_string(),
        _ => "failed".to_string(),
    }
}

fn role_str(message: &Message) -> String {
    serde_json::to_value(message.role)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "assistant".to_string())
}

fn parts_of(message: &Message) -> Vec<ResponsePart> {
    let reasoning = message.message_type == MessageType::Reasoning;
    message
        .content
        .iter()
        .filter_map(|c| match &c.part {
            ContentPart::Text { text } if reasoning => {
                Some(ResponsePart::ReasoningText { text: text.clone() })
            }
            ContentPart::Text { text } => Some(ResponsePart::OutputText { text: text.clone() }),
            ContentPart::Refusal { refusal } => {
                Some(ResponsePart::Refusal { refusal: refusal.clone() })
            }
            _ => None,
        })
        .collect()
}

/// The final Responses-API response object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub object: String,
    pub created_at: i64,
    pub status: String,
    pub output: Vec<ResponseItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl Response {
    pub fn from_agent_response(response: &AgentResponse, output: Vec<ResponseItem>) -> Self {
        Self {
            id: response.id.clone(),
            object: "response".to_string(),
            created_at: response.created_at.timestamp(),
            status: response_status_str(response.status),
            output,
            error: response.error.as_ref().map(|e| ResponseError {
                code: normalize_error_code(&e.code),
                message: e.message.clone(),
            }),
        }
    }
}

fn response_status_str(status: RunStatus) -> String {
    match status {
        RunStatus::Created | RunStatus::InProgress => "in_progress".to_string(),
        RunStatus::Completed => "completed".to_string(),
        RunStatus::Cancelled => "cancelled".to_string(),
        RunStatus::Incomplete => "incomplete".to_string(),
        _ => "failed".to_string(),
    }
}

/// Streaming events, tagged with their SSE event names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseStreamEvent {
    #[serde(rename = "response.created")]
    Created { response: Response },
    #[serde(rename = "response.in_progress")]
    InProgress { response: Response },
    #[serde(rename = "response.completed")]
    Completed { response: Response },
    #[serde(rename = "response.failed")]
    Failed { response: Response },
    #[serde(rename = "response.output_item.added")]
    OutputItemAdded { output_index: usize, item: ResponseItem },
    #[serde(rename = "response.output_item.done")]
    OutputItemDone { output_index: usize, item: ResponseItem },
    #[serde(rename = "response.content_part.added")]
    ContentPartAdded {
        item_id: String,
        output_index: usize,
        content_index: usize,
        part: ResponsePart,
    },
    #[serde(rename = "response.content_part.done")]
    ContentPartDone {
        item_id: String,
        output_index: usize,
        content_index: usize,
        part: ResponsePart,
    },
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        item_id: String,
        output_index: usize,
        content_index: usize,
        delta: String,
    },
    #[serde(rename = "response.output_text.done")]
    OutputTextDone {
        item_id: String,
        output_index: usize,
        content_index: usize,
        text: String,
    },
    #[serde(rename = "response.refusal.delta")]
    RefusalDelta {
        item_id: String,
        output_index: usize,
        content_index: usize,
        delta: String,
    },
    #[serde(rename = "response.refusal.done")]
    RefusalDone {
        item_id: String,
        output_index: usize,
        content_index: usize,
        refusal: String,
    },
    #[serde(rename = "response.function_call_arguments.delta")]
    FunctionCallArgumentsDelta {
        item_id: String,
        output_index: usize,
        delta: String,
    },
    #[serde(rename = "response.function_call_arguments.done")]
    FunctionCallArgumentsDone {
        item_id: String,
        output_index: usize,
        arguments: String,
    },
    #[serde(rename = "response.reasoning_text.delta")]
    ReasoningTextDelta {
        item_id: String,
        output_index: usize,
        content_index: usize,
        delta: String,
    },
    #[serde(rename = "response.reasoning_text.done")]
    ReasoningTextDone {
        item_id: String,
        output_index: usize,
        content_index: usize,
        text: String,
    },
}

impl ResponseStreamEvent {
    /// SSE `event:` field value, identical to the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            ResponseStreamEvent::Created { .. } => "response.created",
            ResponseStreamEvent::InProgress { .. } => "response.in_progress",
            ResponseStreamEvent::Completed { .. } => "response.completed",
            ResponseStreamEvent::Failed { .. } => "response.failed",
            ResponseStreamEvent::OutputItemAdded { .. } => "response.output_item.added",
            ResponseStreamEvent::OutputItemDone { .. } => "response.output_item.done",
            ResponseStreamEvent::ContentPartAdded { .. } => "response.content_part.added",
            ResponseStreamEvent::ContentPartDone { .. } => "response.content_part.done",
            ResponseStreamEvent::OutputTextDelta { .. } => "response.output_text.delta",
            ResponseStreamEvent::OutputTextDone { .. } => "response.output_text.done",
            ResponseStreamEvent::RefusalDelta { .. } => "response.refusal.delta",
            ResponseStreamEvent::RefusalDone { .. } => "response.refusal.done",
            ResponseStreamEvent::FunctionCallArgumentsDelta { .. } => {
                "response.function_call_arguments.delta"
            }
            ResponseStreamEvent::FunctionCallArgumentsDone { .. } => {
                "response.function_call_arguments.done"
            }
            ResponseStreamEvent::ReasoningTextDelta { .. } => "response.reasoning_text.delta",
            ResponseStreamEvent::ReasoningTextDone { .. } => "response.reasoning_text.done",
        }
    }
}
