//! Pure canonical ↔ A2A conversions. No state is held between calls; every
//! function is a straight mapping.

use super::types::{
    A2aMessage, A2aRole, Artifact, FileContent, Part, Task, TaskArtifactUpdateEvent, TaskState,
    TaskStatus, TaskStatusUpdateEvent,
};
use axon_core::{
    AgentResponse, Content, ContentPart, Message, MessageType, Role, RunStatus,
};
use serde_json::{Map, Value};

/// Canonical run-status spelling → A2A task state. Case-insensitive;
/// anything outside the table maps to `unknown`.
pub fn run_status_to_task_state(status: &str) -> TaskState {
    match status.to_ascii_lowercase().as_str() {
        "created" => TaskState::Submitted,
        "in_progress" | "delta" => TaskState::Working,
        "completed" => TaskState::Completed,
        "cancelled" | "canceled" => TaskState::Canceled,
        "failed" => TaskState::Failed,
        "rejected" => TaskState::Rejected,
        _ => TaskState::Unknown,
    }
}

pub fn status_to_task_state(status: RunStatus) -> TaskState {
    let spelling = serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    run_status_to_task_state(&spelling)
}

/// Canonical content → A2A part.
pub fn content_to_part(content: &Content) -> Part {
    match &content.part {
        ContentPart::Text { text } => Part::Text { text: text.clone() },
        ContentPart::Refusal { refusal } => Part::Text { text: refusal.clone() },
        ContentPart::Data { data } => Part::Data { data: data.clone() },
        ContentPart::Image { image_url } => Part::File {
            file: FileContent { uri: image_url.clone(), ..Default::default() },
        },
        ContentPart::Audio { data } => Part::File {
            file: FileContent { bytes: Some(data.clone()), ..Default::default() },
        },
        ContentPart::File { file_url, filename } => Part::File {
            file: FileContent {
                uri: file_url.clone(),
                name: filename.clone(),
                ..Default::default()
            },
        },
    }
}

/// A2A part → canonical content at the given slot index. Data parts with a
/// `function_call`/`function_response` envelope are unwrapped into the
/// canonical keyed map; data parts with an unrecognized non-object envelope
/// fall back to stringified text.
pub fn part_to_content(part: &Part, index: usize) -> Content {
    let part = match part {
        Part::Text { text } => ContentPart::Text { text: text.clone() },
        Part::File { file } => ContentPart::File {
            file_url: file.uri.clone().or_else(|| file.bytes.clone()),
            filename: file.name.clone(),
        },
        Part::Data { data } => match unwrap_tool_envelope(data) {
            Some(unwrapped) => ContentPart::Data { data: unwrapped },
            None => ContentPart::Data { data: data.clone() },
        },
    };
    Content { part, index, msg_id: String::new(), delta: false, status: RunStatus::Completed }
}

fn unwrap_tool_envelope(data: &Map<String, Value>) -> Option<Map<String, Value>> {
    for (key, payload_key) in [("function_call", "arguments"), ("function_response", "output")] {
        if let Some(envelope) = data.get(key) {
            let Some(envelope) = envelope.as_object() else {
                // unknown envelope shape, stringify it
                let mut map = Map::new();
                map.insert(payload_key.to_string(), Value::String(envelope.to_string()));
                return Some(map);
            };
            let mut map = Map::new();
            if let Some(id) = envelope.get("id") {
                map.insert("call_id".to_string(), id.clone());
            }
            if let Some(name) = envelope.get("name") {
                map.insert("name".to_string(), name.clone());
            }
            if let Some(payload) = envelope.get(payload_key) {
                let text = match payload {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                map.insert(payload_key.to_string(), Value::String(text));
            }
            return Some(map);
        }
    }
    None
}

fn is_call(message_type: MessageType) -> bool {
    matches!(
        message_type,
        MessageType::PluginCall | MessageType::FunctionCall | MessageType::McpToolCall
    )
}

fn is_call_output(message_type: MessageType) -> bool {
    matches!(
        message_type,
        MessageType::PluginCallOutput
            | MessageType::FunctionCallOutput
            | MessageType::McpToolCallOutput
    )
}

/// Canonical message → A2A message. Tool calls and outputs travel as
/// `function_call`/`function_response` data-part envelopes.
pub fn message_to_a2a(message: &Message) -> A2aMessage {
    let role = match message.role {
        Role::User => A2aRole::User,
        _ => A2aRole::Agent,
    };
    let parts = if is_call(message.message_type) {
        let mut envelope = Map::new();
        envelope.insert(
            "id".to_string(),
            Value::String(message.data_str("call_id").unwrap_or_default().to_string()),
        );
        envelope.insert(
            "name".to_string(),
            Value::String(message.data_str("name").unwrap_or_default().to_string()),
        );
        envelope.insert(
            "arguments".to_string(),
            Value::String(message.data_str("arguments").unwrap_or_default().to_string()),
        );
        let mut data = Map::new();
        data.insert("function_call".to_string(), Value::Object(envelope));
        vec![Part::Data { data }]
    } else if is_call_output(message.message_type) {
        let mut envelope = Map::new();
        envelope.insert(
            "id".to_string(),
            Value::String(message.data_str("call_id").unwrap_or_default().to_string()),
        );
        envelope.insert(
            "name".to_string(),
            Value::String(message.data_str("name").unwrap_or_default().to_string()),
        );
        envelope.insert(
            "output".to_string(),
            Value::String(message.data_str("output").unwrap_or_default().to_string()),
        );
        let mut data = Map::new();
        data.insert("function_response".to_string(), Value::Object(envelope));
        vec![Part::Data { data }]
    } else {
        message.content.iter().map(content_to_part).collect()
    };
    let mut a2a = A2aMessage::new(role, parts);
    a2a.message_id = message.id.clone();
    a2a
}

/// A2A message → canonical message. The message type is inferred from the
/// first tool envelope found, if any.
pub fn a2a_to_message(a2a: &A2aMessage) -> Message {
    let role = match a2a.role {
        A2aRole::User => Role::User,
        A2aRole::Agent => Role::Assistant,
    };
    let message_type = a2a
        .parts
        .iter()
        .find_map(|part| match part {
            Part::Data { data } if data.contains_key("function_call") => {
                Some(MessageType::FunctionCall)
            }
            Part::Data { data } if data.contains_key("function_response") => {
                Some(MessageType::FunctionCallOutput)
            }
            _ => None,
        })
        .unwrap_or(MessageType::Message);

    let mut message = Message::new(role, message_type);
    message.id = a2a.message_id.clone();
    for (index, part) in a2a.parts.iter().enumerate() {
        message.attach(part_to_content(part, index));
    }
    message.status = RunStatus::Completed;
    message
}

/// Response snapshot → A2A task, with the full message history attached.
pub fn response_to_task(response: &AgentResponse) -> Task {
    let context_id = response.session_id.clone().unwrap_or_else(|| response.id.clone());
    Task {
        id: response.id.clone(),
        context_id,
        status: task_status(response),
        artifacts: Vec::new(),
        history: response.output.iter().map(message_to_a2a).collect(),
        kind: "task".to_string(),
    }
}

/// Response snapshot → status-update event. `final` is set exactly for the
/// lifecycle-closing states.
pub fn response_to_status_update(response: &AgentResponse) -> TaskStatusUpdateEvent {
    let status = task_status(response);
    let is_final = status.state.is_final();
    TaskStatusUpdateEvent {
        task_id: response.id.clone(),
        context_id: response.session_id.clone().unwrap_or_else(|| response.id.clone()),
        status,
        is_final,
        kind: "status-update".to_string(),
    }
}

/// Completed canonical message → artifact-update event.
pub fn message_to_artifact_update(
    task_id: &str,
    context_id: &str,
    message: &Message,
) -> TaskArtifactUpdateEvent {
    TaskArtifactUpdateEvent {
        task_id: task_id.to_string(),
        context_id: context_id.to_string(),
        artifact: Artifact {
            artifact_id: message.id.clone(),
            name: None,
            description: None,
            parts: message.content.iter().map(content_to_part).collect(),
        },
        append: Some(false),
        last_chunk: Some(message.status == RunStatus::Completed),
        kind: "artifact-update".to_string(),
    }
}

fn task_status(response: &AgentResponse) -> TaskStatus {
    let state = status_to_task_state(response.status);
    let message = response
        .error
        .as_ref()
        .map(|e| A2aMessage::new(A2aRole::Agent, vec![Part::Text { text: e.message.clone() }]));
    TaskStatus {
        state,
        message,
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon_core::ErrorDetail;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_status_mapping_table() {
        assert_eq!(run_status_to_task_state("created"), TaskState::Submitted);
        assert_eq!(run_status_to_task_state("in_progress"), TaskState::Working);
        assert_eq!(run_status_to_task_state("delta"), TaskState::Working);
        assert_eq!(run_status_to_task_state("completed"), TaskState::Completed);
        assert_eq!(run_status_to_task_state("cancelled"), TaskState::Canceled);
        assert_eq!(run_status_to_task_state("canceled"), TaskState::Canceled);
        assert_eq!(run_status_to_task_state("failed"), TaskState::Failed);
        assert_eq!(run_status_to_task_state("rejected"), TaskState::Rejected);
        assert_eq!(run_status_to_task_state("incomplete"), TaskState::Unknown);
        assert_eq!(run_status_to_task_state("nonsense"), TaskState::Unknown);
    }

    #[test]
    fn test_status_mapping_case_insensitive() {
        assert_eq!(run_status_to_task_state("Created"), TaskState::Submitted);
        assert_eq!(run_status_to_task_state("IN_PROGRESS"), TaskState::Working);
        assert_eq!(run_status_to_task_state("CoMpLeTeD"), TaskState::Completed);
    }

    proptest! {
        // final iff state ∈ {completed, canceled, failed, rejected},
        // regardless of spelling case
        #[test]
        fn prop_final_iff_terminal_state(
            status in prop::sample::select(vec![
                "created", "in_progress", "completed", "cancelled",
                "failed", "rejected", "unknown", "delta", "bogus",
            ]),
            upper in any::<bool>(),
        ) {
            let spelling = if upper { status.to_uppercase() } else { status.to_string() };
            let state = run_status_to_task_state(&spelling);
            let expected_final =
                matches!(status, "completed" | "cancelled" | "failed" | "rejected");
            prop_assert_eq!(state.is_final(), expected_final);
        }
    }

    #[test]
    fn test_tool_call_round_trips_through_envelope() {
        let mut rb = axon_core::ResponseBuilder::new(None);
        let mut mb =
            rb.create_message_builder(Role::Assistant, MessageType::FunctionCall);
        let mut cb = mb.create_content_builder(axon_core::ContentKind::Data);
        cb.update_data("call_id", json!("c9"));
        cb.update_data("name", json!("search"));
        cb.update_data("arguments", json!(r#"{"q":"x"}"#));
        mb.complete_content(&mut cb);
        let message = mb.complete();

        let a2a = message_to_a2a(&message);
        match &a2a.parts[0] {
            Part::Data { data } => {
                assert_eq!(data["function_call"]["id"], json!("c9"));
                assert_eq!(data["function_call"]["arguments"], json!(r#"{"q":"x"}"#));
            }
            other => panic!("expected data part, got {other:?}"),
        }

        let back = a2a_to_message(&a2a);
        assert_eq!(back.message_type, MessageType::FunctionCall);
        assert_eq!(back.data_str("call_id"), Some("c9"));
        assert_eq!(back.data_str("name"), Some("search"));
    }

    #[test]
    fn test_text_message_conversion() {
        let a2a = A2aMessage::new(
            A2aRole::User,
            vec![Part::Text { text: "hi there".to_string() }],
        );
        let message = a2a_to_message(&a2a);
        assert_eq!(message.role, Role::User);
        assert_eq!(message.message_type, MessageType::Message);
        assert_eq!(message.joined_text(), "hi there");
        assert_eq!(message.id, a2a.message_id);
    }

    #[test]
    fn test_non_object_envelope_stringifies() {
        let mut data = Map::new();
        data.insert("function_call".to_string(), json!([1, 2, 3]));
        let content = part_to_content(&Part::Data { data }, 0);
        match &content.part {
            ContentPart::Data { data } => {
                assert_eq!(data["arguments"], json!("[1,2,3]"));
            }
            other => panic!("expected data content, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_response_status_update() {
        let mut rb = axon_core::ResponseBuilder::new(Some("sess-7".to_string()));
        let response = rb.failed(ErrorDetail::new("timeout", "deadline exceeded"));
        let update = response_to_status_update(&response);
        assert_eq!(update.status.state, TaskState::Failed);
        assert!(update.is_final);
        assert_eq!(update.context_id, "sess-7");
        assert_eq!(
            update.status.message.as_ref().unwrap().parts[0],
            Part::Text { text: "deadline exceeded".to_string() }
        );
    }

    #[test]
    fn test_response_to_task_carries_history() {
        let mut rb = axon_core::ResponseBuilder::new(Some("sess-1".to_string()));
        let mut mb = rb.create_message_builder(Role::Assistant, MessageType::Message);
        let mut cb = mb.create_content_builder(axon_core::ContentKind::Text);
        cb.add_text_delta("answer");
        mb.complete_content(&mut cb);
        rb.upsert(mb.complete());

        let task = response_to_task(&rb.completed());
        assert_eq!(task.context_id, "sess-1");
        assert_eq!(task.status.state, TaskState::Completed);
        assert_eq!(task.history.len(), 1);
        assert_eq!(task.history[0].parts[0], Part::Text { text: "answer".to_string() });
    }

    #[test]
    fn test_artifact_update_marks_last_chunk() {
        let mut mb =
            axon_core::MessageBuilder::new(Role::Assistant, MessageType::Message);
        let mut cb = mb.create_content_builder(axon_core::ContentKind::Text);
        cb.set_text("artifact body");
        mb.complete_content(&mut cb);
        let message = mb.complete();

        let update = message_to_artifact_update("t1", "c1", &message);
        assert_eq!(update.last_chunk, Some(true));
        assert_eq!(update.artifact.artifact_id, message.id);
        assert_eq!(update.artifact.parts.len(), 1);
    }
}
