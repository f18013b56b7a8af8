//! Agno stream adapter.
//!
//! Agno emits discrete run events (`RunStarted`, `RunContent`, tool events,
//! `RunCompleted`) where `RunContent` carries a *true* delta. The completed
//! event re-sends the full final text, which must be deduplicated against
//! what was already streamed.

use crate::tracker::CallRegistry;
use async_stream::stream;
use axon_core::{
    AgentEvent, AxonError, ContentBuilder, ContentKind, EventStream, MessageBuilder, MessageType,
    ResponseBuilder, Result, Role,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgnoToolCall {
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub tool_args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// Native Agno run events, tagged by the `event` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum AgnoEvent {
    RunStarted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
    },
    RunContent {
        /// True delta, not accumulated text.
        #[serde(default)]
        content: String,
    },
    ReasoningStep {
        #[serde(default)]
        reasoning_content: String,
    },
    ToolCallStarted {
        tool: AgnoToolCall,
    },
    ToolCallCompleted {
        tool: AgnoToolCall,
    },
    RunCompleted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    RunError {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    #[serde(untagged)]
    Other(Value),
}

type Slot = (MessageBuilder, ContentBuilder);

struct AgnoState {
    response: ResponseBuilder,
    text_slot: Option<Slot>,
    reasoning_slot: Option<Slot>,
    /// Everything streamed through text slots so far, for deduplicating the
    /// full text re-sent on RunCompleted.
    accumulated: String,
    calls: CallRegistry,
    failure: Option<String>,
}

impl AgnoState {
    fn new() -> Self {
        Self {
            response: ResponseBuilder::new(None),
            text_slot: None,
            reasoning_slot: None,
            accumulated: String::new(),
            calls: CallRegistry::new(),
            failure: None,
        }
    }

    fn handle(&mut self, event: AgnoEvent) -> Vec<AgentEvent> {
        let mut out = Vec::new();
        match event {
            AgnoEvent::RunStarted { .. } => {}
            AgnoEvent::RunContent { content } => {
                if !content.is_empty() {
                    self.close_reasoning(&mut out);
                    self.push_text(&mut out, content);
                }
            }
            AgnoEvent::ReasoningStep { reasoning_content } => {
                if !reasoning_content.is_empty() {
                    self.close_text(&mut out);
                    if self.reasoning_slot.is_none() {
                        let mut mb = self
                            .response
                            .create_message_builder(Role::Assistant, MessageType::Reasoning);
                        let cb = mb.create_content_builder(ContentKind::Text);
                        out.push(AgentEvent::Message(mb.message().clone()));
                        self.reasoning_slot = Some((mb, cb));
                    }
                    if let Some((_, cb)) = self.reasoning_slot.as_mut() {
                        out.push(AgentEvent::Content(cb.add_text_delta(reasoning_content)));
                    }
                }
            }
            AgnoEvent::ToolCallStarted { tool } => {
                self.close_reasoning(&mut out);
                self.close_text(&mut out);
                self.calls.open(&tool.tool_call_id, MessageType::FunctionCall);
                self.emit_tool(
                    &mut out,
                    MessageType::FunctionCall,
                    Role::Assistant,
                    &tool,
                    "arguments",
                    stringify(&tool.tool_args),
                );
            }
            AgnoEvent::ToolCallCompleted { tool } => {
                self.close_reasoning(&mut out);
                self.close_text(&mut out);
                let output_type = self
                    .calls
                    .output_type(&tool.tool_call_id, MessageType::FunctionCallOutput);
                let payload = tool.result.clone().unwrap_or_default();
                self.emit_tool(&mut out, output_type, Role::Tool, &tool, "output", payload);
            }
            AgnoEvent::RunCompleted { content } => {
                // The completed event re-sends the full final text; only the
                // part not already streamed is emitted. A final text that is
                // not an extension of what was streamed goes out verbatim.
                if let Some(full) = content {
                    let remainder = match full.strip_prefix(self.accumulated.as_str()) {
                        Some(rest) => rest.to_string(),
                        None => full.clone(),
                    };
                    if !remainder.is_empty() {
                        self.close_reasoning(&mut out);
                        self.push_text(&mut out, remainder);
                    }
                }
                self.close_reasoning(&mut out);
                self.close_text(&mut out);
            }
            AgnoEvent::RunError { content } => {
                self.close_reasoning(&mut out);
                self.close_text(&mut out);
                self.failure = Some(content.unwrap_or_else(|| "agno run failed".to_string()));
            }
            AgnoEvent::Other(value) => {
                tracing::debug!(event = %value, "ignoring unknown agno event");
            }
        }
        out
    }

    fn finish(&mut self) -> Vec<AgentEvent> {
        let mut out = Vec::new();
        self.close_reasoning(&mut out);
        self.close_text(&mut out);
        out
    }

    fn take_failure(&mut self) -> Option<AxonError> {
        self.failure.take().map(AxonError::Agent)
    }

    fn push_text(&mut self, out: &mut Vec<AgentEvent>, delta: String) {
        if self.text_slot.is_none() {
            let mut mb =
                self.response.create_message_builder(Role::Assistant, MessageType::Message);
            let cb = mb.create_content_builder(ContentKind::Text);
            out.push(AgentEvent::Message(mb.message().clone()));
            self.text_slot = Some((mb, cb));
        }
        self.accumulated.push_str(&delta);
        if let Some((_, cb)) = self.text_slot.as_mut() {
            out.push(AgentEvent::Content(cb.add_text_delta(delta)));
        }
    }

    fn close_text(&mut self, out: &mut Vec<AgentEvent>) {
        if let Some((mut mb, mut cb)) = self.text_slot.take() {
            out.push(AgentEvent::Content(mb.complete_content(&mut cb)));
            let msg = mb.complete();
            self.response.upsert(msg.clone());
            out.push(AgentEvent::Message(msg));
        }
    }

    fn close_reasoning(&mut self, out: &mut Vec<AgentEvent>) {
        if let Some((mut mb, mut cb)) = self.reasoning_slot.take() {
            out.push(AgentEvent::Content(mb.complete_content(&mut cb)));
            let msg = mb.complete();
            self.response.upsert(msg.clone());
            out.push(AgentEvent::Message(msg));
        }
    }

    fn emit_tool(
        &mut self,
        out: &mut Vec<AgentEvent>,
        message_type: MessageType,
        role: Role,
        tool: &AgnoToolCall,
        payload_key: &str,
        payload: String,
    ) {
        let mut mb = self.response.create_message_builder(role, message_type);
        mb.set_metadata("call_id", Value::String(tool.tool_call_id.clone()));
        out.push(AgentEvent::Message(mb.message().clone()));
        let mut cb = mb.create_content_builder(ContentKind::Data);
        cb.update_data("call_id", Value::String(tool.tool_call_id.clone()));
        cb.update_data("name", Value::String(tool.tool_name.clone()));
        cb.update_data(payload_key, Value::String(payload));
        out.push(AgentEvent::Content(mb.complete_content(&mut cb)));
        let msg = mb.complete();
        self.response.upsert(msg.clone());
        out.push(AgentEvent::Message(msg));
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Adapts an Agno run-event stream into canonical events.
///
/// `RunError` finalizes open messages, then surfaces as
/// [`AxonError::Agent`]; so do transport errors from the source itself.
pub fn adapt_agno<S>(source: S) -> EventStream
where
    S: Stream<Item = Result<AgnoEvent>> + Send + 'static,
{
    Box::pin(stream! {
        let mut state = AgnoState::new();
        futures::pin_mut!(source);
        while let Some(item) = source.next().await {
            match item {
                Ok(event) => {
                    for event in state.handle(event) {
                        yield Ok(event);
                    }
                    if let Some(err) = state.take_failure() {
                        yield Err(err);
                        return;
                    }
                }
                Err(e) => {
                    for event in state.finish() {
                        yield Ok(event);
                    }
                    yield Err(e);
                    return;
                }
            }
        }
        for event in state.finish() {
            yield Ok(event);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axon_core::RunStatus;
    use serde_json::json;

    fn delta_texts(events: &[AgentEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| e.as_content())
            .filter(|c| c.delta)
            .filter_map(|c| c.text().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_true_deltas_stream_through() {
        let mut state = AgnoState::new();
        let mut events = Vec::new();
        events.extend(state.handle(AgnoEvent::RunStarted { run_id: Some("r1".to_string()) }));
        events.extend(state.handle(AgnoEvent::RunContent { content: "Hel".to_string() }));
        events.extend(state.handle(AgnoEvent::RunContent { content: "lo".to_string() }));
        events.extend(state.handle(AgnoEvent::RunCompleted { content: Some("Hello".to_string()) }));
        events.extend(state.finish());

        assert_eq!(delta_texts(&events), vec!["Hel", "lo"]);
        let done = events
            .iter()
            .filter_map(|e| e.as_message())
            .find(|m| m.status == RunStatus::Completed)
            .unwrap();
        assert_eq!(done.joined_text(), "Hello");
    }

    #[test]
    fn test_run_completed_emits_unstreamed_tail() {
        let mut state = AgnoState::new();
        let mut events = Vec::new();
        events.extend(state.handle(AgnoEvent::RunContent { content: "Hel".to_string() }));
        // stream was cut short, completed carries the rest
        events.extend(state.handle(AgnoEvent::RunCompleted { content: Some("Hello".to_string()) }));
        assert_eq!(delta_texts(&events), vec!["Hel", "lo"]);
    }

    #[test]
    fn test_run_completed_divergent_text_is_emitted_verbatim() {
        let mut state = AgnoState::new();
        let mut events = Vec::new();
        events.extend(state.handle(AgnoEvent::RunContent { content: "draft".to_string() }));
        // final text disagrees with what was streamed: emitted, not dropped
        events.extend(
            state.handle(AgnoEvent::RunCompleted { content: Some("final answer".to_string()) }),
        );
        assert_eq!(delta_texts(&events), vec!["draft", "final answer"]);
    }

    #[test]
    fn test_run_completed_without_streaming_emits_full_text() {
        let mut state = AgnoState::new();
        let events =
            state.handle(AgnoEvent::RunCompleted { content: Some("all at once".to_string()) });
        assert_eq!(delta_texts(&events), vec!["all at once"]);
        assert!(events
            .iter()
            .filter_map(|e| e.as_message())
            .any(|m| m.status == RunStatus::Completed));
    }

    #[test]
    fn test_tool_lifecycle_maps_to_function_call_pair() {
        let mut state = AgnoState::new();
        let tool = AgnoToolCall {
            tool_call_id: "tc_1".to_string(),
            tool_name: "lookup".to_string(),
            tool_args: json!({"key": "k"}),
            result: None,
        };
        let mut events = Vec::new();
        events.extend(state.handle(AgnoEvent::ToolCallStarted { tool: tool.clone() }));
        events.extend(state.handle(AgnoEvent::ToolCallCompleted {
            tool: AgnoToolCall { result: Some("v".to_string()), ..tool },
        }));

        let completed: Vec<_> = events
            .iter()
            .filter_map(|e| e.as_message())
            .filter(|m| m.status == RunStatus::Completed)
            .collect();
        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0].message_type, MessageType::FunctionCall);
        assert_eq!(completed[0].data_str("arguments"), Some(r#"{"key":"k"}"#));
        assert_eq!(completed[1].message_type, MessageType::FunctionCallOutput);
        assert_eq!(completed[1].data_str("call_id"), Some("tc_1"));
        assert_eq!(completed[1].data_str("output"), Some("v"));
    }

    #[test]
    fn test_tool_call_closes_open_text() {
        let mut state = AgnoState::new();
        let mut events = Vec::new();
        events.extend(state.handle(AgnoEvent::RunContent { content: "checking".to_string() }));
        events.extend(state.handle(AgnoEvent::ToolCallStarted {
            tool: AgnoToolCall {
                tool_call_id: "tc".to_string(),
                tool_name: "t".to_string(),
                tool_args: json!({}),
                result: None,
            },
        }));
        // the text message completed before the tool call message started
        let order: Vec<_> = events
            .iter()
            .filter_map(|e| e.as_message())
            .map(|m| (m.message_type, m.status))
            .collect();
        let text_done = order
            .iter()
            .position(|&(t, s)| t == MessageType::Message && s == RunStatus::Completed)
            .unwrap();
        let call_started = order
            .iter()
            .position(|&(t, s)| t == MessageType::FunctionCall && s == RunStatus::InProgress)
            .unwrap();
        assert!(text_done < call_started);
    }

    #[test]
    fn test_reasoning_steps_become_reasoning_message() {
        let mut state = AgnoState::new();
        let mut events = Vec::new();
        events.extend(
            state.handle(AgnoEvent::ReasoningStep { reasoning_content: "step 1. ".to_string() }),
        );
        events.extend(
            state.handle(AgnoEvent::ReasoningStep { reasoning_content: "step 2.".to_string() }),
        );
        events.extend(state.handle(AgnoEvent::RunContent { content: "answer".to_string() }));
        events.extend(state.finish());

        let reasoning = events
            .iter()
            .filter_map(|e| e.as_message())
            .find(|m| m.message_type == MessageType::Reasoning && m.status == RunStatus::Completed)
            .unwrap();
        assert_eq!(reasoning.joined_text(), "step 1. step 2.");
    }

    #[tokio::test]
    async fn test_run_error_propagates_after_finalizing() {
        let source = futures::stream::iter(vec![
            Ok(AgnoEvent::RunContent { content: "part".to_string() }),
            Ok(AgnoEvent::RunError { content: Some("model refused".to_string()) }),
        ]);
        let events: Vec<_> = adapt_agno(source).collect().await;
        let ok_events: Vec<_> = events.iter().filter_map(|e| e.as_ref().ok()).collect();
        assert!(ok_events
            .iter()
            .filter_map(|e| e.as_message())
            .any(|m| m.status == RunStatus::Completed && m.joined_text() == "part"));
        match events.last().unwrap() {
            Err(AxonError::Agent(msg)) => assert_eq!(msg, "model refused"),
            other => panic!("expected agent error, got {other:?}"),
        }
    }

    #[test]
    fn test_event_wire_format() {
        let event: AgnoEvent =
            serde_json::from_value(json!({"event": "RunContent", "content": "hi"})).unwrap();
        assert!(matches!(event, AgnoEvent::RunContent { ref content } if content == "hi"));

        let unknown: AgnoEvent =
            serde_json::from_value(json!({"event": "MemoryUpdate", "x": 1})).unwrap();
        assert!(matches!(unknown, AgnoEvent::Other(_)));
    }
}
