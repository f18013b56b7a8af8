//! Autogen stream adapter.
//!
//! Autogen interleaves true-delta `ModelClientStreamingChunkEvent`s with
//! complete agent-event envelopes (thoughts, tool call batches) and closes a
//! run with a `TextMessage` carrying the full final text, which overlaps
//! what was already streamed and must be deduplicated.

use crate::tracker::CallRegistry;
use async_stream::stream;
use axon_core::{
    AgentEvent, ContentBuilder, ContentKind, EventStream, MessageBuilder, MessageType,
    ResponseBuilder, Result, Role,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutogenFunctionCall {
    pub id: String,
    pub name: String,
    /// Already a JSON string on the wire.
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutogenFunctionResult {
    pub call_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

/// Native Autogen agent events, tagged by the `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AutogenEvent {
    ModelClientStreamingChunkEvent {
        #[serde(default)]
        content: String,
    },
    ThoughtEvent {
        #[serde(default)]
        content: String,
    },
    ToolCallRequestEvent {
        #[serde(default)]
        content: Vec<AutogenFunctionCall>,
    },
    ToolCallExecutionEvent {
        #[serde(default)]
        content: Vec<AutogenFunctionResult>,
    },
    TextMessage {
        #[serde(default)]
        content: String,
    },
    #[serde(untagged)]
    Other(Value),
}

type Slot = (MessageBuilder, ContentBuilder);

struct AutogenState {
    response: ResponseBuilder,
    text_slot: Option<Slot>,
    /// Text streamed via chunk events, for deduplicating the final
    /// TextMessage envelope.
    accumulated: String,
    calls: CallRegistry,
}

impl AutogenState {
    fn new() -> Self {
        Self {
            response: ResponseBuilder::new(None),
            text_slot: None,
            accumulated: String::new(),
            calls: CallRegistry::new(),
        }
    }

    fn handle(&mut self, event: AutogenEvent) -> Vec<AgentEvent> {
        let mut out = Vec::new();
        match event {
            AutogenEvent::ModelClientStreamingChunkEvent { content } => {
                if !content.is_empty() {
                    self.push_text(&mut out, content);
                }
            }
            AutogenEvent::ThoughtEvent { content } => {
                // thoughts arrive whole, not streamed
                self.close_text(&mut out);
                if !content.is_empty() {
                    let mut mb = self
                        .response
                        .create_message_builder(Role::Assistant, MessageType::Reasoning);
                    out.push(AgentEvent::Message(mb.message().clone()));
                    let mut cb = mb.create_content_builder(ContentKind::Text);
                    cb.set_text(content);
                    out.push(AgentEvent::Content(mb.complete_content(&mut cb)));
                    let msg = mb.complete();
                    self.response.upsert(msg.clone());
                    out.push(AgentEvent::Message(msg));
                }
            }
            AutogenEvent::ToolCallRequestEvent { content } => {
                self.close_text(&mut out);
                for call in content {
                    self.calls.open(&call.id, MessageType::FunctionCall);
                    self.emit_tool(
                        &mut out,
                        MessageType::FunctionCall,
                        Role::Assistant,
                        &call.id,
                        &call.name,
                        "arguments",
                        call.arguments,
                    );
                }
            }
            AutogenEvent::ToolCallExecutionEvent { content } => {
                self.close_text(&mut out);
                for result in content {
                    let output_type = self
                        .calls
                        .output_type(&result.call_id, MessageType::FunctionCallOutput);
                    self.emit_tool(
                        &mut out,
                        output_type,
                        Role::Tool,
                        &result.call_id,
                        &result.name,
                        "output",
                        result.content,
                    );
                }
            }
            AutogenEvent::TextMessage { content } => {
                // The final envelope repeats the streamed text in full; a
                // divergent final text goes out verbatim rather than dropped.
                let remainder = match content.strip_prefix(self.accumulated.as_str()) {
                    Some(rest) => rest.to_string(),
                    None => content.clone(),
                };
                if !remainder.is_empty() {
                    self.push_text(&mut out, remainder);
                }
                self.close_text(&mut out);
            }
            AutogenEvent::Other(value) => {
                tracing::debug!(event = %value, "ignoring unknown autogen event");
            }
        }
        out
    }

    fn finish(&mut self) -> Vec<AgentEvent> {
        let mut out = Vec::new();
        self.close_text(&mut out);
        out
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

    fn emit_tool(
        &mut self,
        out: &mut Vec<AgentEvent>,
        message_type: MessageType,
        role: Role,
        call_id: &str,
        name: &str,
        payload_key: &str,
        payload: String,
    ) {
        let mut mb = self.response.create_message_builder(role, message_type);
        mb.set_metadata("call_id", Value::String(call_id.to_string()));
        out.push(AgentEvent::Message(mb.message().clone()));
        let mut cb = mb.create_content_builder(ContentKind::Data);
        cb.update_data("call_id", Value::String(call_id.to_string()));
        cb.update_data("name", Value::String(name.to_string()));
        cb.update_data(payload_key, Value::String(payload));
        out.push(AgentEvent::Content(mb.complete_content(&mut cb)));
        let msg = mb.complete();
        self.response.upsert(msg.clone());
        out.push(AgentEvent::Message(msg));
    }
}

/// Adapts an Autogen agent-event stream into canonical events.
pub fn adapt_autogen<S>(source: S) -> EventStream
where
    S: Stream<Item = Result<AutogenEvent>> + Send + 'static,
{
    Box::pin(stream! {
        let mut state = AutogenState::new();
        futures::pin_mut!(source);
        while let Some(item) = source.next().await {
            match item {
                Ok(event) => {
                    for event in state.handle(event) {
                        yield Ok(event);
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
