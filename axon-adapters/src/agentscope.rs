//! AgentScope stream adapter.
//!
//! AgentScope delivers a stream of `(msg, last)` ticks where each tick
//! carries the *full* accumulated block list of the message so far: text and
//! thinking blocks grow by prefix-extension, tool blocks are re-sent
//! verbatim on every tick. The adapter turns those ticks into canonical
//! events, deduplicating re-sent prefixes and blocks along the way.

use crate::tracker::{CallRegistry, PrefixTracker};
use async_stream::stream;
use axon_core::{
    AgentEvent, ContentBuilder, ContentKind, EventStream, MessageBuilder, MessageType,
    ResponseBuilder, Result, Role,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One tick of an AgentScope message stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentScopeChunk {
    pub msg: AgentScopeMessage,
    /// True on the final tick of this message.
    #[serde(default)]
    pub last: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentScopeMessage {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Vec<AgentScopeBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Native AgentScope content blocks. Unknown block shapes deserialize into
/// `Other` and fall back to stringified text downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentScopeBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        output: Value,
    },
    Image {
        source: BlockSource,
    },
    Audio {
        source: BlockSource,
    },
    #[serde(untagged)]
    Other(Value),
}

type Slot = (MessageBuilder, ContentBuilder);

struct AgentScopeState {
    response: ResponseBuilder,
    current_msg_id: Option<String>,
    text_slot: Option<Slot>,
    reasoning_slot: Option<Slot>,
    text_prefix: PrefixTracker,
    reasoning_prefix: PrefixTracker,
    calls: CallRegistry,
    emitted_calls: HashSet<String>,
    emitted_results: HashSet<String>,
    emitted_other: HashSet<String>,
}

impl AgentScopeState {
    fn new() -> Self {
        Self {
            response: ResponseBuilder::new(None),
            current_msg_id: None,
            text_slot: None,
            reasoning_slot: None,
            text_prefix: PrefixTracker::new(),
            reasoning_prefix: PrefixTracker::new(),
            calls: CallRegistry::new(),
            emitted_calls: HashSet::new(),
            emitted_results: HashSet::new(),
            emitted_other: HashSet::new(),
        }
    }

    fn handle(&mut self, chunk: AgentScopeChunk) -> Vec<AgentEvent> {
        let mut out = Vec::new();

        // New upstream message id: close everything and reset all
        // truncation state so no prefix leaks across ids.
        if self.current_msg_id.as_deref() != Some(chunk.msg.id.as_str()) {
            self.close_reasoning(&mut out);
            self.close_text(&mut out);
            self.text_prefix.reset();
            self.reasoning_prefix.reset();
            self.current_msg_id = Some(chunk.msg.id.clone());
        }

        for block in chunk.msg.content {
            match block {
                AgentScopeBlock::Text { text } => {
                    self.close_reasoning(&mut out);
                    let fresh = self.text_prefix.advance(&text);
                    self.open_text(&mut out);
                    if !fresh.is_empty() {
                        if let Some((_, cb)) = self.text_slot.as_mut() {
                            out.push(AgentEvent::Content(cb.add_text_delta(fresh)));
                        }
                    }
                }
                AgentScopeBlock::Thinking { thinking } => {
                    self.close_text(&mut out);
                    let fresh = self.reasoning_prefix.advance(&thinking);
                    if self.reasoning_slot.is_none() {
                        let mut mb = self
                            .response
                            .create_message_builder(Role::Assistant, MessageType::Reasoning);
                        let cb = mb.create_content_builder(ContentKind::Text);
                        out.push(AgentEvent::Message(mb.message().clone()));
                        self.reasoning_slot = Some((mb, cb));
                    }
                    if !fresh.is_empty() {
                        if let Some((_, cb)) = self.reasoning_slot.as_mut() {
                            out.push(AgentEvent::Content(cb.add_text_delta(fresh)));
                        }
                    }
                }
                AgentScopeBlock::ToolUse { id, name, input } => {
                    self.close_reasoning(&mut out);
                    self.close_text(&mut out);
                    if self.emitted_calls.insert(id.clone()) {
                        self.calls.open(&id, MessageType::PluginCall);
                        self.emit_tool_message(
                            &mut out,
                            MessageType::PluginCall,
                            Role::Assistant,
                            &id,
                            &name,
                            "arguments",
                            stringify(&input),
                        );
                    }
                }
                AgentScopeBlock::ToolResult { id, name, output } => {
                    self.close_reasoning(&mut out);
                    self.close_text(&mut out);
                    if self.emitted_results.insert(id.clone()) {
                        let output_type =
                            self.calls.output_type(&id, MessageType::PluginCallOutput);
                        self.emit_tool_message(
                            &mut out,
                            output_type,
                            Role::Tool,
                            &id,
                            &name,
                            "output",
                            stringify(&output),
                        );
                    }
                }
                AgentScopeBlock::Image { source } => {
                    self.close_reasoning(&mut out);
                    self.close_text(&mut out);
                    self.emit_media(&mut out, ContentKind::Image, source);
                }
                AgentScopeBlock::Audio { source } => {
                    self.close_reasoning(&mut out);
                    self.close_text(&mut out);
                    self.emit_media(&mut out, ContentKind::Audio, source);
                }
                AgentScopeBlock::Other(value) => {
                    // Unknown block: stringified text fallback, emitted once.
                    tracing::debug!(block = %value, "unknown agentscope block, falling back to text");
                    let key = value.to_string();
                    if self.emitted_other.insert(key.clone()) {
                        self.close_reasoning(&mut out);
                        self.close_text(&mut out);
                        let mut mb = self
                            .response
                            .create_message_builder(Role::Assistant, MessageType::Message);
                        out.push(AgentEvent::Message(mb.message().clone()));
                        let mut cb = mb.create_content_builder(ContentKind::Text);
                        cb.set_text(key);
                        out.push(AgentEvent::Content(mb.complete_content(&mut cb)));
                        let msg = mb.complete();
                        self.response.upsert(msg.clone());
                        out.push(AgentEvent::Message(msg));
                    }
                }
            }
        }

        if chunk.last {
            self.close_reasoning(&mut out);
            self.close_text(&mut out);
        }

        out
    }

    /// Closes anything still open when the source ends.
    fn finish(&mut self) -> Vec<AgentEvent> {
        let mut out = Vec::new();
        self.close_reasoning(&mut out);
        self.close_text(&mut out);
        out
    }

    fn open_text(&mut self, out: &mut Vec<AgentEvent>) {
        if self.text_slot.is_none() {
            let mut mb =
                self.response.create_message_builder(Role::Assistant, MessageType::Message);
            let cb = mb.create_content_builder(ContentKind::Text);
            out.push(AgentEvent::Message(mb.message().clone()));
            self.text_slot = Some((mb, cb));
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

    fn emit_tool_message(
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

    fn emit_media(&mut self, out: &mut Vec<AgentEvent>, kind: ContentKind, source: BlockSource) {
        let mut mb = self.response.create_message_builder(Role::Assistant, MessageType::Message);
        out.push(AgentEvent::Message(mb.message().clone()));
        let mut cb = mb.create_content_builder(kind);
        if let Some(url) = source.url {
            cb.set_url(url);
        } else if let Some(data) = source.data {
            if kind == ContentKind::Audio {
                cb.set_text(data);
            } else {
                cb.set_url(data);
            }
        }
        out.push(AgentEvent::Content(mb.complete_content(&mut cb)));
        let msg = mb.complete();
        self.response.upsert(msg.clone());
        out.push(AgentEvent::Message(msg));
    }
}

/// Tool-call inputs and outputs travel as JSON strings in the canonical
/// data map; plain strings pass through without re-quoting.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Adapts an AgentScope tick stream into canonical events.
///
/// Errors raised by the source finalize whatever was built so far before
/// propagating, so completed messages are never lost to a late failure.
pub fn adapt_agentscope<S>(source: S) -> EventStream
where
    S: Stream<Item = Result<AgentScopeChunk>> + Send + 'static,
{
    Box::pin(stream! {
        let mut state = AgentScopeState::new();
        futures::pin_mut!(source);
        while let Some(item) = source.next().await {
            match item {
                Ok(chunk) => {
                    for event in state.handle(chunk) {
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
