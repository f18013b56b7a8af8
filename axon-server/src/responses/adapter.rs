//! Canonical-to-Responses-API event conversion.
//!
//! One `ResponsesAdapter` instance per invocation: it owns the message-id →
//! output-index map and the accumulated output list for the final response
//! object. Sequence numbers are the HTTP layer's job, not this adapter's.

use super::events::{Response, ResponseItem, ResponsePart, ResponseStreamEvent};
use axon_core::{AgentEvent, AgentResponse, Content, ContentPart, Message, MessageType, RunStatus};
use std::collections::{HashMap, HashSet};

struct ItemState {
    message_type: MessageType,
    output_index: usize,
    /// Content indexes already announced with `content_part.added`.
    content_indexes: HashSet<usize>,
    done: bool,
}

/// Stateful per-invocation converter from canonical events to
/// Responses-API stream events.
#[derive(Default)]
pub struct ResponsesAdapter {
    items: HashMap<String, ItemState>,
    next_output_index: usize,
    output: Vec<ResponseItem>,
}

impl ResponsesAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn convert(&mut self, event: &AgentEvent) -> Vec<ResponseStreamEvent> {
        match event {
            AgentEvent::Response(response) => self.convert_response(response),
            AgentEvent::Message(message) => self.convert_message(message),
            AgentEvent::Content(content) => self.convert_content(content),
        }
    }

    fn convert_response(&mut self, response: &AgentResponse) -> Vec<ResponseStreamEvent> {
        let wire = Response::from_agent_response(response, self.output.clone());
        let event = match response.status {
            RunStatus::Created => ResponseStreamEvent::Created { response: wire },
            RunStatus::InProgress => ResponseStreamEvent::InProgress { response: wire },
            RunStatus::Completed => ResponseStreamEvent::Completed { response: wire },
            _ => ResponseStreamEvent::Failed { response: wire },
        };
        vec![event]
    }

    fn convert_message(&mut self, message: &Message) -> Vec<ResponseStreamEvent> {
        let mut out = Vec::new();
        if !self.items.contains_key(&message.id) {
            let output_index = self.next_output_index;
            self.next_output_index += 1;
            self.items.insert(
                message.id.clone(),
                ItemState {
                    message_type: message.message_type,
                    output_index,
                    content_indexes: HashSet::new(),
                    done: false,
                },
            );
            out.push(ResponseStreamEvent::OutputItemAdded {
                output_index,
                item: ResponseItem::from_message(message),
            });
        }
        if message.status == RunStatus::Completed {
            // items map is never pruned mid-invocation, entry is present
            if let Some(state) = self.items.get_mut(&message.id) {
                if !state.done {
                    state.done = true;
                    let item = ResponseItem::from_message(message);
                    self.output.push(item.clone());
                    out.push(ResponseStreamEvent::OutputItemDone {
                        output_index: state.output_index,
                        item,
                    });
                }
            }
        }
        out
    }

    fn convert_content(&mut self, content: &Content) -> Vec<ResponseStreamEvent> {
        let Some(state) = self.items.get_mut(&content.msg_id) else {
            tracing::debug!(msg_id = %content.msg_id, "content event for unknown message id");
            return Vec::new();
        };
        // plugin calls stream no content, only their item added/done pair
        if matches!(
            state.message_type,
            MessageType::PluginCall | MessageType::PluginCallOutput
        ) {
            return Vec::new();
        }

        let item_id = content.msg_id.clone();
        let output_index = state.output_index;
        let content_index = content.index;
        let mut out = Vec::new();

        match (state.message_type, &content.part) {
            (MessageType::Message, ContentPart::Text { text }) => {
                if state.content_indexes.insert(content_index) {
                    out.push(ResponseStreamEvent::ContentPartAdded {
                        item_id: item_id.clone(),
                        output_index,
                        content_index,
                        part: ResponsePart::OutputText { text: String::new() },
                    });
                }
                if content.delta {
                    out.push(ResponseStreamEvent::OutputTextDelta {
                        item_id,
                        output_index,
                        content_index,
                        delta: text.clone(),
                    });
                } else if content.is_completed() {
                    out.push(ResponseStreamEvent::OutputTextDone {
                        item_id: item_id.clone(),
                        output_index,
                        content_index,
                        text: text.clone(),
                    });
                    out.push(ResponseStreamEvent::ContentPartDone {
                        item_id,
                        output_index,
                        content_index,
                        part: ResponsePart::OutputText { text: text.clone() },
                    });
                }
            }
            (MessageType::Message, ContentPart::Refusal { refusal }) => {
                if state.content_indexes.insert(content_index) {
                    out.push(ResponseStreamEvent::ContentPartAdded {
                        item_id: item_id.clone(),
                        output_index,
                        content_index,
                        part: ResponsePart::Refusal { refusal: String::new() },
                    });
                }
                if content.delta {
                    out.push(ResponseStreamEvent::RefusalDelta {
                        item_id,
                        output_index,
                        content_index,
                        delta: refusal.clone(),
                    });
                } else if content.is_completed() {
                    out.push(ResponseStreamEvent::RefusalDone {
                        item_id: item_id.clone(),
                        output_index,
                        content_index,
                        refusal: refusal.clone(),
                    });
                    out.push(ResponseStreamEvent::ContentPartDone {
                        item_id,
                        output_index,
                        content_index,
                        part: ResponsePart::Refusal { refusal: refusal.clone() },
                    });
                }
            }
            (MessageType::Reasoning, ContentPart::Text { text }) => {
                if state.content_indexes.insert(content_index) {
                    out.push(ResponseStreamEvent::ContentPartAdded {
                        item_id: item_id.clone(),
                        output_index,
                        content_index,
                        part: ResponsePart::ReasoningText { text: String::new() },
                    });
                }
                if content.delta {
                    out.push(ResponseStreamEvent::ReasoningTextDelta {
                        item_id,
                        output_index,
                        content_index,
                        delta: text.clone(),
                    });
                } else if content.is_completed() {
                    out.push(ResponseStreamEvent::ReasoningTextDone {
                        item_id: item_id.clone(),
                        output_index,
                        content_index,
                        text: text.clone(),
                    });
                    out.push(ResponseStreamEvent::ContentPartDone {
                        item_id,
                        output_index,
                        content_index,
                        part: ResponsePart::ReasoningText { text: text.clone() },
                    });
                }
            }
            (
                MessageType::FunctionCall | MessageType::McpToolCall,
                ContentPart::Data { data },
            ) => {
                let arguments = data
                    .get("arguments")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                if content.delta {
                    if !arguments.is_empty() {
                        out.push(ResponseStreamEvent::FunctionCallArgumentsDelta {
                            item_id,
                            output_index,
                            delta: arguments,
                        });
                    }
                } else if content.is_completed() {
                    out.push(ResponseStreamEvent::FunctionCallArgumentsDone {
                        item_id,
                        output_index,
                        arguments,
                    });
                }
            }
            _ => {
                // call outputs, media and data payloads have no streaming
                // representation on this surface
            }
        }
        out
    }

    /// Output items accumulated from completed messages so far.
    pub fn output(&self) -> &[ResponseItem] {
        &self.output
    }
}
