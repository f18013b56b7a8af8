//! Stateful builders for assembling a well-formed canonical event stream.
//!
//! Adapters never construct raw events by hand: they allocate message and
//! content builders here, feed deltas through them, and emit the returned
//! snapshots. The response output is kept as an explicit insertion-order log
//! plus an id-keyed map, so replace-by-id mutation never relies on aliasing.

use crate::message::{Content, ContentPart, Message, MessageType, Role, RunStatus};
use crate::response::{AgentResponse, ErrorDetail};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Which content variant a [`ContentBuilder`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Image,
    Audio,
    Data,
    Refusal,
    File,
}

fn add_numbers(a: &Value, b: &Value) -> Value {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Value::from(x.wrapping_add(y));
    }
    let sum = a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0);
    serde_json::Number::from_f64(sum).map(Value::Number).unwrap_or_else(|| b.clone())
}

/// Type-directed delta merge: strings concatenate, numbers add, arrays
/// concatenate, objects merge recursively, anything else replaces.
///
/// This is a best-effort compatibility shim, not a designed contract.
/// Callers needing exact semantics should send non-delta complete values.
pub fn merge_value(base: &mut Value, delta: Value) {
    if base.is_number() && delta.is_number() {
        *base = add_numbers(base, &delta);
        return;
    }
    match (&mut *base, delta) {
        (Value::String(b), Value::String(d)) => b.push_str(&d),
        (Value::Array(b), Value::Array(d)) => b.extend(d),
        (Value::Object(b), Value::Object(d)) => merge_map(b, d),
        (slot, other) => *slot = other,
    }
}

pub fn merge_map(base: &mut Map<String, Value>, delta: Map<String, Value>) {
    for (key, value) in delta {
        match base.get_mut(&key) {
            Some(slot) => merge_value(slot, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

/// Builds one content slot incrementally.
///
/// Deltas are buffered in a fragment log; `complete()` recomputes the
/// terminal value from that log, so calling it more than once yields the
/// same result (last call wins, never additive).
#[derive(Debug)]
pub struct ContentBuilder {
    kind: ContentKind,
    msg_id: String,
    index: usize,
    fragments: Vec<String>,
    base_text: Option<String>,
    data: Map<String, Value>,
    data_deltas: Vec<Map<String, Value>>,
    url: Option<String>,
    filename: Option<String>,
    status: RunStatus,
}

impl ContentBuilder {
    fn new(kind: ContentKind, msg_id: String, index: usize) -> Self {
        Self {
            kind,
            msg_id,
            index,
            fragments: Vec::new(),
            base_text: None,
            data: Map::new(),
            data_deltas: Vec::new(),
            url: None,
            filename: None,
            status: RunStatus::Created,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn msg_id(&self) -> &str {
        &self.msg_id
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Appends a fragment and returns a transient delta content for
    /// immediate emission. The builder's canonical stored value is not
    /// affected until `complete()`.
    pub fn add_text_delta(&mut self, text: impl Into<String>) -> Content {
        let text = text.into();
        self.fragments.push(text.clone());
        self.status = RunStatus::InProgress;
        self.snapshot(self.fragment_part(text), true, RunStatus::InProgress)
    }

    /// Sets the full (non-delta) text value. Fragments appended afterwards
    /// still concatenate onto this base.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.base_text = Some(text.into());
        self.status = RunStatus::InProgress;
    }

    /// Queues a data delta for merge at completion and returns a transient
    /// delta content for immediate emission.
    pub fn add_data_delta(&mut self, delta: Map<String, Value>) -> Content {
        self.data_deltas.push(delta.clone());
        self.status = RunStatus::InProgress;
        self.snapshot(ContentPart::Data { data: delta }, true, RunStatus::InProgress)
    }

    pub fn set_data(&mut self, data: Map<String, Value>) {
        self.data = data;
        self.status = RunStatus::InProgress;
    }

    pub fn update_data(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
        self.status = RunStatus::InProgress;
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = Some(url.into());
        self.status = RunStatus::InProgress;
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = Some(filename.into());
    }

    /// Produces the terminal content for this slot: full accumulated value,
    /// `delta = false`, status completed. A data slot built with only
    /// `set_data`/`update_data` and zero deltas still yields a terminal
    /// event here.
    pub fn complete(&mut self) -> Content {
        self.status = RunStatus::Completed;
        self.snapshot(self.final_part(), false, RunStatus::Completed)
    }

    fn snapshot(&self, part: ContentPart, delta: bool, status: RunStatus) -> Content {
        Content { part, index: self.index, msg_id: self.msg_id.clone(), delta, status }
    }

    fn fragment_part(&self, text: String) -> ContentPart {
        match self.kind {
            ContentKind::Refusal => ContentPart::Refusal { refusal: text },
            ContentKind::Audio => ContentPart::Audio { data: text },
            _ => ContentPart::Text { text },
        }
    }

    fn final_part(&self) -> ContentPart {
        match self.kind {
            ContentKind::Text => ContentPart::Text { text: self.accumulated_text() },
            ContentKind::Refusal => ContentPart::Refusal { refusal: self.accumulated_text() },
            ContentKind::Audio => ContentPart::Audio { data: self.accumulated_text() },
            ContentKind::Data => {
                let mut data = self.data.clone();
                for delta in &self.data_deltas {
                    merge_map(&mut data, delta.clone());
                }
                ContentPart::Data { data }
            }
            ContentKind::Image => ContentPart::Image { image_url: self.url.clone() },
            ContentKind::File => {
                ContentPart::File { file_url: self.url.clone(), filename: self.filename.clone() }
            }
        }
    }

    fn accumulated_text(&self) -> String {
        let mut text = self.base_text.clone().unwrap_or_default();
        for fragment in &self.fragments {
            text.push_str(fragment);
        }
        text
    }
}

/// Builds one message: allocates content indexes (monotonic from 0) and
/// owns the replace-or-append content log.
#[derive(Debug)]
pub struct MessageBuilder {
    message: Message,
    next_index: usize,
}

impl MessageBuilder {
    pub fn new(role: Role, message_type: MessageType) -> Self {
        let mut message = Message::new(role, message_type);
        message.status = RunStatus::InProgress;
        Self { message, next_index: 0 }
    }

    pub fn id(&self) -> &str {
        &self.message.id
    }

    pub fn message_type(&self) -> MessageType {
        self.message.message_type
    }

    /// In-progress snapshot, suitable for emitting as a skeleton event.
    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.message.metadata.insert(key.into(), value);
    }

    pub fn create_content_builder(&mut self, kind: ContentKind) -> ContentBuilder {
        let index = self.next_index;
        self.next_index += 1;
        ContentBuilder::new(kind, self.message.id.clone(), index)
    }

    /// Replace-or-append by content index.
    pub fn attach(&mut self, content: Content) {
        self.message.attach(content);
    }

    /// Finalizes a content builder and stores the terminal content at its
    /// reserved index. Returns the terminal content for emission.
    pub fn complete_content(&mut self, builder: &mut ContentBuilder) -> Content {
        let content = builder.complete();
        self.attach(content.clone());
        content
    }

    /// Marks the message completed and returns it. Completion is explicit,
    /// never implied by the state of the contents.
    pub fn complete(&mut self) -> Message {
        self.message.status = RunStatus::Completed;
        self.message.clone()
    }
}

/// Builds one [`AgentResponse`]: mints message builders and keeps the
/// response output as an ordered, id-keyed log with replace-by-id semantics.
#[derive(Debug)]
pub struct ResponseBuilder {
    id: String,
    session_id: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    order: Vec<String>,
    by_id: HashMap<String, Message>,
    error: Option<ErrorDetail>,
}

impl ResponseBuilder {
    pub fn new(session_id: Option<String>) -> Self {
        let proto = AgentResponse::new(session_id);
        Self {
            id: proto.id,
            session_id: proto.session_id,
            created_at: proto.created_at,
            order: Vec::new(),
            by_id: HashMap::new(),
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Allocates a new message, registers it in the output log, and returns
    /// its builder already in progress.
    pub fn create_message_builder(&mut self, role: Role, message_type: MessageType) -> MessageBuilder {
        let builder = MessageBuilder::new(role, message_type);
        self.upsert(builder.message().clone());
        builder
    }

    /// Replace-by-id on every mutation; insertion order is preserved for
    /// the final output array.
    pub fn upsert(&mut self, message: Message) {
        if !self.by_id.contains_key(&message.id) {
            self.order.push(message.id.clone());
        }
        self.by_id.insert(message.id.clone(), message);
    }

    pub fn created(&self) -> AgentResponse {
        self.snapshot(RunStatus::Created)
    }

    pub fn in_progress(&self) -> AgentResponse {
        self.snapshot(RunStatus::InProgress)
    }

    pub fn completed(&self) -> AgentResponse {
        self.snapshot(RunStatus::Completed)
    }

    pub fn failed(&mut self, error: ErrorDetail) -> AgentResponse {
        self.error = Some(error);
        self.snapshot(RunStatus::Failed)
    }

    pub fn cancelled(&self) -> AgentResponse {
        self.snapshot(RunStatus::Cancelled)
    }

    fn snapshot(&self, status: RunStatus) -> AgentResponse {
        AgentResponse {
            id: self.id.clone(),
            session_id: self.session_id.clone(),
            status,
            output: self.order.iter().filter_map(|id| self.by_id.get(id)).cloned().collect(),
            created_at: self.created_at,
            sequence_number: None,
            error: self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_deltas_accumulate() {
        let mut mb = MessageBuilder::new(Role::Assistant, MessageType::Message);
        let mut cb = mb.create_content_builder(ContentKind::Text);

        let d1 = cb.add_text_delta("Hel");
        assert!(d1.delta);
        assert_eq!(d1.text(), Some("Hel"));
        assert_eq!(d1.status, RunStatus::InProgress);

        cb.add_text_delta("lo");
        let done = mb.complete_content(&mut cb);
        assert!(!done.delta);
        assert_eq!(done.text(), Some("Hello"));
        assert_eq!(done.status, RunStatus::Completed);
        assert_eq!(mb.message().content[0].text(), Some("Hello"));
    }

    #[test]
    fn test_complete_is_idempotent() {
        let mut mb = MessageBuilder::new(Role::Assistant, MessageType::Message);
        let mut cb = mb.create_content_builder(ContentKind::Text);
        cb.add_text_delta("ab");
        cb.add_text_delta("cd");

        let first = cb.complete();
        let second = cb.complete();
        assert_eq!(first.text(), Some("abcd"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_data_merge_rules() {
        // update_data("a","x") + delta {"a":"y","b":[1]} => {"a":"xy","b":[1]}
        let mut mb = MessageBuilder::new(Role::Assistant, MessageType::FunctionCall);
        let mut cb = mb.create_content_builder(ContentKind::Data);
        cb.update_data("a", json!("x"));
        cb.add_data_delta(json!({"a": "y", "b": [1]}).as_object().unwrap().clone());

        let done = cb.complete();
        let data = done.data().unwrap();
        assert_eq!(data["a"], json!("xy"));
        assert_eq!(data["b"], json!([1]));
    }

    #[test]
    fn test_merge_value_numbers_and_nesting() {
        let mut base = json!({"n": 1, "f": 1.5, "inner": {"s": "a"}, "list": [1]});
        let delta = json!({"n": 2, "f": 0.5, "inner": {"s": "b", "t": true}, "list": [2], "new": null});
        merge_value(&mut base, delta);
        assert_eq!(base["n"], json!(3));
        assert_eq!(base["f"], json!(2.0));
        assert_eq!(base["inner"]["s"], json!("ab"));
        assert_eq!(base["inner"]["t"], json!(true));
        assert_eq!(base["list"], json!([1, 2]));
        assert_eq!(base["new"], json!(null));
    }

    #[test]
    fn test_merge_value_scalar_replaces() {
        let mut base = json!(true);
        merge_value(&mut base, json!("later"));
        assert_eq!(base, json!("later"));
    }

    #[test]
    fn test_data_only_set_data_still_completes() {
        let mut mb = MessageBuilder::new(Role::Assistant, MessageType::McpToolCall);
        let mut cb = mb.create_content_builder(ContentKind::Data);
        cb.set_data(json!({"name": "search"}).as_object().unwrap().clone());

        let done = cb.complete();
        assert!(!done.delta);
        assert_eq!(done.status, RunStatus::Completed);
        assert_eq!(done.data().unwrap()["name"], json!("search"));
    }

    #[test]
    fn test_content_indexes_are_monotonic() {
        let mut mb = MessageBuilder::new(Role::Assistant, MessageType::Message);
        let a = mb.create_content_builder(ContentKind::Text);
        let b = mb.create_content_builder(ContentKind::Refusal);
        let c = mb.create_content_builder(ContentKind::Data);
        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));
    }

    #[test]
    fn test_response_builder_replace_by_id() {
        let mut rb = ResponseBuilder::new(Some("sess-1".to_string()));
        let mut mb = rb.create_message_builder(Role::Assistant, MessageType::Message);
        assert_eq!(rb.in_progress().output.len(), 1);
        assert_eq!(rb.in_progress().output[0].status, RunStatus::InProgress);

        let mut cb = mb.create_content_builder(ContentKind::Text);
        cb.add_text_delta("hi");
        mb.complete_content(&mut cb);
        rb.upsert(mb.complete());

        let resp = rb.completed();
        assert_eq!(resp.output.len(), 1);
        assert_eq!(resp.output[0].status, RunStatus::Completed);
        assert_eq!(resp.output[0].joined_text(), "hi");
        assert_eq!(resp.status, RunStatus::Completed);
    }

    #[test]
    fn test_response_builder_preserves_order() {
        let mut rb = ResponseBuilder::new(None);
        let mut first = rb.create_message_builder(Role::Assistant, MessageType::Reasoning);
        let mut second = rb.create_message_builder(Role::Assistant, MessageType::Message);
        // complete out of order
        rb.upsert(second.complete());
        rb.upsert(first.complete());

        let resp = rb.completed();
        assert_eq!(resp.output[0].message_type, MessageType::Reasoning);
        assert_eq!(resp.output[1].message_type, MessageType::Message);
    }

    #[test]
    fn test_failed_response_carries_error() {
        let mut rb = ResponseBuilder::new(None);
        let resp = rb.failed(ErrorDetail::new("timeout", "stream expired"));
        assert_eq!(resp.status, RunStatus::Failed);
        assert_eq!(resp.error.as_ref().unwrap().code, "timeout");
    }

    #[test]
    fn test_set_text_then_fragments() {
        let mut mb = MessageBuilder::new(Role::Assistant, MessageType::Message);
        let mut cb = mb.create_content_builder(ContentKind::Text);
        cb.set_text("base:");
        cb.add_text_delta(" more");
        assert_eq!(cb.complete().text(), Some("base: more"));
    }
}
