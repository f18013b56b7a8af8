//! Shared bookkeeping for stream adapters: truncation-prefix tracking and
//! tool-call correlation.

use axon_core::MessageType;
use std::collections::HashMap;

/// Tracks the last-seen full string for a (message, content kind) slot and
/// turns full-accumulated-text ticks into fresh suffixes.
///
/// Some frameworks re-send the whole accumulated text on every tick instead
/// of a true delta. If a tick is not a prefix-extension of the previous one
/// (a framework bug or truncation), the full text is returned as-is rather
/// than failing. Must be reset whenever the upstream message id changes:
/// stale prefix state leaking across ids produces duplicate output.
#[derive(Debug, Default)]
pub struct PrefixTracker {
    last: String,
}

impl PrefixTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes a full-text tick and returns the not-yet-emitted suffix.
    pub fn advance(&mut self, full: &str) -> String {
        let fresh = match full.strip_prefix(self.last.as_str()) {
            Some(rest) => rest.to_string(),
            None => full.to_string(),
        };
        self.last = full.to_string();
        fresh
    }

    pub fn last(&self) -> &str {
        &self.last
    }

    pub fn reset(&mut self) {
        self.last.clear();
    }
}

/// Pending tool calls by opaque call id, for classifying tool outputs.
///
/// Entries live for the duration of one invocation: an output arriving for
/// an id whose call event was dropped falls back to the adapter's default
/// output type.
#[derive(Debug, Default)]
pub struct CallRegistry {
    pending: HashMap<String, MessageType>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, call_id: impl Into<String>, call_type: MessageType) {
        self.pending.insert(call_id.into(), call_type);
    }

    /// Output message type matching the call opened with this id.
    pub fn output_type(&self, call_id: &str, default: MessageType) -> MessageType {
        match self.pending.get(call_id) {
            Some(MessageType::PluginCall) => MessageType::PluginCallOutput,
            Some(MessageType::FunctionCall) => MessageType::FunctionCallOutput,
            Some(MessageType::McpToolCall) => MessageType::McpToolCallOutput,
            _ => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_prefix_tracker_basic() {
        let mut tracker = PrefixTracker::new();
        assert_eq!(tracker.advance("Hel"), "Hel");
        assert_eq!(tracker.advance("Hello"), "lo");
        assert_eq!(tracker.advance("Hello"), "");
        assert_eq!(tracker.last(), "Hello");
    }

    #[test]
    fn test_prefix_tracker_broken_prefix_emits_full() {
        let mut tracker = PrefixTracker::new();
        tracker.advance("abc");
        // not a prefix-extension: emit the tick verbatim
        assert_eq!(tracker.advance("xyz"), "xyz");
        assert_eq!(tracker.last(), "xyz");
    }

    #[test]
    fn test_prefix_tracker_reset() {
        let mut tracker = PrefixTracker::new();
        tracker.advance("abc");
        tracker.reset();
        assert_eq!(tracker.advance("abc"), "abc");
    }

    #[test]
    fn test_call_registry_classification() {
        let mut calls = CallRegistry::new();
        calls.open("c1", MessageType::PluginCall);
        calls.open("c2", MessageType::McpToolCall);
        calls.open("c3", MessageType::FunctionCall);

        let d = MessageType::PluginCallOutput;
        assert_eq!(calls.output_type("c1", d), MessageType::PluginCallOutput);
        assert_eq!(calls.output_type("c2", d), MessageType::McpToolCallOutput);
        assert_eq!(calls.output_type("c3", d), MessageType::FunctionCallOutput);
        // unknown id: default
        assert_eq!(calls.output_type("nope", d), MessageType::PluginCallOutput);
        assert_eq!(
            calls.output_type("nope", MessageType::FunctionCallOutput),
            MessageType::FunctionCallOutput
        );
    }

    proptest! {
        // For prefix-extension ticks t1 ⊆ t2 ⊆ ... ⊆ tn, the concatenation
        // of all emitted fragments equals tn.
        #[test]
        fn prop_prefix_deltas_reassemble(text in ".{0,64}", cuts in proptest::collection::vec(0usize..64, 0..8)) {
            let mut points: Vec<usize> = cuts
                .into_iter()
                .map(|c| {
                    let mut at = c.min(text.len());
                    while !text.is_char_boundary(at) {
                        at -= 1;
                    }
                    at
                })
                .collect();
            points.push(text.len());
            points.sort_unstable();

            let mut tracker = PrefixTracker::new();
            let mut emitted = String::new();
            for at in points {
                emitted.push_str(&tracker.advance(&text[..at]));
            }
            prop_assert_eq!(emitted, text);
        }
    }
}
