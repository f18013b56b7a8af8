//! Plain-text stream adapter: each item is a ready-to-emit text delta.

use async_stream::stream;
use axon_core::{
    AgentEvent, ContentKind, EventStream, MessageType, ResponseBuilder, Result, Role,
};
use futures::{Stream, StreamExt};

/// Adapts a stream of raw text fragments into a single canonical message:
/// skeleton, one delta per non-empty fragment, then the completed content
/// and message.
pub fn adapt_text<S>(source: S) -> EventStream
where
    S: Stream<Item = Result<String>> + Send + 'static,
{
    Box::pin(stream! {
        let mut response = ResponseBuilder::new(None);
        let mut slot = None;
        futures::pin_mut!(source);
        while let Some(item) = source.next().await {
            match item {
                Ok(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    if slot.is_none() {
                        let mut mb = response
                            .create_message_builder(Role::Assistant, MessageType::Message);
                        let cb = mb.create_content_builder(ContentKind::Text);
                        yield Ok(AgentEvent::Message(mb.message().clone()));
                        slot = Some((mb, cb));
                    }
                    if let Some((_, cb)) = slot.as_mut() {
                        yield Ok(AgentEvent::Content(cb.add_text_delta(text)));
                    }
                }
                Err(e) => {
                    if let Some((mut mb, mut cb)) = slot.take() {
                        yield Ok(AgentEvent::Content(mb.complete_content(&mut cb)));
                        yield Ok(AgentEvent::Message(mb.complete()));
                    }
                    yield Err(e);
                    return;
                }
            }
        }
        if let Some((mut mb, mut cb)) = slot.take() {
            yield Ok(AgentEvent::Content(mb.complete_content(&mut cb)));
            yield Ok(AgentEvent::Message(mb.complete()));
        }
    })
}
