//! The invocation runner: wraps an agent's event stream in a response
//! envelope with exactly one terminal marker.

use crate::services::{MemoryService, SessionService, SharedAgent};
use async_stream::stream;
use axon_core::{
    AgentEvent, AgentRequest, ErrorDetail, EventStream, Message, ResponseBuilder, RunStatus,
};
use futures::StreamExt;
use std::sync::Arc;

/// Runs agent invocations against the configured services.
///
/// `stream_query` produces one `AgentResponse` lifecycle per call:
/// `Response(created)`, `Response(in_progress)`, every message/content event
/// the agent emits, then exactly one `Response(completed)` or
/// `Response(failed)`. The stream never ends without a terminal marker.
#[derive(Clone)]
pub struct Runner {
    session_service: Arc<dyn SessionService>,
    memory_service: Option<Arc<dyn MemoryService>>,
}

impl Runner {
    pub fn new(session_service: Arc<dyn SessionService>) -> Self {
        Self { session_service, memory_service: None }
    }

    pub fn with_memory_service(mut self, memory_service: Arc<dyn MemoryService>) -> Self {
        self.memory_service = Some(memory_service);
        self
    }

    pub fn session_service(&self) -> &Arc<dyn SessionService> {
        &self.session_service
    }

    /// Starts one invocation and returns its canonical event stream.
    ///
    /// Completed messages are collected into the response output
    /// (replace-by-id) and persisted through the session service; session
    /// and memory writes are best-effort and never fail the invocation.
    pub fn stream_query(&self, agent: SharedAgent, request: AgentRequest) -> EventStream {
        let sessions = self.session_service.clone();
        let memory = self.memory_service.clone();
        Box::pin(stream! {
            let mut builder = ResponseBuilder::new(request.session_id.clone());
            yield Ok(AgentEvent::Response(builder.created()));
            yield Ok(AgentEvent::Response(builder.in_progress()));

            let session_id = request.session_id.clone();
            let user_id = request.user_id.clone();
            if let Some(sid) = &session_id {
                for message in &request.input {
                    if let Err(e) = sessions
                        .append_message(sid, user_id.as_deref(), message.clone())
                        .await
                    {
                        tracing::warn!(session_id = %sid, error = %e, "failed to persist input message");
                    }
                }
            }

            let events = match agent.stream(request).await {
                Ok(events) => events,
                Err(e) => {
                    tracing::error!(agent = agent.name(), error = %e, "agent invocation failed to start");
                    yield Ok(AgentEvent::Response(
                        builder.failed(ErrorDetail::new(e.code(), e.to_string())),
                    ));
                    return;
                }
            };
            futures::pin_mut!(events);

            let mut completed: Vec<Message> = Vec::new();
            while let Some(item) = events.next().await {
                match item {
                    Ok(AgentEvent::Message(message)) => {
                        builder.upsert(message.clone());
                        if message.status == RunStatus::Completed {
                            if let Some(sid) = &session_id {
                                if let Err(e) = sessions
                                    .append_message(sid, user_id.as_deref(), message.clone())
                                    .await
                                {
                                    tracing::warn!(session_id = %sid, error = %e, "failed to persist message");
                                }
                            }
                            completed.push(message.clone());
                        }
                        yield Ok(AgentEvent::Message(message));
                    }
                    Ok(AgentEvent::Content(content)) => {
                        yield Ok(AgentEvent::Content(content));
                    }
                    Ok(AgentEvent::Response(response)) => {
                        // the envelope is owned here, not by the agent
                        tracing::debug!(id = %response.id, "dropping agent-emitted response event");
                    }
                    Err(e) => {
                        tracing::error!(agent = agent.name(), error = %e, "agent stream failed");
                        yield Ok(AgentEvent::Response(
                            builder.failed(ErrorDetail::new(e.code(), e.to_string())),
                        ));
                        return;
                    }
                }
            }

            if let (Some(memory), Some(uid)) = (&memory, &user_id) {
                if !completed.is_empty() {
                    if let Err(e) = memory.add_memory(uid, &completed).await {
                        tracing::warn!(user_id = %uid, error = %e, "failed to record memory");
                    }
                }
            }

            yield Ok(AgentEvent::Response(builder.completed()));
        })
    }
}
