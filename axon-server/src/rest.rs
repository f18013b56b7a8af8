//! HTTP surface: router construction and the Responses-API handlers.

use crate::a2a::build_agent_card;
use crate::config::ServerConfig;
use crate::responses::{
    Response as WireResponse, ResponseError, ResponseItem, ResponseStreamEvent, ResponsesAdapter,
    ResponsesRequest, normalize_error_code,
};
use axon_core::{AgentEvent, AgentRequest, AgentResponse};
use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use futures::StreamExt;
use serde_json::json;
use std::convert::Infallible;
use tokio::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Builds the application router with the standard tower layers applied.
pub fn create_app(config: ServerConfig) -> Router {
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
    };
    let body_limit = config.security.body_limit;

    Router::new()
        .route("/health", get(health))
        .route("/.well-known/agent.json", get(agent_card))
        .route("/compatible-mode/v1/responses", post(create_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(config)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

async fn agent_card(State(config): State<ServerConfig>) -> Json<crate::a2a::AgentCard> {
    Json(build_agent_card(&config.agent, &config.base_url))
}

async fn create_response(
    State(config): State<ServerConfig>,
    Json(request): Json<ResponsesRequest>,
) -> Response {
    let agent_request = request.to_agent_request();
    if agent_request.stream {
        stream_response(config, agent_request).into_response()
    } else {
        Json(collect_response(config, agent_request).await).into_response()
    }
}

/// SSE frame for one wire event, with the stream-global sequence number
/// injected into the serialized JSON.
fn sse_frame(event: &ResponseStreamEvent, seq: &mut u64) -> Event {
    let mut value = serde_json::to_value(event).unwrap_or_else(|_| json!({}));
    if let Some(obj) = value.as_object_mut() {
        obj.insert("sequence_number".to_string(), json!(*seq));
    }
    *seq += 1;
    Event::default().event(event.event_type()).data(value.to_string())
}

/// Failure envelope reusing the in-flight response identity when known.
fn failed_wire_response(
    template: Option<&AgentResponse>,
    code: &str,
    message: &str,
    output: Vec<ResponseItem>,
) -> WireResponse {
    let (id, created_at) = match template {
        Some(r) => (r.id.clone(), r.created_at.timestamp()),
        None => (
            format!("resp_{}", uuid::Uuid::new_v4().simple()),
            chrono::Utc::now().timestamp(),
        ),
    };
    WireResponse {
        id,
        object: "response".to_string(),
        created_at,
        status: "failed".to_string(),
        output,
        error: Some(ResponseError {
            code: normalize_error_code(code),
            message: message.to_string(),
        }),
    }
}

fn stream_response(
    config: ServerConfig,
    agent_request: AgentRequest,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let deadline = Instant::now() + config.security.request_timeout;
    let events = config.runner.stream_query(config.agent.clone(), agent_request);
    let stream = async_stream::stream! {
        let mut adapter = ResponsesAdapter::new();
        let mut seq: u64 = 0;
        let mut last_response: Option<AgentResponse> = None;
        futures::pin_mut!(events);
        loop {
            match tokio::time::timeout_at(deadline, events.next()).await {
                Ok(Some(Ok(event))) => {
                    if let AgentEvent::Response(response) = &event {
                        last_response = Some(response.clone());
                    }
                    for wire in adapter.convert(&event) {
                        yield Ok(sse_frame(&wire, &mut seq));
                    }
                }
                Ok(Some(Err(e))) => {
                    // runner streams terminalize their own errors; raw
                    // adapter streams surface theirs here
                    let response = failed_wire_response(
                        last_response.as_ref(),
                        e.code(),
                        &e.to_string(),
                        adapter.output().to_vec(),
                    );
                    let wire = ResponseStreamEvent::Failed { response };
                    yield Ok(sse_frame(&wire, &mut seq));
                    break;
                }
                Ok(None) => break,
                Err(_) => {
                    let response = failed_wire_response(
                        last_response.as_ref(),
                        "timeout",
                        "request deadline exceeded",
                        adapter.output().to_vec(),
                    );
                    let wire = ResponseStreamEvent::Failed { response };
                    yield Ok(sse_frame(&wire, &mut seq));
                    break;
                }
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Non-streaming mode: drains the same canonical stream and returns the
/// terminal response object.
async fn collect_response(config: ServerConfig, agent_request: AgentRequest) -> WireResponse {
    let deadline = Instant::now() + config.security.request_timeout;
    let events = config.runner.stream_query(config.agent.clone(), agent_request);
    let mut adapter = ResponsesAdapter::new();
    let mut last_response: Option<AgentResponse> = None;
    let mut terminal: Option<WireResponse> = None;
    futures::pin_mut!(events);
    loop {
        match tokio::time::timeout_at(deadline, events.next()).await {
            Ok(Some(Ok(event))) => {
                if let AgentEvent::Response(response) = &event {
                    last_response = Some(response.clone());
                }
                for wire in adapter.convert(&event) {
                    match wire {
                        ResponseStreamEvent::Completed { response }
                        | ResponseStreamEvent::Failed { response } => {
                            terminal = Some(response);
                        }
                        _ => {}
                    }
                }
            }
            Ok(Some(Err(e))) => {
                terminal = Some(failed_wire_response(
                    last_response.as_ref(),
                    e.code(),
                    &e.to_string(),
                    adapter.output().to_vec(),
                ));
                break;
            }
            Ok(None) => break,
            Err(_) => {
                terminal = Some(failed_wire_response(
                    last_response.as_ref(),
                    "timeout",
                    "request deadline exceeded",
                    adapter.output().to_vec(),
                ));
                break;
            }
        }
    }
    terminal.unwrap_or_else(|| {
        failed_wire_response(
            last_response.as_ref(),
            "server_error",
            "stream ended without a terminal event",
            adapter.output().to_vec(),
        )
    })
}
