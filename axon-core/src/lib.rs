//! # axon-core
//!
//! Canonical event model and builders for the Axon agent runtime.
//!
//! ## Overview
//!
//! This crate provides the foundational types the rest of the workspace is
//! built on:
//!
//! - [`Message`] / [`Content`] - the canonical tagged-union event model
//! - [`AgentResponse`] / [`AgentEvent`] - the per-invocation envelope and
//!   the event sum type streamed to callers
//! - [`ResponseBuilder`] / [`MessageBuilder`] / [`ContentBuilder`] - the
//!   single place where well-formed, consistently indexed events are
//!   assembled
//! - [`AgentRequest`] - the protocol-neutral invocation input
//! - [`AxonError`] / [`Result`] - unified error handling
//!
//! Framework adapters consume upstream streams and emit [`AgentEvent`]s;
//! protocol adapters consume [`AgentEvent`]s and emit wire events. Nothing
//! outside the adapter crates ever sees a framework-native type.

pub mod builder;
pub mod error;
pub mod message;
pub mod request;
pub mod response;

pub use builder::{ContentBuilder, ContentKind, MessageBuilder, ResponseBuilder, merge_map, merge_value};
pub use error::{AxonError, Result};
pub use message::{Content, ContentPart, Message, MessageType, Role, RunStatus};
pub use request::AgentRequest;
pub use response::{AgentEvent, AgentResponse, ErrorDetail, EventStream};
