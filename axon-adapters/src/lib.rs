//! # axon-adapters
//!
//! Framework stream adapters for the Axon agent runtime.
//!
//! Each adapter consumes one framework's native streaming shape and emits
//! the canonical [`axon_core::AgentEvent`] stream, so nothing downstream of
//! this crate ever sees a framework-native type:
//!
//! - [`agentscope::adapt_agentscope`] - full-accumulated-text ticks with
//!   content blocks
//! - [`agno::adapt_agno`] - discrete run events with true text deltas
//! - [`autogen::adapt_autogen`] - streaming chunks plus complete agent
//!   event envelopes
//! - [`text::adapt_text`] - plain text fragments
//!
//! All adapters share the same guarantees: message and content lifecycles
//! are well-nested (a message's contents complete before the message does,
//! and no two messages are in progress at once), re-sent upstream data is
//! deduplicated, and a source error finalizes everything built so far
//! before propagating.
//!
//! [`bridge::bridge`] connects callback-style producers to these adapters.

pub mod agentscope;
pub mod agno;
pub mod autogen;
pub mod bridge;
pub mod text;
pub mod tracker;

pub use agentscope::{AgentScopeBlock, AgentScopeChunk, AgentScopeMessage, adapt_agentscope};
pub use agno::{AgnoEvent, AgnoToolCall, adapt_agno};
pub use autogen::{AutogenEvent, AutogenFunctionCall, AutogenFunctionResult, adapt_autogen};
pub use bridge::{BridgeSender, bridge};
pub use text::adapt_text;
pub use tracker::{CallRegistry, PrefixTracker};
