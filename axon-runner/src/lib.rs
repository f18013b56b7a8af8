//! # axon-runner
//!
//! Invocation runner for the Axon agent runtime: wraps an [`Agent`]'s
//! canonical event stream in a response envelope with a guaranteed terminal
//! marker, and persists conversation history through the session service.

pub mod runner;
pub mod services;

pub use runner::Runner;
pub use services::{
    Agent, InMemorySessionService, MemoryService, SessionService, SharedAgent,
};
