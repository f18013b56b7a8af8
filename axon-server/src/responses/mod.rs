//! OpenAI-Responses-API compatibility: request parsing, wire events, and
//! the canonical-to-wire stream converter.

pub mod adapter;
pub mod events;
pub mod request;

pub use adapter::ResponsesAdapter;
pub use events::{
    Response, ResponseError, ResponseItem, ResponsePart, ResponseStreamEvent, normalize_error_code,
};
pub use request::{ConversationRef, InputContent, InputItem, InputPart, ResponsesInput, ResponsesRequest, ResponsesTool};
