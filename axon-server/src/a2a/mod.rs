//! A2A protocol adapter: wire types, pure canonical ↔ A2A conversions, and
//! the agent discovery card.

pub mod agent_card;
pub mod events;
pub mod types;

pub use agent_card::build_agent_card;
pub use events::{
    a2a_to_message, content_to_part, message_to_a2a, message_to_artifact_update, part_to_content,
    response_to_status_update, response_to_task, run_status_to_task_state, status_to_task_state,
};
pub use types::{
    A2aMessage, A2aRole, AgentCapabilities, AgentCard, AgentSkill, Artifact, FileContent, Part,
    Task, TaskArtifactUpdateEvent, TaskState, TaskStatus, TaskStatusUpdateEvent,
};
