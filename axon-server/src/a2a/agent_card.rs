//! Agent card construction for `/.well-known/agent.json`.

use super::types::{AgentCapabilities, AgentCard, AgentSkill};
use axon_runner::SharedAgent;

const DEFAULT_MODES: &[&str] = &["text"];

/// Builds the discovery card for one served agent.
pub fn build_agent_card(agent: &SharedAgent, base_url: &str) -> AgentCard {
    AgentCard {
        name: agent.name().to_string(),
        description: agent.description().to_string(),
        url: base_url.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        capabilities: AgentCapabilities {
            streaming: true,
            push_notifications: false,
            state_transition_history: false,
        },
        default_input_modes: DEFAULT_MODES.iter().map(|m| m.to_string()).collect(),
        default_output_modes: DEFAULT_MODES.iter().map(|m| m.to_string()).collect(),
        skills: vec![AgentSkill {
            id: format!("{}-chat", agent.name()),
            name: agent.name().to_string(),
            description: Some(agent.description().to_string()),
            tags: vec!["chat".to_string()],
            examples: Vec::new(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axon_core::{AgentRequest, EventStream, Result};
    use axon_runner::Agent;
    use std::sync::Arc;

    struct CardAgent;

    #[async_trait]
    impl Agent for CardAgent {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "echoes input"
        }

        async fn stream(&self, _request: AgentRequest) -> Result<EventStream> {
            Ok(Box::pin(futures::stream::empty()))
        }
    }

    #[test]
    fn test_card_shape() {
        let agent: SharedAgent = Arc::new(CardAgent);
        let card = build_agent_card(&agent, "https://agents.example.com");
        assert_eq!(card.name, "echo");
        assert_eq!(card.url, "https://agents.example.com");
        assert!(card.capabilities.streaming);
        assert_eq!(card.skills.len(), 1);
        assert_eq!(card.skills[0].id, "echo-chat");

        let v = serde_json::to_value(&card).unwrap();
        assert!(v["defaultInputModes"].is_array());
    }
}
