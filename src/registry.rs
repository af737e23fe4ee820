//! Registry of the agent types the concierge ships, plus the planning seams
//! that decide which of them a user turn should reach.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::messaging::{
    EndUserMessage, TravelPlan, TravelSubtask, DEFAULT_AGENT, FLIGHT_TOPIC, HOTEL_TOPIC,
};

#[derive(Debug, Clone)]
pub struct AgentInfo {
    pub agent_type: String,
    pub description: String,
    pub examples: String,
}

/// Static table of known agent types. Fixed at startup, read-only afterwards.
pub struct AgentRegistry {
    agents: Vec<AgentInfo>,
}

impl AgentRegistry {
    pub fn new(agents: Vec<AgentInfo>) -> Self {
        Self { agents }
    }

    pub fn get(&self, agent_type: &str) -> Option<&AgentInfo> {
        self.agents.iter().find(|a| a.agent_type == agent_type)
    }

    pub fn contains(&self, agent_type: &str) -> bool {
        self.get(agent_type).is_some()
    }

    /// Agent types that handle booking subtasks (everything but the default
    /// greeting agent).
    pub fn specialist_types(&self) -> Vec<String> {
        self.agents
            .iter()
            .filter(|a| a.agent_type != DEFAULT_AGENT)
            .map(|a| a.agent_type.clone())
            .collect()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new(vec![
            AgentInfo {
                agent_type: DEFAULT_AGENT.to_string(),
                description: "Handles user greetings and general travel queries that do not \
                              fit a specific booking category."
                    .to_string(),
                examples: "'Hello', 'Hi there!', 'I want to plan a trip.'".to_string(),
            },
            AgentInfo {
                agent_type: FLIGHT_TOPIC.to_string(),
                description: "Helps in providing flight information and bookings.".to_string(),
                examples: "'Book me a flight to London', 'I need flight options from LA to NYC.'"
                    .to_string(),
            },
            AgentInfo {
                agent_type: HOTEL_TOPIC.to_string(),
                description: "Helps in booking hotels and answering hotel questions.".to_string(),
                examples: "'Find me a hotel in Berlin', 'I need hotel reservations for next \
                           weekend.'"
                    .to_string(),
            },
        ])
    }
}

/// Decomposes a user turn into a travel plan: which agents run, and on what.
///
/// The production selection criterion lives in a hosted model behind this
/// seam; the shipped [`KeywordPlanner`] is a deterministic stand-in.
#[async_trait]
pub trait TravelPlanner: Send + Sync {
    async fn plan(
        &self,
        message: &EndUserMessage,
        history: &[EndUserMessage],
    ) -> Result<TravelPlan>;
}

/// Selects the agent types a composite request fans out to when no explicit
/// plan is available.
pub trait RelevantAgentSelector: Send + Sync {
    fn relevant_agents(&self, session: &str) -> Vec<String>;
}

/// Default selector: every specialist the registry knows.
pub struct RegistrySelector {
    registry: Arc<AgentRegistry>,
}

impl RegistrySelector {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }
}

impl RelevantAgentSelector for RegistrySelector {
    fn relevant_agents(&self, _session: &str) -> Vec<String> {
        self.registry.specialist_types()
    }
}

const GREETINGS: [&str; 6] = [
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
];

/// Keyword-driven planner. Intent detection by substring match; the phrase
/// heuristics are not load-bearing for the architecture and richer planners
/// can replace this one wholesale.
pub struct KeywordPlanner {
    registry: Arc<AgentRegistry>,
}

impl KeywordPlanner {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry }
    }

    fn is_greeting(text: &str) -> bool {
        let trimmed = text.trim().trim_end_matches(['!', '.', ',']).to_lowercase();
        GREETINGS.contains(&trimmed.as_str())
    }
}

#[async_trait]
impl TravelPlanner for KeywordPlanner {
    async fn plan(
        &self,
        message: &EndUserMessage,
        _history: &[EndUserMessage],
    ) -> Result<TravelPlan> {
        let content = message.content.to_lowercase();

        if Self::is_greeting(&message.content) {
            return Ok(TravelPlan::greeting(&message.content));
        }

        // The composite phrase wins over individual service mentions;
        // otherwise a "travel plan with a flight" would bounce between the
        // router and a specialist forever.
        if content.contains("travel plan") {
            let subtasks = self
                .registry
                .specialist_types()
                .into_iter()
                .map(|agent_type| TravelSubtask {
                    assigned_agent: agent_type,
                    task_details: message.content.clone(),
                })
                .collect();
            return Ok(TravelPlan::new(&message.content, subtasks));
        }

        let mut subtasks = Vec::new();
        if content.contains("flight") && self.registry.contains(FLIGHT_TOPIC) {
            subtasks.push(TravelSubtask {
                assigned_agent: FLIGHT_TOPIC.to_string(),
                task_details: message.content.clone(),
            });
        }
        if content.contains("hotel") && self.registry.contains(HOTEL_TOPIC) {
            subtasks.push(TravelSubtask {
                assigned_agent: HOTEL_TOPIC.to_string(),
                task_details: message.content.clone(),
            });
        }

        Ok(TravelPlan::new(&message.content, subtasks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> KeywordPlanner {
        KeywordPlanner::new(Arc::new(AgentRegistry::default()))
    }

    #[tokio::test]
    async fn test_greeting_detected() {
        let plan = planner()
            .plan(&EndUserMessage::new("Hello!", "user"), &[])
            .await
            .unwrap();
        assert!(plan.is_greeting);
        assert!(plan.subtasks.is_empty());
    }

    #[tokio::test]
    async fn test_single_service_yields_one_subtask() {
        let plan = planner()
            .plan(
                &EndUserMessage::new("book a flight from New York to Paris", "user"),
                &[],
            )
            .await
            .unwrap();
        assert_eq!(plan.subtasks.len(), 1);
        assert_eq!(plan.subtasks[0].assigned_agent, FLIGHT_TOPIC);
    }

    #[tokio::test]
    async fn test_composite_request_yields_both_specialists() {
        let plan = planner()
            .plan(
                &EndUserMessage::new("I need a flight and a hotel in Paris", "user"),
                &[],
            )
            .await
            .unwrap();
        assert_eq!(plan.subtasks.len(), 2);
        assert_eq!(plan.subtasks[0].assigned_agent, FLIGHT_TOPIC);
        assert_eq!(plan.subtasks[1].assigned_agent, HOTEL_TOPIC);
    }

    #[tokio::test]
    async fn test_travel_plan_phrase_fans_out_to_all_specialists() {
        let plan = planner()
            .plan(
                &EndUserMessage::new("Put together a travel plan for Rome", "user"),
                &[],
            )
            .await
            .unwrap();
        assert_eq!(plan.subtasks.len(), 2);
    }

    #[tokio::test]
    async fn test_unrelated_message_yields_empty_plan() {
        let plan = planner()
            .plan(&EndUserMessage::new("what's the meaning of life", "user"), &[])
            .await
            .unwrap();
        assert!(plan.subtasks.is_empty());
        assert!(!plan.is_greeting);
    }

    #[test]
    fn test_registry_specialists_exclude_default_agent() {
        let registry = AgentRegistry::default();
        let specialists = registry.specialist_types();
        assert_eq!(specialists, vec![FLIGHT_TOPIC, HOTEL_TOPIC]);
    }
}
