//! Wires the agent roster onto the bus and exposes the inbound edge.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::agents::{
    ChannelSink, FlightAgent, GroupChatManager, HotelAgent, ResponseSink, RouterAgent,
    UserProxyAgent, UserReply,
};
use crate::booking::RuleBasedExtractor;
use crate::config::ConciergeConfig;
use crate::error::Result;
use crate::messaging::{
    BoxedAgent, EndUserMessage, MessageBus, MessagePayload, TopicId, FLIGHT_TOPIC,
    GROUP_CHAT_TOPIC, HOTEL_TOPIC, ROUTER_TOPIC, USER_PROXY_TOPIC,
};
use crate::registry::{AgentRegistry, KeywordPlanner, RegistrySelector};
use crate::session::SessionStateManager;

/// Assembled travel concierge: one bus carrying the full agent roster.
///
/// Construction registers a factory per agent type; instances are created
/// lazily on first traffic for each session key.
pub struct TravelOrchestrator {
    bus: MessageBus,
    sessions: Arc<SessionStateManager>,
}

impl TravelOrchestrator {
    pub fn new(config: &ConciergeConfig, sink: Arc<dyn ResponseSink>) -> Self {
        let registry = Arc::new(AgentRegistry::default());
        let planner = Arc::new(KeywordPlanner::new(registry.clone()));
        let selector = Arc::new(RegistrySelector::new(registry));
        let extractor = Arc::new(RuleBasedExtractor::new());
        let sessions = Arc::new(SessionStateManager::new(config.router.history_limit));
        let barrier_timeout = config.coordinator.barrier_timeout();
        let handoff_trigger = config.router.handoff_trigger.clone();

        let router_sessions = sessions.clone();
        let flight_trigger = handoff_trigger.clone();
        let flight_extractor = extractor.clone();
        let hotel_extractor = extractor;

        let bus = MessageBus::builder()
            .queue_capacity(config.bus.queue_capacity)
            .register(ROUTER_TOPIC, move |_id| {
                Arc::new(RouterAgent::new(planner.clone(), router_sessions.clone())) as BoxedAgent
            })
            .register(GROUP_CHAT_TOPIC, move |id| {
                Arc::new(GroupChatManager::new(
                    id.key,
                    barrier_timeout,
                    selector.clone(),
                )) as BoxedAgent
            })
            .register(FLIGHT_TOPIC, move |_id| {
                Arc::new(FlightAgent::new(
                    flight_trigger.clone(),
                    flight_extractor.clone(),
                )) as BoxedAgent
            })
            .register(HOTEL_TOPIC, move |_id| {
                Arc::new(HotelAgent::new(
                    handoff_trigger.clone(),
                    hotel_extractor.clone(),
                )) as BoxedAgent
            })
            .register(USER_PROXY_TOPIC, move |_id| {
                Arc::new(UserProxyAgent::new(sink.clone())) as BoxedAgent
            })
            .subscribe(ROUTER_TOPIC, ROUTER_TOPIC)
            .subscribe(GROUP_CHAT_TOPIC, GROUP_CHAT_TOPIC)
            .subscribe(FLIGHT_TOPIC, FLIGHT_TOPIC)
            .subscribe(HOTEL_TOPIC, HOTEL_TOPIC)
            .subscribe(USER_PROXY_TOPIC, USER_PROXY_TOPIC)
            .build();

        info!("Travel orchestrator assembled");
        Self { bus, sessions }
    }

    /// Convenience constructor for hosts that consume replies in-process.
    pub fn with_channel(
        config: &ConciergeConfig,
    ) -> (Self, mpsc::UnboundedReceiver<UserReply>) {
        let (sink, rx) = ChannelSink::new();
        (Self::new(config, Arc::new(sink)), rx)
    }

    /// Inject one user turn into the system under `session`.
    pub async fn submit_user_message(
        &self,
        session: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<()> {
        let session = session.into();
        self.bus
            .publish(
                MessagePayload::EndUserMessage(EndUserMessage::new(content, "user")),
                TopicId::router(session),
            )
            .await
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Drop all per-session agent instances and conversation history.
    pub fn retire_session(&self, session: &str) {
        self.bus.retire_session(session);
        self.sessions.clear_session(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_orchestrator_creates_instances_lazily() {
        let config = ConciergeConfig::default();
        let (orchestrator, _rx) = TravelOrchestrator::with_channel(&config);
        assert_eq!(orchestrator.bus().instance_count(), 0);

        orchestrator
            .submit_user_message("sess-1", "Hello!")
            .await
            .unwrap();
        // The router instance is created synchronously at publish time.
        assert!(orchestrator.bus().instance_count() >= 1);
    }
}
