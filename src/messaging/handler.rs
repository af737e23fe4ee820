//! Agent-side handler contract and the per-invocation message context.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::bus::MessageBus;
use super::message::{AgentId, GroupChatMessage, MessageKind, MessagePayload, TopicId};
use crate::error::{ConciergeError, Result};

/// Context handed to every handler invocation.
///
/// Exposes the originating topic, a cancellation signal scoped to this
/// invocation, and the bus for publishing outgoing envelopes.
pub struct MessageContext {
    topic: TopicId,
    cancellation: CancellationToken,
    bus: MessageBus,
}

impl MessageContext {
    pub(crate) fn new(topic: TopicId, cancellation: CancellationToken, bus: MessageBus) -> Self {
        Self {
            topic,
            cancellation,
            bus,
        }
    }

    pub fn topic(&self) -> &TopicId {
        &self.topic
    }

    /// Session key of the conversation this invocation belongs to.
    pub fn session(&self) -> &str {
        &self.topic.source
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    pub async fn publish(&self, payload: MessagePayload, topic: TopicId) -> Result<()> {
        self.bus.publish(payload, topic).await
    }

    /// Run a collaborator call, aborting it if this invocation is cancelled.
    ///
    /// Cancellation is scoped to the invocation: siblings for other sessions
    /// are unaffected.
    pub async fn run_cancellable<T>(
        &self,
        label: &str,
        fut: impl Future<Output = T> + Send,
    ) -> Result<T> {
        tokio::select! {
            _ = self.cancellation.cancelled() => {
                Err(ConciergeError::Cancelled(label.to_string()))
            }
            value = fut => Ok(value),
        }
    }
}

/// A polymorphic handler set keyed by message kind.
///
/// Agents declare the kinds they react to via [`subscribed_kinds`]; envelopes
/// of any other kind are ignored by the runtime without error. A handler may
/// publish envelopes through the context, return a [`GroupChatMessage`]
/// directly (the reply a directed request awaits), or both.
///
/// [`subscribed_kinds`]: RoutedAgent::subscribed_kinds
#[async_trait]
pub trait RoutedAgent: Send + Sync {
    fn agent_type(&self) -> &str;

    /// Message kinds this agent declares a handler for.
    fn subscribed_kinds(&self) -> &[MessageKind];

    async fn handle(
        &self,
        payload: MessagePayload,
        ctx: &MessageContext,
    ) -> Result<Option<GroupChatMessage>>;

    fn should_handle(&self, kind: MessageKind) -> bool {
        self.subscribed_kinds().contains(&kind)
    }
}

pub type BoxedAgent = Arc<dyn RoutedAgent>;

/// Creates one agent instance for a given address. Instances are created
/// lazily on the first envelope delivered for their session key.
pub type AgentFactory = Arc<dyn Fn(AgentId) -> BoxedAgent + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::message::EndUserMessage;

    struct EchoAgent {
        kinds: Vec<MessageKind>,
    }

    #[async_trait]
    impl RoutedAgent for EchoAgent {
        fn agent_type(&self) -> &str {
            "echo"
        }

        fn subscribed_kinds(&self) -> &[MessageKind] {
            &self.kinds
        }

        async fn handle(
            &self,
            _payload: MessagePayload,
            _ctx: &MessageContext,
        ) -> Result<Option<GroupChatMessage>> {
            Ok(None)
        }
    }

    #[test]
    fn test_kind_filtering() {
        let agent = EchoAgent {
            kinds: vec![MessageKind::EndUserMessage, MessageKind::TravelRequest],
        };

        assert!(agent.should_handle(MessageKind::EndUserMessage));
        assert!(agent.should_handle(MessageKind::TravelRequest));
        assert!(!agent.should_handle(MessageKind::TravelPlan));
        assert!(!agent.should_handle(MessageKind::HandoffMessage));
    }

    #[test]
    fn test_payload_kind_matches_filter() {
        let agent = EchoAgent {
            kinds: vec![MessageKind::EndUserMessage],
        };
        let payload = MessagePayload::EndUserMessage(EndUserMessage::new("hi", "user"));
        assert!(agent.should_handle(payload.kind()));
    }
}
