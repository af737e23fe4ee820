//! User proxy: the outbound edge where agent replies leave the bus.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::Result;
use crate::messaging::{
    AgentResponse, AgentStructuredResponse, GroupChatMessage, MessageContext, MessageKind,
    MessagePayload, RoutedAgent, USER_PROXY_TOPIC,
};

/// A reply ready for delivery to the end user.
#[derive(Debug, Clone)]
pub enum UserReply {
    Text {
        session: String,
        source: String,
        content: String,
    },
    Structured {
        session: String,
        response: AgentStructuredResponse,
    },
}

impl UserReply {
    pub fn session(&self) -> &str {
        match self {
            Self::Text { session, .. } | Self::Structured { session, .. } => session,
        }
    }

    /// Plain-text rendering regardless of variant.
    pub fn content(&self) -> &str {
        match self {
            Self::Text { content, .. } => content,
            Self::Structured { response, .. } => &response.message,
        }
    }
}

/// Delivery seam between the bus and whatever transport faces the user.
/// Production deployments back this with a websocket or HTTP push channel.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    async fn deliver(&self, reply: UserReply) -> Result<()>;
}

/// Sink that forwards replies over an in-process channel. Used by the
/// orchestrator's default wiring and by tests.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<UserReply>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UserReply>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ResponseSink for ChannelSink {
    async fn deliver(&self, reply: UserReply) -> Result<()> {
        if self.tx.send(reply).is_err() {
            warn!("User reply receiver dropped, reply discarded");
        }
        Ok(())
    }
}

pub struct UserProxyAgent {
    sink: Arc<dyn ResponseSink>,
}

impl UserProxyAgent {
    pub fn new(sink: Arc<dyn ResponseSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl RoutedAgent for UserProxyAgent {
    fn agent_type(&self) -> &str {
        USER_PROXY_TOPIC
    }

    fn subscribed_kinds(&self) -> &[MessageKind] {
        &[
            MessageKind::AgentResponse,
            MessageKind::AgentStructuredResponse,
        ]
    }

    async fn handle(
        &self,
        payload: MessagePayload,
        ctx: &MessageContext,
    ) -> Result<Option<GroupChatMessage>> {
        let session = ctx.session().to_string();
        match payload {
            MessagePayload::AgentResponse(AgentResponse { source, content }) => {
                info!(session = %session, from = %source, "Delivering agent response to user");
                self.sink
                    .deliver(UserReply::Text {
                        session,
                        source,
                        content,
                    })
                    .await?;
            }
            MessagePayload::AgentStructuredResponse(response) => {
                info!(
                    session = %session,
                    from = %response.agent_type,
                    "Delivering structured response to user"
                );
                self.sink
                    .deliver(UserReply::Structured { session, response })
                    .await?;
            }
            _ => {}
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{Greeter, StructuredData};

    #[test]
    fn test_reply_accessors() {
        let text = UserReply::Text {
            session: "sess-1".to_string(),
            source: "group_chat_manager".to_string(),
            content: "your plan".to_string(),
        };
        assert_eq!(text.session(), "sess-1");
        assert_eq!(text.content(), "your plan");

        let structured = UserReply::Structured {
            session: "sess-2".to_string(),
            response: AgentStructuredResponse {
                agent_type: "default_agent".to_string(),
                data: StructuredData::Greeter(Greeter {
                    greeting: "hello".to_string(),
                }),
                message: "User greeting detected".to_string(),
            },
        };
        assert_eq!(structured.session(), "sess-2");
        assert_eq!(structured.content(), "User greeting detected");
    }

    #[tokio::test]
    async fn test_channel_sink_forwards_replies() {
        let (sink, mut rx) = ChannelSink::new();
        sink.deliver(UserReply::Text {
            session: "sess-1".to_string(),
            source: "flight_booking".to_string(),
            content: "booked".to_string(),
        })
        .await
        .unwrap();

        let reply = rx.recv().await.unwrap();
        assert_eq!(reply.content(), "booked");
    }

    #[tokio::test]
    async fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        let result = sink
            .deliver(UserReply::Text {
                session: "sess-1".to_string(),
                source: "flight_booking".to_string(),
                content: "booked".to_string(),
            })
            .await;
        assert!(result.is_ok());
    }
}
