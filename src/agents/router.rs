//! Semantic router: decides which agents a user turn should reach.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::messaging::{
    AgentStructuredResponse, EndUserMessage, Greeter, GroupChatMessage, HandoffMessage,
    MessageContext, MessageKind, MessagePayload, RoutedAgent, StructuredData, TopicId,
    DEFAULT_AGENT, ROUTER_TOPIC,
};
use crate::registry::TravelPlanner;
use crate::session::SessionStateManager;

const GREETING: &str = "Greetings, adventurer! Ready to embark on your next journey? \
                        Tell me where you want to go and I will take care of flights and hotels.";

pub struct RouterAgent {
    planner: Arc<dyn TravelPlanner>,
    sessions: Arc<SessionStateManager>,
}

impl RouterAgent {
    pub fn new(planner: Arc<dyn TravelPlanner>, sessions: Arc<SessionStateManager>) -> Self {
        Self { planner, sessions }
    }

    async fn route_message(&self, message: EndUserMessage, ctx: &MessageContext) -> Result<()> {
        let session = ctx.session();
        self.sessions.add_to_history(session, message.clone());
        let history = self.sessions.history(session);

        let plan = match self
            .planner
            .plan(&message, &history[..history.len().saturating_sub(1)])
            .await
        {
            Ok(plan) => plan,
            Err(e) => {
                warn!(session, error = %e, "Planner failed, message dropped");
                return Ok(());
            }
        };

        if plan.is_greeting {
            info!(session, "User greeting detected");
            return ctx
                .publish(
                    MessagePayload::AgentStructuredResponse(AgentStructuredResponse {
                        agent_type: DEFAULT_AGENT.to_string(),
                        data: StructuredData::Greeter(Greeter {
                            greeting: GREETING.to_string(),
                        }),
                        message: format!("User greeting detected: {}", message.content),
                    }),
                    TopicId::user_proxy(session),
                )
                .await;
        }

        if plan.subtasks.is_empty() {
            info!(session, "No agents selected for routing");
            return Ok(());
        }

        if plan.subtasks.len() == 1 {
            let assigned = &plan.subtasks[0].assigned_agent;
            info!(session, agent = %assigned, "Routing message directly");
            return ctx
                .publish(
                    MessagePayload::EndUserMessage(message),
                    TopicId::new(assigned.clone(), session),
                )
                .await;
        }

        info!(
            session,
            subtasks = plan.subtasks.len(),
            "Routing composite request to group chat coordination"
        );
        ctx.publish(MessagePayload::TravelPlan(plan), TopicId::group_chat(session))
            .await
    }

    async fn handle_handoff(&self, message: HandoffMessage, ctx: &MessageContext) -> Result<()> {
        let session = ctx.session();
        info!(session, from = %message.source, "Received handoff message");

        // Only the explicit completion flag ends the conversation. The user's
        // own words must never be mistaken for a protocol signal.
        if message.complete {
            self.sessions.clear_session(session);
            return Ok(());
        }

        // Session identity is preserved: the redirected turn re-enters
        // planning under the same session key.
        self.route_message(EndUserMessage::new(message.content, message.source), ctx)
            .await
    }
}

#[async_trait]
impl RoutedAgent for RouterAgent {
    fn agent_type(&self) -> &str {
        ROUTER_TOPIC
    }

    fn subscribed_kinds(&self) -> &[MessageKind] {
        &[MessageKind::EndUserMessage, MessageKind::HandoffMessage]
    }

    async fn handle(
        &self,
        payload: MessagePayload,
        ctx: &MessageContext,
    ) -> Result<Option<GroupChatMessage>> {
        match payload {
            MessagePayload::EndUserMessage(message) => {
                self.route_message(message, ctx).await?;
            }
            MessagePayload::HandoffMessage(message) => {
                self.handle_handoff(message, ctx).await?;
            }
            _ => {}
        }
        Ok(None)
    }
}
