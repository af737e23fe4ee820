//! Group-chat coordinator: fans a composite request out to specialists and
//! reassembles their replies into one answer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{ConciergeError, Result};
use crate::messaging::{
    AgentId, AgentResponse, EndUserMessage, GroupChatMessage, MessageContext, MessageKind,
    MessagePayload, RoutedAgent, TopicId, TravelPlan, TravelRequest, GROUP_CHAT_TOPIC,
};
use crate::registry::RelevantAgentSelector;

/// Per-session coordination phases. `Complete` is terminal: any further
/// message for the session is a protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    AwaitingRequest,
    FannedOut,
    Compiling,
    Complete,
}

struct GroupSession {
    phase: SessionPhase,
    chat_history: Vec<GroupChatMessage>,
    /// Replies accumulated outside the barrier path, in arrival order.
    responses: Vec<GroupChatMessage>,
}

impl GroupSession {
    fn new() -> Self {
        Self {
            phase: SessionPhase::AwaitingRequest,
            chat_history: Vec::new(),
            responses: Vec::new(),
        }
    }
}

/// One coordinator instance exists per session key, so this state record is
/// isolated by construction of addressing.
pub struct GroupChatManager {
    session: String,
    barrier_timeout: Duration,
    selector: Arc<dyn RelevantAgentSelector>,
    state: Mutex<GroupSession>,
}

impl GroupChatManager {
    pub fn new(
        session: impl Into<String>,
        barrier_timeout: Duration,
        selector: Arc<dyn RelevantAgentSelector>,
    ) -> Self {
        Self {
            session: session.into(),
            barrier_timeout,
            selector,
            state: Mutex::new(GroupSession::new()),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    fn reject_if_complete(&self, kind: MessageKind) -> Result<()> {
        if self.state.lock().phase == SessionPhase::Complete {
            return Err(ConciergeError::ProtocolViolation {
                session: self.session.clone(),
                detail: format!("{kind:?} received after session completion"),
            });
        }
        Ok(())
    }

    /// Broadcast a directed ask to every agent type the upstream planner
    /// considers relevant. Replies flow back as `GroupChatMessage`s and are
    /// accumulated for the early-completion path.
    async fn request_relevant_agents(
        &self,
        message: &EndUserMessage,
        ctx: &MessageContext,
    ) -> Result<()> {
        let relevant = self.selector.relevant_agents(&self.session);
        info!(
            session = %self.session,
            agents = relevant.len(),
            "Requesting relevant agents for the travel plan"
        );
        for agent_type in relevant {
            let request =
                TravelRequest::new(GROUP_CHAT_TOPIC, "Provide details for the travel plan")
                    .with_requirement("task", message.content.clone());
            ctx.publish(
                MessagePayload::TravelRequest(request),
                TopicId::new(agent_type, &self.session),
            )
            .await?;
        }
        Ok(())
    }

    /// Fan-out/fan-in barrier. Sub-requests run concurrently; the compiled
    /// reply preserves subtask order regardless of completion order. Each
    /// sub-request is bounded by the barrier timeout and a timed-out slot
    /// degrades to a placeholder line instead of hanging the coordinator.
    async fn handle_travel_plan(&self, plan: TravelPlan, ctx: &MessageContext) -> Result<()> {
        info!(
            session = %self.session,
            subtasks = plan.subtasks.len(),
            "Coordinator received composite travel request"
        );
        self.state.lock().phase = SessionPhase::FannedOut;

        let requests = plan.subtasks.iter().map(|subtask| {
            let request = TravelRequest::new(GROUP_CHAT_TOPIC, subtask.task_details.clone())
                .with_original_task(plan.main_task.clone());
            ctx.bus().request(
                MessagePayload::TravelRequest(request),
                AgentId::new(subtask.assigned_agent.clone(), &self.session),
                self.barrier_timeout,
            )
        });
        let results = join_all(requests).await;

        self.state.lock().phase = SessionPhase::Compiling;

        let mut lines = Vec::with_capacity(results.len());
        for (subtask, result) in plan.subtasks.iter().zip(results) {
            match result {
                Ok(reply) => {
                    self.state.lock().chat_history.push(reply.clone());
                    lines.push(reply.content);
                }
                Err(ConciergeError::Timeout(_)) => {
                    warn!(
                        session = %self.session,
                        agent = %subtask.assigned_agent,
                        "Sub-request timed out, compiling partial plan"
                    );
                    lines.push(format!(
                        "No response from {} (request timed out).",
                        subtask.assigned_agent
                    ));
                }
                Err(e) => {
                    warn!(
                        session = %self.session,
                        agent = %subtask.assigned_agent,
                        error = %e,
                        "Sub-request failed, compiling partial plan"
                    );
                    lines.push(format!("No response from {}.", subtask.assigned_agent));
                }
            }
        }

        let final_plan = format!(
            "Here is your comprehensive travel plan:\n{}",
            lines.join("\n")
        );
        ctx.publish(
            MessagePayload::AgentResponse(AgentResponse::new(GROUP_CHAT_TOPIC, final_plan)),
            TopicId::user_proxy(&self.session),
        )
        .await?;

        self.state.lock().phase = SessionPhase::Complete;
        Ok(())
    }

    /// Secondary completion path: an agent signalled it is done early.
    /// Finalize with whatever responses have accumulated so far.
    async fn handle_handoff(&self, request: TravelRequest, ctx: &MessageContext) -> Result<()> {
        if request.complete {
            info!(session = %self.session, "Conversation completed, session finalized");
            self.state.lock().phase = SessionPhase::Complete;
            return Ok(());
        }
        self.compile_final_plan(ctx).await
    }

    async fn compile_final_plan(&self, ctx: &MessageContext) -> Result<()> {
        let lines: Vec<String> = {
            let state = self.state.lock();
            state
                .responses
                .iter()
                .map(|reply| reply.content.clone())
                .collect()
        };
        let final_plan = format!(
            "Here is your comprehensive travel plan:\n{}",
            lines.join("\n")
        );
        ctx.publish(
            MessagePayload::AgentResponse(AgentResponse::new(GROUP_CHAT_TOPIC, final_plan)),
            TopicId::user_proxy(&self.session),
        )
        .await?;
        self.state.lock().phase = SessionPhase::Complete;
        Ok(())
    }

    fn record_group_message(&self, message: GroupChatMessage) {
        let mut state = self.state.lock();
        state.chat_history.push(message.clone());
        state.responses.push(message);
    }
}

#[async_trait]
impl RoutedAgent for GroupChatManager {
    fn agent_type(&self) -> &str {
        GROUP_CHAT_TOPIC
    }

    fn subscribed_kinds(&self) -> &[MessageKind] {
        &[
            MessageKind::EndUserMessage,
            MessageKind::TravelPlan,
            MessageKind::TravelRequest,
            MessageKind::GroupChatMessage,
        ]
    }

    async fn handle(
        &self,
        payload: MessagePayload,
        ctx: &MessageContext,
    ) -> Result<Option<GroupChatMessage>> {
        self.reject_if_complete(payload.kind())?;

        match payload {
            MessagePayload::EndUserMessage(message) => {
                info!(session = %self.session, content = %message.content, "Coordinator received travel request");
                self.request_relevant_agents(&message, ctx).await?;
            }
            MessagePayload::TravelPlan(plan) => {
                self.handle_travel_plan(plan, ctx).await?;
            }
            MessagePayload::TravelRequest(request) => {
                self.handle_handoff(request, ctx).await?;
            }
            MessagePayload::GroupChatMessage(message) => {
                self.record_group_message(message);
            }
            _ => {}
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AgentRegistry, RegistrySelector};

    fn manager() -> GroupChatManager {
        GroupChatManager::new(
            "sess-1",
            Duration::from_secs(1),
            Arc::new(RegistrySelector::new(Arc::new(AgentRegistry::default()))),
        )
    }

    #[test]
    fn test_initial_phase() {
        assert_eq!(manager().phase(), SessionPhase::AwaitingRequest);
    }

    #[test]
    fn test_complete_is_terminal() {
        let coordinator = manager();
        coordinator.state.lock().phase = SessionPhase::Complete;

        let result = coordinator.reject_if_complete(MessageKind::EndUserMessage);
        assert!(matches!(
            result,
            Err(ConciergeError::ProtocolViolation { .. })
        ));
    }

    #[test]
    fn test_group_messages_accumulate_in_arrival_order() {
        let coordinator = manager();
        coordinator.record_group_message(GroupChatMessage::new("hotel_booking", "hotel ok"));
        coordinator.record_group_message(GroupChatMessage::new("flight_booking", "flight ok"));

        let state = coordinator.state.lock();
        assert_eq!(state.responses.len(), 2);
        assert_eq!(state.responses[0].source, "hotel_booking");
        assert_eq!(state.chat_history.len(), 2);
    }
}
