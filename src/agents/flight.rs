//! Flight specialist agent.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::booking::{simulate_flight_booking, FlightParamExtractor};
use crate::error::Result;
use crate::messaging::{
    AgentResponse, AgentStructuredResponse, EndUserMessage, FlightBooking, GroupChatMessage,
    HandoffMessage, MessageContext, MessageKind, MessagePayload, RoutedAgent, StructuredData,
    TopicId, TravelRequest, FLIGHT_TOPIC,
};

const APOLOGY: &str = "Failed to book flight. Please try again.";

pub struct FlightAgent {
    handoff_trigger: String,
    extractor: Arc<dyn FlightParamExtractor>,
}

impl FlightAgent {
    pub fn new(handoff_trigger: impl Into<String>, extractor: Arc<dyn FlightParamExtractor>) -> Self {
        Self {
            handoff_trigger: handoff_trigger.into().to_lowercase(),
            extractor,
        }
    }

    fn is_composite(&self, content: &str) -> bool {
        content.to_lowercase().contains(&self.handoff_trigger)
    }

    async fn book(&self, content: &str, ctx: &MessageContext) -> Result<FlightBooking> {
        let params = ctx
            .run_cancellable("extract flight params", self.extractor.extract(content))
            .await??;
        ctx.run_cancellable("simulate flight booking", simulate_flight_booking(&params))
            .await?
    }

    async fn handle_user_message(&self, message: EndUserMessage, ctx: &MessageContext) -> Result<()> {
        info!(session = ctx.session(), "FlightAgent received user message");

        if self.is_composite(&message.content) {
            // Composite asks belong to the router; no booking logic runs.
            ctx.publish(
                MessagePayload::HandoffMessage(HandoffMessage::new(FLIGHT_TOPIC, message.content)),
                TopicId::router(ctx.session()),
            )
            .await?;
            return Ok(());
        }

        match self.book(&message.content, ctx).await {
            Ok(booking) => {
                let summary = format!(
                    "Flight booking processed successfully for query: {}",
                    message.content
                );
                ctx.publish(
                    MessagePayload::AgentStructuredResponse(AgentStructuredResponse {
                        agent_type: FLIGHT_TOPIC.to_string(),
                        data: StructuredData::Flight(booking),
                        message: summary,
                    }),
                    TopicId::user_proxy(ctx.session()),
                )
                .await
            }
            Err(e) if e.is_user_facing() => {
                warn!(session = ctx.session(), error = %e, "Flight booking failed");
                ctx.publish(
                    MessagePayload::AgentResponse(AgentResponse::new(FLIGHT_TOPIC, APOLOGY)),
                    TopicId::user_proxy(ctx.session()),
                )
                .await
            }
            Err(e) => Err(e),
        }
    }

    async fn handle_travel_request(
        &self,
        request: TravelRequest,
        ctx: &MessageContext,
    ) -> Result<GroupChatMessage> {
        info!(
            session = ctx.session(),
            task = %request.content,
            "FlightAgent received travel request sub-task"
        );

        match self.book(&request.content, ctx).await {
            Ok(booking) => Ok(GroupChatMessage::new(
                FLIGHT_TOPIC,
                format!(
                    "Flight booked: {} {} from {} to {}, {} to {}, {} passenger(s), total ${} (ref {})",
                    booking.airline,
                    booking.flight_number,
                    booking.departure_city,
                    booking.destination_city,
                    booking.departure_date,
                    booking.return_date,
                    booking.number_of_passengers,
                    booking.total_price,
                    booking.booking_reference
                ),
            )),
            Err(e) if e.is_user_facing() => {
                // The coordinator's barrier expects a reply; degrade instead
                // of failing the request.
                warn!(session = ctx.session(), error = %e, "Flight sub-task failed");
                Ok(GroupChatMessage::new(FLIGHT_TOPIC, APOLOGY))
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl RoutedAgent for FlightAgent {
    fn agent_type(&self) -> &str {
        FLIGHT_TOPIC
    }

    fn subscribed_kinds(&self) -> &[MessageKind] {
        &[MessageKind::EndUserMessage, MessageKind::TravelRequest]
    }

    async fn handle(
        &self,
        payload: MessagePayload,
        ctx: &MessageContext,
    ) -> Result<Option<GroupChatMessage>> {
        match payload {
            MessagePayload::EndUserMessage(message) => {
                self.handle_user_message(message, ctx).await?;
                Ok(None)
            }
            MessagePayload::TravelRequest(request) => {
                Ok(Some(self.handle_travel_request(request, ctx).await?))
            }
            _ => Ok(None),
        }
    }
}
