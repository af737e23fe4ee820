//! Hotel specialist agent.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::booking::{simulate_hotel_booking, HotelParamExtractor};
use crate::error::Result;
use crate::messaging::{
    AgentResponse, AgentStructuredResponse, EndUserMessage, GroupChatMessage, HandoffMessage,
    HotelBooking, MessageContext, MessageKind, MessagePayload, RoutedAgent, StructuredData,
    TopicId, TravelRequest, HOTEL_TOPIC,
};

const APOLOGY: &str = "Failed to book hotel. Please try again.";

pub struct HotelAgent {
    handoff_trigger: String,
    extractor: Arc<dyn HotelParamExtractor>,
}

impl HotelAgent {
    pub fn new(handoff_trigger: impl Into<String>, extractor: Arc<dyn HotelParamExtractor>) -> Self {
        Self {
            handoff_trigger: handoff_trigger.into().to_lowercase(),
            extractor,
        }
    }

    fn is_composite(&self, content: &str) -> bool {
        content.to_lowercase().contains(&self.handoff_trigger)
    }

    async fn book(&self, content: &str, ctx: &MessageContext) -> Result<HotelBooking> {
        let params = ctx
            .run_cancellable("extract hotel params", self.extractor.extract(content))
            .await??;
        ctx.run_cancellable("simulate hotel booking", simulate_hotel_booking(&params))
            .await?
    }

    async fn handle_user_message(&self, message: EndUserMessage, ctx: &MessageContext) -> Result<()> {
        info!(session = ctx.session(), "HotelAgent received user message");

        if self.is_composite(&message.content) {
            // Cannot handle composite travel plans; hand back to the router.
            ctx.publish(
                MessagePayload::HandoffMessage(HandoffMessage::new(HOTEL_TOPIC, message.content)),
                TopicId::router(ctx.session()),
            )
            .await?;
            return Ok(());
        }

        match self.book(&message.content, ctx).await {
            Ok(booking) => {
                let summary = format!(
                    "Hotel booking processed successfully for query: {}",
                    message.content
                );
                ctx.publish(
                    MessagePayload::AgentStructuredResponse(AgentStructuredResponse {
                        agent_type: HOTEL_TOPIC.to_string(),
                        data: StructuredData::Hotel(booking),
                        message: summary,
                    }),
                    TopicId::user_proxy(ctx.session()),
                )
                .await
            }
            Err(e) if e.is_user_facing() => {
                warn!(session = ctx.session(), error = %e, "Hotel booking failed");
                ctx.publish(
                    MessagePayload::AgentResponse(AgentResponse::new(HOTEL_TOPIC, APOLOGY)),
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
            "HotelAgent received travel request sub-task"
        );

        match self.book(&request.content, ctx).await {
            Ok(booking) => Ok(GroupChatMessage::new(
                HOTEL_TOPIC,
                format!(
                    "Hotel booked: {} ({}) in {}, {} to {}, total ${} (ref {})",
                    booking.hotel_name,
                    booking.room_type,
                    booking.city,
                    booking.check_in_date,
                    booking.check_out_date,
                    booking.total_price,
                    booking.booking_reference
                ),
            )),
            Err(e) if e.is_user_facing() => {
                warn!(session = ctx.session(), error = %e, "Hotel sub-task failed");
                Ok(GroupChatMessage::new(HOTEL_TOPIC, APOLOGY))
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl RoutedAgent for HotelAgent {
    fn agent_type(&self) -> &str {
        HOTEL_TOPIC
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
