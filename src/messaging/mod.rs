//! Topic-routed messaging between agents.
//!
//! ```text
//! ┌────────────┐  publish(topic)  ┌────────────────┐  per-instance  ┌────────────┐
//! │  Agent A   │─────────────────▶│   MessageBus   │───queue───────▶│  Agent B   │
//! └────────────┘                  │ (topic lookup) │                └────────────┘
//!                                 └────────────────┘
//!        directed request/reply: request(payload, AgentId) ⇄ GroupChatMessage
//! ```

mod bus;
mod handler;
mod message;

pub use bus::{BusBuilder, MessageBus, DEFAULT_QUEUE_CAPACITY};
pub use handler::{AgentFactory, BoxedAgent, MessageContext, RoutedAgent};
pub use message::{
    AgentId, AgentResponse, AgentStructuredResponse, EndUserMessage, Envelope, FlightBooking,
    Greeter, GroupChatMessage, HandoffMessage, HotelBooking, MessageKind, MessagePayload,
    StructuredData, TopicId, TravelPlan, TravelRequest, TravelSubtask, DEFAULT_AGENT,
    FLIGHT_TOPIC, GROUP_CHAT_TOPIC, HOTEL_TOPIC, ROUTER_TOPIC, USER_PROXY_TOPIC,
};
