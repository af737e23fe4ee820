//! Multi-agent travel concierge core.
//!
//! A topic-based message bus carries user turns through a semantic router to
//! specialist booking agents, with a group-chat coordinator assembling
//! composite requests into a single compiled travel plan. Sessions are
//! isolated by construction: every agent instance is scoped to one session
//! key and handles its messages one at a time.

pub mod agents;
pub mod booking;
pub mod config;
pub mod error;
pub mod messaging;
pub mod orchestrator;
pub mod registry;
pub mod session;

pub use agents::{
    ChannelSink, FlightAgent, GroupChatManager, HotelAgent, ResponseSink, RouterAgent,
    SessionPhase, UserProxyAgent, UserReply,
};
pub use config::ConciergeConfig;
pub use error::{ConciergeError, Result};
pub use messaging::{AgentId, Envelope, MessageBus, MessagePayload, RoutedAgent, TopicId};
pub use orchestrator::TravelOrchestrator;
