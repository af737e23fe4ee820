//! Typed envelopes and topic identifiers for inter-agent communication.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topic type for the semantic router.
pub const ROUTER_TOPIC: &str = "router";
/// Topic type for the user-facing proxy.
pub const USER_PROXY_TOPIC: &str = "user_proxy";
/// Topic type for the group-chat coordinator.
pub const GROUP_CHAT_TOPIC: &str = "group_chat_manager";
/// Topic type for the flight specialist.
pub const FLIGHT_TOPIC: &str = "flight_booking";
/// Topic type for the hotel specialist.
pub const HOTEL_TOPIC: &str = "hotel_booking";
/// Pseudo agent type used for greetings and other non-specialist replies.
pub const DEFAULT_AGENT: &str = "default_agent";

/// A logical channel: a role type plus the session key it is scoped to.
///
/// Two envelopes with the same `source` belong to the same conversation
/// regardless of `topic_type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicId {
    #[serde(rename = "type")]
    pub topic_type: String,
    pub source: String,
}

impl TopicId {
    pub fn new(topic_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            topic_type: topic_type.into(),
            source: source.into(),
        }
    }

    pub fn router(session: impl Into<String>) -> Self {
        Self::new(ROUTER_TOPIC, session)
    }

    pub fn user_proxy(session: impl Into<String>) -> Self {
        Self::new(USER_PROXY_TOPIC, session)
    }

    pub fn group_chat(session: impl Into<String>) -> Self {
        Self::new(GROUP_CHAT_TOPIC, session)
    }
}

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.topic_type, self.source)
    }
}

/// Address of one specific agent instance.
///
/// `key` is conventionally the session key, so each session gets its own
/// specialist instance and no state leaks across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId {
    #[serde(rename = "type")]
    pub agent_type: String,
    pub key: String,
}

impl AgentId {
    pub fn new(agent_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            agent_type: agent_type.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.agent_type, self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    EndUserMessage,
    TravelRequest,
    TravelPlan,
    GroupChatMessage,
    HandoffMessage,
    AgentResponse,
    AgentStructuredResponse,
}

/// Raw user turn entering the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndUserMessage {
    pub content: String,
    pub source: String,
}

impl EndUserMessage {
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
        }
    }
}

/// Directed ask to one agent, optionally tagged with the parent composite
/// task and the completion flag used by the handoff protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelRequest {
    pub source: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_task: Option<String>,
    #[serde(default)]
    pub complete: bool,
}

impl TravelRequest {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            requirements: None,
            original_task: None,
            complete: false,
        }
    }

    pub fn with_original_task(mut self, task: impl Into<String>) -> Self {
        self.original_task = Some(task.into());
        self
    }

    pub fn with_requirement(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn completed(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: String::new(),
            requirements: None,
            original_task: None,
            complete: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelSubtask {
    pub assigned_agent: String,
    pub task_details: String,
}

/// A decomposed composite request. Subtask order is significant: the
/// coordinator's compiled reply preserves it regardless of completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelPlan {
    pub main_task: String,
    pub subtasks: Vec<TravelSubtask>,
    #[serde(default)]
    pub is_greeting: bool,
}

impl TravelPlan {
    pub fn new(main_task: impl Into<String>, subtasks: Vec<TravelSubtask>) -> Self {
        Self {
            main_task: main_task.into(),
            subtasks,
            is_greeting: false,
        }
    }

    pub fn greeting(main_task: impl Into<String>) -> Self {
        Self {
            main_task: main_task.into(),
            subtasks: Vec::new(),
            is_greeting: true,
        }
    }
}

/// A specialist's reply to a `TravelRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupChatMessage {
    pub source: String,
    pub content: String,
}

impl GroupChatMessage {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// Redirect signal published to the router topic when an agent cannot
/// service a request. Never triggers booking logic on its own.
///
/// `complete` marks the conversation as finished; it is only ever set by an
/// explicit [`completed`] handoff, never inferred from user content.
///
/// [`completed`]: HandoffMessage::completed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffMessage {
    pub source: String,
    pub content: String,
    #[serde(default)]
    pub complete: bool,
}

impl HandoffMessage {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            complete: false,
        }
    }

    pub fn completed(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: String::new(),
            complete: true,
        }
    }
}

/// Final, user-visible plain-text output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub source: String,
    pub content: String,
}

impl AgentResponse {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
        }
    }
}

/// Structured result of a booking simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightBooking {
    pub departure_city: String,
    pub destination_city: String,
    pub departure_date: String,
    pub return_date: String,
    pub airline: String,
    pub flight_number: String,
    pub total_price: u32,
    pub booking_reference: String,
    pub number_of_passengers: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelBooking {
    pub city: String,
    pub check_in_date: String,
    pub check_out_date: String,
    pub hotel_name: String,
    pub room_type: String,
    pub total_price: u32,
    pub booking_reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Greeter {
    pub greeting: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuredData {
    Flight(FlightBooking),
    Hotel(HotelBooking),
    Greeter(Greeter),
}

/// Final, user-visible structured output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStructuredResponse {
    pub agent_type: String,
    pub data: StructuredData,
    pub message: String,
}

/// Tagged union of every envelope kind the bus can carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePayload {
    EndUserMessage(EndUserMessage),
    TravelRequest(TravelRequest),
    TravelPlan(TravelPlan),
    GroupChatMessage(GroupChatMessage),
    HandoffMessage(HandoffMessage),
    AgentResponse(AgentResponse),
    AgentStructuredResponse(AgentStructuredResponse),
}

impl MessagePayload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::EndUserMessage(_) => MessageKind::EndUserMessage,
            Self::TravelRequest(_) => MessageKind::TravelRequest,
            Self::TravelPlan(_) => MessageKind::TravelPlan,
            Self::GroupChatMessage(_) => MessageKind::GroupChatMessage,
            Self::HandoffMessage(_) => MessageKind::HandoffMessage,
            Self::AgentResponse(_) => MessageKind::AgentResponse,
            Self::AgentStructuredResponse(_) => MessageKind::AgentStructuredResponse,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::EndUserMessage(_) => "end_user_message",
            Self::TravelRequest(_) => "travel_request",
            Self::TravelPlan(_) => "travel_plan",
            Self::GroupChatMessage(_) => "group_chat_message",
            Self::HandoffMessage(_) => "handoff_message",
            Self::AgentResponse(_) => "agent_response",
            Self::AgentStructuredResponse(_) => "agent_structured_response",
        }
    }
}

/// A payload bound to the topic it was published on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub id: String,
    pub payload: MessagePayload,
    pub topic: TopicId,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    pub fn new(payload: MessagePayload, topic: TopicId) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payload,
            topic,
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    /// Session key this envelope belongs to.
    pub fn session(&self) -> &str {
        &self.topic.source
    }
}
