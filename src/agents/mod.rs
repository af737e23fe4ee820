//! The concierge's agent roster.
//!
//! - [`RouterAgent`] plans each user turn and dispatches it.
//! - [`GroupChatManager`] coordinates composite requests across specialists.
//! - [`FlightAgent`] and [`HotelAgent`] run the booking simulations.
//! - [`UserProxyAgent`] carries replies out of the bus to the user.

mod flight;
mod group_chat;
mod hotel;
mod router;
mod user_proxy;

pub use flight::FlightAgent;
pub use group_chat::{GroupChatManager, SessionPhase};
pub use hotel::HotelAgent;
pub use router::RouterAgent;
pub use user_proxy::{ChannelSink, ResponseSink, UserProxyAgent, UserReply};
