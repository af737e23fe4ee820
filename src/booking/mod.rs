//! Booking collaborators: parameter extraction and simulated reservations.

mod extract;
mod flight;
mod hotel;

pub use extract::{
    FlightParamExtractor, FlightParams, HotelParamExtractor, HotelParams, RuleBasedExtractor,
};
pub use flight::simulate_flight_booking;
pub use hotel::simulate_hotel_booking;
