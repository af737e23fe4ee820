//! Simulated hotel booking collaborator.

use chrono::NaiveDate;
use rand::seq::SliceRandom;

use super::extract::HotelParams;
use super::flight::reference_code;
use crate::error::{ConciergeError, Result};
use crate::messaging::HotelBooking;

struct HotelOption {
    hotel_name: &'static str,
    room_type: &'static str,
    price_per_night: u32,
}

const HOTEL_OPTIONS: [HotelOption; 10] = [
    HotelOption {
        hotel_name: "Hilton",
        room_type: "Deluxe",
        price_per_night: 200,
    },
    HotelOption {
        hotel_name: "Marriott",
        room_type: "Standard",
        price_per_night: 150,
    },
    HotelOption {
        hotel_name: "Hyatt",
        room_type: "Suite",
        price_per_night: 300,
    },
    HotelOption {
        hotel_name: "Sheraton",
        room_type: "Executive",
        price_per_night: 250,
    },
    HotelOption {
        hotel_name: "Holiday Inn",
        room_type: "Standard",
        price_per_night: 100,
    },
    HotelOption {
        hotel_name: "Ritz-Carlton",
        room_type: "Luxury",
        price_per_night: 400,
    },
    HotelOption {
        hotel_name: "Four Seasons",
        room_type: "Presidential Suite",
        price_per_night: 500,
    },
    HotelOption {
        hotel_name: "InterContinental",
        room_type: "Club Room",
        price_per_night: 350,
    },
    HotelOption {
        hotel_name: "Westin",
        room_type: "Deluxe",
        price_per_night: 220,
    },
    HotelOption {
        hotel_name: "Radisson",
        room_type: "Standard",
        price_per_night: 180,
    },
];

/// Pick a hotel for the given stay and produce a booking record.
///
/// The stay must parse as ISO dates with check-out strictly after check-in.
pub async fn simulate_hotel_booking(params: &HotelParams) -> Result<HotelBooking> {
    let check_in = parse_date(&params.check_in_date)?;
    let check_out = parse_date(&params.check_out_date)?;
    let nights = (check_out - check_in).num_days();
    if nights <= 0 {
        return Err(ConciergeError::Booking(format!(
            "check-out {} must be after check-in {}",
            params.check_out_date, params.check_in_date
        )));
    }

    let mut rng = rand::thread_rng();
    let selected = HOTEL_OPTIONS
        .choose(&mut rng)
        .ok_or_else(|| ConciergeError::Booking("no hotel options available".into()))?;
    let total_price = nights as u32 * selected.price_per_night;
    let booking_reference = reference_code("HT", &params.city, &mut rng);

    Ok(HotelBooking {
        city: params.city.clone(),
        check_in_date: params.check_in_date.clone(),
        check_out_date: params.check_out_date.clone(),
        hotel_name: selected.hotel_name.to_string(),
        room_type: selected.room_type.to_string(),
        total_price,
        booking_reference,
    })
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ConciergeError::Booking(format!("invalid date {value:?}: {e}")))
}
