//! Simulated flight booking collaborator.

use rand::seq::SliceRandom;
use rand::Rng;

use super::extract::FlightParams;
use crate::error::{ConciergeError, Result};
use crate::messaging::FlightBooking;

struct FlightOption {
    airline: &'static str,
    flight_number: &'static str,
    price_per_ticket: u32,
}

const FLIGHT_OPTIONS: [FlightOption; 5] = [
    FlightOption {
        airline: "Air France",
        flight_number: "AF123",
        price_per_ticket: 200,
    },
    FlightOption {
        airline: "Delta",
        flight_number: "DL456",
        price_per_ticket: 250,
    },
    FlightOption {
        airline: "British Airways",
        flight_number: "BA789",
        price_per_ticket: 300,
    },
    FlightOption {
        airline: "Lufthansa",
        flight_number: "LH101",
        price_per_ticket: 220,
    },
    FlightOption {
        airline: "Emirates",
        flight_number: "EK202",
        price_per_ticket: 400,
    },
];

/// Pick a flight for the given parameters and produce a booking record.
pub async fn simulate_flight_booking(params: &FlightParams) -> Result<FlightBooking> {
    if params.number_of_passengers == 0 {
        return Err(ConciergeError::Booking(
            "at least one passenger is required".into(),
        ));
    }

    let mut rng = rand::thread_rng();
    let selected = FLIGHT_OPTIONS
        .choose(&mut rng)
        .ok_or_else(|| ConciergeError::Booking("no flight options available".into()))?;
    let total_price = params.number_of_passengers * selected.price_per_ticket;
    let booking_reference = reference_code("FL", &params.destination_city, &mut rng);

    Ok(FlightBooking {
        departure_city: params.departure_city.clone(),
        destination_city: params.destination_city.clone(),
        departure_date: params.departure_date.clone(),
        return_date: params.return_date.clone(),
        airline: selected.airline.to_string(),
        flight_number: selected.flight_number.to_string(),
        total_price,
        booking_reference,
        number_of_passengers: params.number_of_passengers,
    })
}

pub(crate) fn reference_code(prefix: &str, city: &str, rng: &mut impl Rng) -> String {
    let code: String = city
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    format!("{}-{}-{}", prefix, rng.gen_range(1000..=9999), code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> FlightParams {
        FlightParams {
            departure_city: "New York".into(),
            destination_city: "Paris".into(),
            departure_date: "2023-12-20".into(),
            return_date: "2023-12-30".into(),
            number_of_passengers: 2,
        }
    }

    #[tokio::test]
    async fn test_booking_preserves_parameters() {
        let booking = simulate_flight_booking(&params()).await.unwrap();

        assert_eq!(booking.departure_city, "New York");
        assert_eq!(booking.destination_city, "Paris");
        assert_eq!(booking.departure_date, "2023-12-20");
        assert_eq!(booking.return_date, "2023-12-30");
        assert_eq!(booking.number_of_passengers, 2);
    }

    #[tokio::test]
    async fn test_booking_reference_format() {
        let booking = simulate_flight_booking(&params()).await.unwrap();
        assert!(booking.booking_reference.starts_with("FL-"));
        assert!(booking.booking_reference.ends_with("-PAR"));
    }

    #[tokio::test]
    async fn test_price_scales_with_passengers() {
        let mut four = params();
        four.number_of_passengers = 4;
        let booking = simulate_flight_booking(&four).await.unwrap();
        // Cheapest option is 200/ticket, priciest 400.
        assert!(booking.total_price >= 800);
        assert!(booking.total_price <= 1600);
        assert_eq!(booking.total_price % 4, 0);
    }

    #[tokio::test]
    async fn test_zero_passengers_rejected() {
        let mut none = params();
        none.number_of_passengers = 0;
        let result = simulate_flight_booking(&none).await;
        assert!(matches!(result, Err(ConciergeError::Booking(_))));
    }

    #[test]
    fn test_reference_code_short_city() {
        let code = reference_code("FL", "Ft", &mut rand::thread_rng());
        assert!(code.starts_with("FL-"));
        assert!(code.ends_with("-FT"));
    }
}
