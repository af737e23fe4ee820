//! Free-text to structured booking parameters.
//!
//! Production deployments put a hosted model behind these traits; the
//! shipped [`RuleBasedExtractor`] is deterministic. Extraction either yields
//! parameters or an explicit [`ConciergeError::Extraction`]; a failure is
//! never smuggled into a booking call as an empty value.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConciergeError, Result};

const DEFAULT_DEPARTURE_DATE: &str = "2023-12-20";
const DEFAULT_RETURN_DATE: &str = "2023-12-30";
const DEFAULT_PASSENGERS: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightParams {
    pub departure_city: String,
    pub destination_city: String,
    pub departure_date: String,
    pub return_date: String,
    pub number_of_passengers: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelParams {
    pub city: String,
    pub check_in_date: String,
    pub check_out_date: String,
}

#[async_trait]
pub trait FlightParamExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<FlightParams>;
}

#[async_trait]
pub trait HotelParamExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<HotelParams>;
}

/// Pattern-based extractor: city pairs from "from X to Y", stay locations
/// from "in X", ISO dates, and an optional passenger count. Missing dates and
/// passenger counts fall back to the documented defaults.
pub struct RuleBasedExtractor {
    city_pair: Regex,
    stay_city: Regex,
    date: Regex,
    passengers: Regex,
}

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self {
            city_pair: Regex::new(
                r"(?i)\bfrom\s+(.+?)\s+to\s+(.+?)(?:\s+\d|\s+for\b|\s+on\b|[,.!?]|$)",
            )
            .expect("static city-pair pattern"),
            stay_city: Regex::new(
                r"(?i)\b(?:in|at)\s+(.+?)(?:\s+\d|\s+for\b|\s+on\b|[,.!?]|$)",
            )
            .expect("static stay-city pattern"),
            date: Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("static date pattern"),
            passengers: Regex::new(r"(?i)\b(\d+)\s+(?:passengers?|people|persons|adults)\b")
                .expect("static passengers pattern"),
        }
    }

    fn dates(&self, text: &str) -> (String, String) {
        let mut found = self.date.find_iter(text).map(|m| m.as_str().to_string());
        let departure = found.next().unwrap_or_else(|| DEFAULT_DEPARTURE_DATE.into());
        let ret = found.next().unwrap_or_else(|| DEFAULT_RETURN_DATE.into());
        (departure, ret)
    }

    fn passenger_count(&self, text: &str) -> u32 {
        self.passengers
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(DEFAULT_PASSENGERS)
    }
}

impl Default for RuleBasedExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlightParamExtractor for RuleBasedExtractor {
    async fn extract(&self, text: &str) -> Result<FlightParams> {
        let captures = self.city_pair.captures(text).ok_or_else(|| {
            ConciergeError::Extraction(format!(
                "no departure/destination pair found in {text:?}"
            ))
        })?;
        let departure_city = captures[1].trim().to_string();
        let destination_city = captures[2].trim().to_string();
        let (departure_date, return_date) = self.dates(text);

        Ok(FlightParams {
            departure_city,
            destination_city,
            departure_date,
            return_date,
            number_of_passengers: self.passenger_count(text),
        })
    }
}

#[async_trait]
impl HotelParamExtractor for RuleBasedExtractor {
    async fn extract(&self, text: &str) -> Result<HotelParams> {
        // Prefer "in <city>"; fall back to the destination of a city pair.
        let city = self
            .stay_city
            .captures(text)
            .map(|c| c[1].trim().to_string())
            .or_else(|| {
                self.city_pair
                    .captures(text)
                    .map(|c| c[2].trim().to_string())
            })
            .ok_or_else(|| {
                ConciergeError::Extraction(format!("no city found in {text:?}"))
            })?;
        let (check_in_date, check_out_date) = self.dates(text);

        Ok(HotelParams {
            city,
            check_in_date,
            check_out_date,
        })
    }
}
