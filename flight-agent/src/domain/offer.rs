//! Flight offers as shown to the user.

use std::fmt;

use serde::{Serialize, Serializer};

use super::airport::AirportCode;
use super::date::TravelDate;

/// Placeholder for data the provider left out.
pub const MISSING: &str = "N/A";

/// A currency-tagged price, kept as the provider's decimal string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    pub total: String,
    pub currency: String,
}

impl Price {
    pub fn new(total: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            total: total.into(),
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.currency.eq_ignore_ascii_case("INR") {
            write!(f, "₹{}", self.total)
        } else {
            write!(f, "{} {}", self.total, self.currency)
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One priced itinerary, projected down to what the chat client renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightOffer {
    /// Validating airline code, or "Unknown".
    pub airline: String,
    pub price: Price,
    /// Local departure time, `HH:MM`.
    pub departure_time: String,
    /// Local arrival time, `HH:MM`.
    pub arrival_time: String,
    /// e.g. `2h 30m`.
    pub duration: String,
    /// Airline code followed by the first segment's number.
    pub flight_number: String,
    pub origin: AirportCode,
    pub destination: AirportCode,
    pub date: TravelDate,
}
