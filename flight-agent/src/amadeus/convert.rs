//! Projection of raw Amadeus offers onto [`FlightOffer`].
//!
//! Offers are projected one at a time. An offer that cannot be projected is
//! logged and skipped; the batch only fails when nothing survives.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use tracing::warn;

use crate::domain::{AirportCode, FlightOffer, MISSING, Price, TravelDate};

use super::types::{Endpoint, RawOffer};

const UNKNOWN_AIRLINE: &str = "Unknown";
const DEFAULT_CURRENCY: &str = "INR";

/// Error projecting a single offer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    /// The offer JSON did not match the expected shape.
    #[error("malformed offer: {0}")]
    Malformed(String),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Outcome of projecting a batch of offers.
#[derive(Debug, Default)]
pub struct Projection {
    pub offers: Vec<FlightOffer>,
    pub skipped: usize,
}

/// Shared context for every offer in one search.
#[derive(Debug, Clone)]
pub struct SearchContext<'a> {
    pub origin: &'a AirportCode,
    pub destination: &'a AirportCode,
    pub date: &'a TravelDate,
}

/// Project every raw offer, skipping the ones that fail.
pub fn convert_offers(raw: &[serde_json::Value], ctx: &SearchContext<'_>) -> Projection {
    raw.iter()
        .fold(Projection::default(), |mut acc, value| {
            match decode_offer(value).and_then(|offer| convert_offer(&offer, ctx)) {
                Ok(offer) => acc.offers.push(offer),
                Err(e) => {
                    let id = value.get("id").and_then(|id| id.as_str()).unwrap_or("?");
                    warn!(offer_id = id, error = %e, "skipping flight offer");
                    acc.skipped += 1;
                }
            }
            acc
        })
}

fn decode_offer(value: &serde_json::Value) -> Result<RawOffer, ConversionError> {
    serde_json::from_value(value.clone()).map_err(|e| ConversionError::Malformed(e.to_string()))
}

/// Project a single decoded offer.
pub fn convert_offer(
    offer: &RawOffer,
    ctx: &SearchContext<'_>,
) -> Result<FlightOffer, ConversionError> {
    let airline = offer
        .validating_airline_codes
        .first()
        .cloned()
        .unwrap_or_else(|| UNKNOWN_AIRLINE.to_string());

    let price = offer.price.as_ref();
    let price = Price::new(
        price
            .and_then(|p| p.total.clone())
            .unwrap_or_else(|| MISSING.to_string()),
        price
            .and_then(|p| p.currency.clone())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
    );

    let segments = &offer
        .itineraries
        .first()
        .ok_or(ConversionError::MissingField("itineraries"))?
        .segments;
    let (first, last) = match (segments.first(), segments.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(ConversionError::MissingField("itineraries[0].segments")),
    };

    let departure_at = timestamp(first.departure.as_ref());
    let arrival_at = timestamp(last.arrival.as_ref());

    Ok(FlightOffer {
        flight_number: format!("{} {}", airline, first.number.as_deref().unwrap_or("")),
        airline,
        price,
        departure_time: format_time(departure_at),
        arrival_time: format_time(arrival_at),
        duration: duration_between(departure_at, arrival_at),
        origin: ctx.origin.clone(),
        destination: ctx.destination.clone(),
        date: ctx.date.clone(),
    })
}

fn timestamp(endpoint: Option<&Endpoint>) -> &str {
    endpoint.and_then(|e| e.at.as_deref()).unwrap_or(MISSING)
}

/// Parse an ISO-8601 timestamp, with or without an offset.
///
/// A trailing `Z` is read as `+00:00`. Timestamps without an offset are
/// local wall-clock times and are pinned to UTC so that two of them can be
/// subtracted.
fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    let normalized = match raw.strip_suffix('Z') {
        Some(stripped) => format!("{stripped}+00:00"),
        None => raw.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt);
    }

    let naive = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M"))
        .ok()?;
    FixedOffset::east_opt(0)?
        .from_local_datetime(&naive)
        .single()
}

/// `HH:MM` in the timestamp's own offset; unparseable input is returned as is.
pub fn format_time(raw: &str) -> String {
    parse_timestamp(raw)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Elapsed time as `<h>h <m>m`, seconds dropped.
///
/// Returns `N/A` when either side is unparseable or arrival precedes departure.
pub fn duration_between(departure: &str, arrival: &str) -> String {
    let (Some(dep), Some(arr)) = (parse_timestamp(departure), parse_timestamp(arrival)) else {
        return MISSING.to_string();
    };

    let secs = (arr - dep).num_seconds();
    if secs < 0 {
        return MISSING.to_string();
    }

    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}
