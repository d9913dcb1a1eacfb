//! Amadeus API response DTOs.
//!
//! Only the fields we read are modelled. Nearly everything is optional
//! because the provider omits data rather than sending nulls.

use serde::Deserialize;

/// Response from `POST /v1/security/oauth2/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
}

/// Response from `GET /v2/shopping/flight-offers`.
///
/// Offers are kept as raw JSON so that one malformed offer can be skipped
/// without failing the whole response. A missing or null `data` means no
/// offers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffersResponse {
    #[serde(default)]
    pub data: Option<Vec<serde_json::Value>>,
}

impl OffersResponse {
    pub fn into_offers(self) -> Vec<serde_json::Value> {
        self.data.unwrap_or_default()
    }
}

/// One priced itinerary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOffer {
    #[serde(default)]
    pub validating_airline_codes: Vec<String>,
    pub price: Option<RawPrice>,
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPrice {
    pub total: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Itinerary {
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// One flight leg.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub departure: Option<Endpoint>,
    pub arrival: Option<Endpoint>,
    pub number: Option<String>,
}

/// Departure or arrival point of a segment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Local ISO-8601 timestamp, e.g. `2024-03-14T06:15:00`.
    pub at: Option<String>,
}
