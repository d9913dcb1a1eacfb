//! Amadeus flight-offers client.
//!
//! Wraps the two Amadeus self-service endpoints we need:
//! - `POST /v1/security/oauth2/token` (client-credentials grant)
//! - `GET /v2/shopping/flight-offers`
//!
//! and projects the verbose offer JSON down to [`crate::domain::FlightOffer`].

mod client;
mod convert;
mod error;
mod types;

pub use client::{AmadeusClient, AmadeusConfig, DEFAULT_BASE_URL};
pub use convert::{
    ConversionError, Projection, SearchContext, convert_offers, duration_between, format_time,
};
pub use error::SearchError;
pub use types::{Endpoint, Itinerary, OffersResponse, RawOffer, RawPrice, Segment, TokenResponse};

use crate::domain::FlightOffer;

/// Outcome of a flight search: a non-empty list of offers, or why there
/// are none.
pub type SearchResult = Result<Vec<FlightOffer>, SearchError>;
