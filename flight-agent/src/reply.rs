//! Chat replies for search results.
//!
//! Renders a [`SearchResult`] into the message shown in the chat thread,
//! using askama text templates under `templates/`.

use askama::Template;

use crate::amadeus::SearchResult;
use crate::domain::FlightOffer;

/// Message used when a search succeeded with nothing to show.
const NO_FLIGHTS: &str = "No flights found";

/// Numbered list of offers followed by the call to action.
#[derive(Template)]
#[template(path = "flight_reply.txt")]
pub struct FlightListTemplate<'a> {
    pub flights: &'a [FlightOffer],
}

/// Apology embedding the failure message.
#[derive(Template)]
#[template(path = "flight_apology.txt")]
pub struct ApologyTemplate<'a> {
    pub error: &'a str,
}

/// Render the chat reply for a search outcome.
pub fn format_reply(result: &SearchResult) -> String {
    let rendered = match result {
        Ok(flights) if !flights.is_empty() => FlightListTemplate { flights }.render(),
        Ok(_) => ApologyTemplate { error: NO_FLIGHTS }.render(),
        Err(e) => ApologyTemplate {
            error: &e.to_string(),
        }
        .render(),
    };

    rendered.unwrap_or_else(|e| format!("Template error: {}", e))
}
