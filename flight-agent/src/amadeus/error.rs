//! Flight search failure taxonomy.
//!
//! Every failure of a search ends up as one of these values; none of them
//! escapes the client as a panic or a transport error. The `Display` text
//! is shown to the user verbatim.

/// Why a flight search produced no offers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The token endpoint rejected our credentials.
    #[error("Authentication failed: {status} - {body}")]
    Auth { status: u16, body: String },

    /// The token endpoint answered 200 but without an access token.
    #[error("Failed to get access token from Amadeus API")]
    NoAccessToken,

    /// The offers endpoint answered with a non-200 status.
    #[error("Flight search failed: {status} - {detail}")]
    Search { status: u16, detail: String },

    /// The provider returned zero offers.
    #[error("No flights found from {origin} to {destination} on {date}.")]
    NoFlights {
        origin: String,
        destination: String,
        date: String,
    },

    /// Offers came back but none could be projected.
    #[error("No valid flight data could be processed")]
    NoValidOffers,

    /// Connection failure, timeout, or similar.
    #[error("Network error: {0}")]
    Network(String),

    /// Anything else, such as an undecodable response body.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::Unexpected(err.to_string())
        } else {
            SearchError::Network(err.to_string())
        }
    }
}
