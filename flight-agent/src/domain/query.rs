//! Free-text flight query interpretation.
//!
//! Pulls an origin, a destination and a date phrase out of a chat message
//! using a couple of regular expressions and a fixed date vocabulary.
//! Missing pieces fall back to fixed defaults instead of failing.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::airport::AirportCode;
use super::date::WEEKDAYS;

/// Origin used when the query names none.
pub const DEFAULT_ORIGIN: &str = "DEL";

/// Destination used when the query names none.
pub const DEFAULT_DESTINATION: &str = "BOM";

/// Date phrase used when the query names none.
pub const DEFAULT_DATE: &str = "tomorrow";

static ORIGIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)from\s+(\w+)").expect("origin pattern is valid"));

static DESTINATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)to\s+(\w+)").expect("destination pattern is valid"));

/// Date phrases in match priority order.
static DATE_PHRASES: LazyLock<Vec<String>> = LazyLock::new(|| {
    let mut phrases = vec!["tomorrow".to_string(), "today".to_string()];
    phrases.extend(WEEKDAYS.iter().map(|(name, _)| format!("next {name}")));
    phrases.push("next week".to_string());
    phrases
});

/// The structured form of a flight query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedQuery {
    /// Departure airport.
    pub origin: AirportCode,
    /// Arrival airport.
    pub destination: AirportCode,
    /// Date phrase, not yet normalized.
    pub date_expression: String,
}

/// Interpret a free-text query.
///
/// # Example
///
/// ```
/// use flight_agent::domain::interpret;
///
/// let q = interpret("flights from DEL to BOM tomorrow");
/// assert_eq!(q.origin.as_str(), "DEL");
/// assert_eq!(q.destination.as_str(), "BOM");
/// assert_eq!(q.date_expression, "tomorrow");
/// ```
pub fn interpret(text: &str) -> ParsedQuery {
    let origin = first_capture(&ORIGIN_RE, text).unwrap_or(DEFAULT_ORIGIN);
    let destination = first_capture(&DESTINATION_RE, text).unwrap_or(DEFAULT_DESTINATION);
    let date_expression = date_phrase(text);

    let parsed = ParsedQuery {
        origin: AirportCode::new(origin),
        destination: AirportCode::new(destination),
        date_expression,
    };
    debug!(?parsed, "interpreted query");
    parsed
}

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn date_phrase(text: &str) -> String {
    let lowered = text.to_lowercase();
    DATE_PHRASES
        .iter()
        .find(|phrase| lowered.contains(phrase.as_str()))
        .cloned()
        .unwrap_or_else(|| DEFAULT_DATE.to_string())
}
