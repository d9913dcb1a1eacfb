//! Departure date normalization.
//!
//! Turns the date phrase pulled out of a chat message ("tomorrow",
//! "next friday", "2025-03-14", ...) into a concrete calendar date relative
//! to a reference day. Input that cannot be understood is handed back
//! untouched so the flight provider can reject it.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

/// Weekday vocabulary recognised after "next ", in scan order.
pub(crate) const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// Wire format for departure dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A departure date after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TravelDate {
    /// The expression resolved to a calendar date.
    Resolved(NaiveDate),
    /// The expression was not understood and is passed along verbatim.
    Unresolved(String),
}

impl TravelDate {
    /// The resolved date, if any.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            TravelDate::Resolved(date) => Some(*date),
            TravelDate::Unresolved(_) => None,
        }
    }
}

impl fmt::Display for TravelDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelDate::Resolved(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            TravelDate::Unresolved(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for TravelDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Normalize a date expression against `today`.
///
/// Recognises, in order: `today`, `tomorrow` (exact), `next <weekday>`,
/// `next week` (substring), then a strict `YYYY-MM-DD` date. Absolute dates
/// in the past are moved forward by exactly one year. Anything else comes
/// back as [`TravelDate::Unresolved`].
///
/// "next <weekday>" said on that same weekday means a week out, never today.
pub fn normalize(expr: &str, today: NaiveDate) -> TravelDate {
    let lowered = expr.trim().to_lowercase();
    debug!(expr, %today, "normalizing date expression");

    let resolved = match lowered.as_str() {
        "today" => Some(today),
        "tomorrow" => Some(today + Duration::days(1)),
        _ => relative_date(&lowered, today),
    };

    if let Some(date) = resolved {
        return TravelDate::Resolved(date);
    }

    absolute_date(expr, today)
}

/// Resolve `next <weekday>` / `next week` phrases.
fn relative_date(lowered: &str, today: NaiveDate) -> Option<NaiveDate> {
    for (name, weekday) in WEEKDAYS {
        if lowered.contains(&format!("next {name}")) {
            return Some(today + Duration::days(days_until(today.weekday(), weekday)));
        }
    }

    if lowered.contains("next week") {
        return Some(today + Duration::days(7));
    }

    None
}

/// Days from `from` to the next `target`, in 1..=7.
fn days_until(from: Weekday, target: Weekday) -> i64 {
    let target = i64::from(target.num_days_from_monday());
    let from = i64::from(from.num_days_from_monday());
    match (target - from).rem_euclid(7) {
        0 => 7,
        n => n,
    }
}

fn absolute_date(raw: &str, today: NaiveDate) -> TravelDate {
    let Ok(date) = NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) else {
        warn!(expr = raw, "unrecognised date expression, passing through");
        return TravelDate::Unresolved(raw.to_string());
    };

    if date >= today {
        return TravelDate::Resolved(date);
    }

    // A single one-year jump; older dates may still land in the past.
    match date.with_year(date.year() + 1) {
        Some(bumped) => {
            warn!(%date, %bumped, "date is in the past, moving forward one year");
            TravelDate::Resolved(bumped)
        }
        None => {
            warn!(%date, "past date has no counterpart next year, passing through");
            TravelDate::Unresolved(raw.to_string())
        }
    }
}
