//! Domain types for the flight assistant.
//!
//! Everything here is pure: no I/O, no clock. Callers pass in the
//! reference day so results are reproducible.

mod airport;
mod date;
mod offer;
mod query;

pub use airport::AirportCode;
pub use date::{TravelDate, normalize};
pub use offer::{FlightOffer, MISSING, Price};
pub use query::{DEFAULT_DATE, DEFAULT_DESTINATION, DEFAULT_ORIGIN, ParsedQuery, interpret};
