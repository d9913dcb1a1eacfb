//! Flight-search assistant backend.
//!
//! A chat API that reads free-text requests such as "flights from BLR to
//! GOI next friday", looks up offers on the Amadeus flight-offers API and
//! answers with a formatted list of flights.

pub mod agent;
pub mod amadeus;
pub mod auth;
pub mod config;
pub mod domain;
pub mod history;
pub mod reply;
pub mod web;
