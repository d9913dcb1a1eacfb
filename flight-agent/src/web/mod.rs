//! HTTP surface for the flight-search assistant.
//!
//! Account endpoints live under `/api/auth`; everything else under `/api`
//! requires a bearer token.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
