//! Application state for the web layer.

use std::sync::Arc;

use crate::agent::FlightAgent;
use crate::auth::Accounts;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The flight-search assistant
    pub agent: Arc<FlightAgent>,

    /// Accounts and session tokens
    pub accounts: Arc<Accounts>,
}

impl AppState {
    pub fn new(agent: FlightAgent, accounts: Accounts) -> Self {
        Self {
            agent: Arc::new(agent),
            accounts: Arc::new(accounts),
        }
    }
}
