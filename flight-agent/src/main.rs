use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use flight_agent::agent::FlightAgent;
use flight_agent::amadeus::AmadeusClient;
use flight_agent::auth::{Accounts, Passwords, TokenService, UserStore};
use flight_agent::config::AppConfig;
use flight_agent::history::InMemoryHistory;
use flight_agent::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("flight_agent=info,tower_http=info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let amadeus = AmadeusClient::new(config.amadeus).expect("Failed to create Amadeus client");
    let agent = FlightAgent::new(Arc::new(amadeus), Arc::new(InMemoryHistory::new()));
    let accounts = Accounts::new(
        UserStore::new(),
        Passwords::new(),
        TokenService::new(&config.auth),
    );

    let app = create_router(AppState::new(agent, accounts));

    info!(addr = %config.bind_addr, "Flight agent listening");
    info!("API Endpoints:");
    info!("  GET    /health              - Health check");
    info!("  POST   /api/auth/signup     - Create an account");
    info!("  POST   /api/auth/login      - Log in");
    info!("  GET    /api/auth/validate   - Check a token");
    info!("  GET    /api/auth/profile    - Current user");
    info!("  POST   /api/flight-search   - Ask for flights");
    info!("  GET    /api/chat-history    - Chat thread");
    info!("  DELETE /api/chat-history    - Clear chat thread");
    info!("  GET    /api/search-history  - Recent searches");

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
