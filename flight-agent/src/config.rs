//! Process configuration read from the environment.

use std::net::SocketAddr;

use chrono::Duration;
use tracing::warn;

use crate::amadeus::AmadeusConfig;
use crate::auth::AuthConfig;

/// Address the server binds when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Token lifetime when `JWT_EXPIRATION_HOURS` is unset.
pub const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Longest accepted token lifetime: one hundred years.
pub const MAX_EXPIRATION_HOURS: i64 = 24 * 365 * 100;

/// Errors building [`AppConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Everything `main` needs to start the server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub amadeus: AmadeusConfig,
    pub auth: AuthConfig,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = var("AMADEUS_API_KEY").unwrap_or_else(|| {
            warn!("AMADEUS_API_KEY not set, flight searches will fail");
            String::new()
        });
        let secret = var("AMADEUS_SECRET").unwrap_or_else(|| {
            warn!("AMADEUS_SECRET not set, flight searches will fail");
            String::new()
        });

        let mut amadeus = AmadeusConfig::new(api_key, secret);
        if let Some(url) = var("AMADEUS_BASE_URL") {
            amadeus = amadeus.with_base_url(url);
        }
        if let Some(raw) = var("AMADEUS_TIMEOUT_SECS") {
            amadeus = amadeus.with_timeout(parse("AMADEUS_TIMEOUT_SECS", &raw)?);
        }

        let jwt_secret = var("JWT_SECRET_KEY").ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;
        let hours = match var("JWT_EXPIRATION_HOURS") {
            Some(raw) => parse::<i64>("JWT_EXPIRATION_HOURS", &raw)?,
            None => DEFAULT_EXPIRATION_HOURS,
        };
        if !(1..=MAX_EXPIRATION_HOURS).contains(&hours) {
            return Err(ConfigError::Invalid {
                name: "JWT_EXPIRATION_HOURS",
                value: hours.to_string(),
            });
        }
        let auth = AuthConfig::new(jwt_secret).with_expiration(Duration::hours(hours));

        let bind_addr = parse(
            "BIND_ADDR",
            &var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        )?;

        Ok(Self {
            amadeus,
            auth,
            bind_addr,
        })
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}
