//! Amadeus self-service HTTP client.
//!
//! A search is two sequential calls: a client-credentials token exchange,
//! then the flight-offers query with that bearer token. The token is not
//! cached; every search fetches a fresh one.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::agent::OfferSource;
use crate::domain::{AirportCode, TravelDate, normalize};

use super::SearchResult;
use super::convert::{SearchContext, convert_offers};
use super::error::SearchError;
use super::types::{OffersResponse, TokenResponse};

/// Default base URL (Amadeus test environment).
pub const DEFAULT_BASE_URL: &str = "https://test.api.amadeus.com";

const TOKEN_PATH: &str = "/v1/security/oauth2/token";
const OFFERS_PATH: &str = "/v2/shopping/flight-offers";

/// Offers requested per search.
const MAX_OFFERS: u8 = 5;
const ADULTS: u8 = 1;
const CURRENCY: &str = "INR";

/// Configuration for the Amadeus client.
#[derive(Debug, Clone)]
pub struct AmadeusConfig {
    /// OAuth client id (API key)
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Base URL for the API (defaults to the Amadeus test environment)
    pub base_url: String,
    /// Timeout applied to each request, in seconds
    pub timeout_secs: u64,
}

impl AmadeusConfig {
    /// Create a new config with the given credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Amadeus flight-offers client.
#[derive(Debug, Clone)]
pub struct AmadeusClient {
    http: reqwest::Client,
    config: AmadeusConfig,
}

impl AmadeusClient {
    /// Create a new client with the given configuration.
    pub fn new(config: AmadeusConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    /// Search for offers on an already-normalized date.
    ///
    /// Never fails past this boundary: every problem comes back as a
    /// [`SearchError`]. A successful result is never empty.
    pub async fn search(
        &self,
        origin: &AirportCode,
        destination: &AirportCode,
        date: &TravelDate,
    ) -> SearchResult {
        info!(%origin, %destination, %date, "searching flight offers");

        let token = self.access_token().await?;
        let raw = self.fetch_offers(&token, origin, destination, date).await?;
        info!(count = raw.len(), "provider returned offers");

        if raw.is_empty() {
            return Err(SearchError::NoFlights {
                origin: origin.to_string(),
                destination: destination.to_string(),
                date: date.to_string(),
            });
        }

        let ctx = SearchContext {
            origin,
            destination,
            date,
        };
        let projection = convert_offers(&raw, &ctx);
        if projection.skipped > 0 {
            warn!(skipped = projection.skipped, "some offers could not be processed");
        }

        if projection.offers.is_empty() {
            return Err(SearchError::NoValidOffers);
        }

        Ok(projection.offers)
    }

    /// Normalize `date_expression` against `today`, then search.
    pub async fn search_expression(
        &self,
        origin: &AirportCode,
        destination: &AirportCode,
        date_expression: &str,
        today: NaiveDate,
    ) -> SearchResult {
        let date = normalize(date_expression, today);
        self.search(origin, destination, &date).await
    }

    /// Exchange client credentials for a bearer token.
    async fn access_token(&self) -> Result<String, SearchError> {
        let url = format!("{}{}", self.config.base_url, TOKEN_PATH);

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "token response");

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Unexpected(e.to_string()))?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(SearchError::NoAccessToken)
    }

    /// Query the offers endpoint, returning the raw offers.
    async fn fetch_offers(
        &self,
        token: &str,
        origin: &AirportCode,
        destination: &AirportCode,
        date: &TravelDate,
    ) -> Result<Vec<serde_json::Value>, SearchError> {
        let url = format!("{}{}", self.config.base_url, OFFERS_PATH);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("originLocationCode", origin.as_str().to_string()),
                ("destinationLocationCode", destination.as_str().to_string()),
                ("departureDate", date.to_string()),
                ("adults", ADULTS.to_string()),
                ("max", MAX_OFFERS.to_string()),
                ("currencyCode", CURRENCY.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "offers response");

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Search {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let body = response.text().await?;
        let offers: OffersResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Unexpected(e.to_string()))?;

        Ok(offers.into_offers())
    }
}

/// The error body as compact JSON when it parses, else the raw text.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .map(|json| json.to_string())
        .unwrap_or_else(|_| body.to_string())
}

#[async_trait]
impl OfferSource for AmadeusClient {
    async fn search(
        &self,
        origin: &AirportCode,
        destination: &AirportCode,
        date: &TravelDate,
    ) -> SearchResult {
        AmadeusClient::search(self, origin, destination, date).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::{Form, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str) -> AmadeusClient {
        let config = AmadeusConfig::new("key", "secret")
            .with_base_url(base_url)
            .with_timeout(5);
        AmadeusClient::new(config).unwrap()
    }

    fn token_ok() -> Router {
        Router::new().route(
            TOKEN_PATH,
            post(|Form(form): Form<HashMap<String, String>>| async move {
                assert_eq!(form["grant_type"], "client_credentials");
                assert_eq!(form["client_id"], "key");
                assert_eq!(form["client_secret"], "secret");
                Json(json!({"access_token": "tok", "token_type": "Bearer", "expires_in": 1799}))
            }),
        )
    }

    fn offers_returning(status: StatusCode, body: serde_json::Value) -> Router {
        Router::new().route(
            OFFERS_PATH,
            get(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        )
    }

    fn codes() -> (AirportCode, AirportCode, TravelDate) {
        (
            AirportCode::new("del"),
            AirportCode::new("bom"),
            TravelDate::Resolved(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()),
        )
    }

    fn offer(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "validatingAirlineCodes": ["AI"],
            "price": {"total": "5230.00", "currency": "INR"},
            "itineraries": [{"segments": [{
                "departure": {"at": "2024-03-14T06:15:00"},
                "arrival": {"at": "2024-03-14T08:25:00"},
                "number": "665"
            }]}]
        })
    }

    #[test]
    fn config_builder() {
        let config = AmadeusConfig::new("id", "secret")
            .with_base_url("http://localhost:8080/")
            .with_timeout(60);

        assert_eq!(config.client_id, "id");
        assert_eq!(config.client_secret, "secret");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn config_defaults() {
        let config = AmadeusConfig::new("id", "secret");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn error_detail_prefers_json() {
        assert_eq!(
            error_detail(r#"{ "errors": [ {"code": 477} ] }"#),
            r#"{"errors":[{"code":477}]}"#
        );
        assert_eq!(error_detail("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn rejected_credentials_skip_offer_search() {
        let offer_hits = Arc::new(AtomicUsize::new(0));
        let hits = offer_hits.clone();
        let router = Router::new()
            .route(
                TOKEN_PATH,
                post(|| async { (StatusCode::UNAUTHORIZED, "invalid_client") }),
            )
            .route(
                OFFERS_PATH,
                get(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        Json(json!({"data": []}))
                    }
                }),
            );
        let base = serve(router).await;
        let (origin, destination, date) = codes();

        let err = client(&base)
            .search(&origin, &destination, &date)
            .await
            .unwrap_err();

        assert!(
            err.to_string()
                .starts_with("Authentication failed: 401 - invalid_client")
        );
        assert_eq!(offer_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn token_response_without_token() {
        let router = Router::new().route(
            TOKEN_PATH,
            post(|| async { Json(json!({"state": "approved"})) }),
        );
        let base = serve(router).await;
        let (origin, destination, date) = codes();

        let err = client(&base)
            .search(&origin, &destination, &date)
            .await
            .unwrap_err();
        assert_eq!(err, SearchError::NoAccessToken);
    }

    #[tokio::test]
    async fn sends_expected_search_parameters() {
        let router = token_ok().route(
            OFFERS_PATH,
            get(
                |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                    assert_eq!(headers["authorization"], "Bearer tok");
                    assert_eq!(params["originLocationCode"], "DEL");
                    assert_eq!(params["destinationLocationCode"], "BOM");
                    assert_eq!(params["departureDate"], "2024-03-14");
                    assert_eq!(params["adults"], "1");
                    assert_eq!(params["max"], "5");
                    assert_eq!(params["currencyCode"], "INR");
                    Json(json!({"data": [offer("1")]}))
                },
            ),
        );
        let base = serve(router).await;
        let (origin, destination, date) = codes();

        let offers = client(&base)
            .search(&origin, &destination, &date)
            .await
            .unwrap();

        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].flight_number, "AI 665");
        assert_eq!(offers[0].duration, "2h 10m");
    }

    #[tokio::test]
    async fn malformed_offer_is_skipped() {
        let router = token_ok().merge(offers_returning(
            StatusCode::OK,
            json!({"data": [offer("1"), {"id": "2", "validatingAirlineCodes": ["UK"]}]}),
        ));
        let base = serve(router).await;
        let (origin, destination, date) = codes();

        let offers = client(&base)
            .search(&origin, &destination, &date)
            .await
            .unwrap();

        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].airline, "AI");
    }

    #[tokio::test]
    async fn all_offers_malformed() {
        let router = token_ok().merge(offers_returning(
            StatusCode::OK,
            json!({"data": [{"id": "1"}, {"id": "2", "itineraries": []}]}),
        ));
        let base = serve(router).await;
        let (origin, destination, date) = codes();

        let err = client(&base)
            .search(&origin, &destination, &date)
            .await
            .unwrap_err();
        assert_eq!(err, SearchError::NoValidOffers);
    }

    #[tokio::test]
    async fn empty_offer_list() {
        let router = token_ok().merge(offers_returning(StatusCode::OK, json!({"data": []})));
        let base = serve(router).await;
        let (origin, destination, date) = codes();

        let err = client(&base)
            .search(&origin, &destination, &date)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No flights found from DEL to BOM on 2024-03-14."
        );
    }

    #[tokio::test]
    async fn search_failure_carries_status_and_body() {
        let router = token_ok().merge(offers_returning(
            StatusCode::BAD_REQUEST,
            json!({"errors": [{"code": 425, "title": "INVALID DATE"}]}),
        ));
        let base = serve(router).await;
        let (origin, destination, _) = codes();
        let date = TravelDate::Unresolved("someday".into());

        let err = client(&base)
            .search(&origin, &destination, &date)
            .await
            .unwrap_err();

        match err {
            SearchError::Search { status, detail } => {
                assert_eq!(status, 400);
                assert!(detail.contains("INVALID DATE"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn null_offer_data_reads_as_no_flights() {
        let router = token_ok().merge(offers_returning(StatusCode::OK, json!({"data": null})));
        let base = serve(router).await;
        let (origin, destination, date) = codes();

        let err = client(&base)
            .search(&origin, &destination, &date)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::NoFlights { .. }));
    }

    #[tokio::test]
    async fn slow_token_endpoint_is_network_error() {
        let offers_hit = Arc::new(AtomicUsize::new(0));
        let hits = offers_hit.clone();
        let router = Router::new()
            .route(
                TOKEN_PATH,
                post(|| async {
                    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                    Json(json!({"access_token": "tok"}))
                }),
            )
            .route(
                OFFERS_PATH,
                get(move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                    async { Json(json!({"data": []})) }
                }),
            );
        let base = serve(router).await;
        let config = AmadeusConfig::new("key", "secret")
            .with_base_url(&base)
            .with_timeout(1);
        let (origin, destination, date) = codes();

        let err = AmadeusClient::new(config)
            .unwrap()
            .search(&origin, &destination, &date)
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Network(_)), "{err:?}");
        assert_eq!(offers_hit.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn slow_offers_endpoint_is_network_error() {
        let router = token_ok().route(
            OFFERS_PATH,
            get(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                Json(json!({"data": []}))
            }),
        );
        let base = serve(router).await;
        let config = AmadeusConfig::new("key", "secret")
            .with_base_url(&base)
            .with_timeout(1);
        let (origin, destination, date) = codes();

        let err = AmadeusClient::new(config)
            .unwrap()
            .search(&origin, &destination, &date)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Network(_)), "{err:?}");
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let (origin, destination, date) = codes();

        let err = client(&format!("http://{addr}"))
            .search(&origin, &destination, &date)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Network(_)));
    }

    #[tokio::test]
    async fn search_expression_normalizes_date() {
        let router = token_ok().route(
            OFFERS_PATH,
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params["departureDate"], "2024-03-14");
                Json(json!({"data": [offer("1")]}))
            }),
        );
        let base = serve(router).await;
        let (origin, destination, _) = codes();
        let today = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();

        let offers = client(&base)
            .search_expression(&origin, &destination, "tomorrow", today)
            .await
            .unwrap();
        assert_eq!(offers[0].date.to_string(), "2024-03-14");
    }
}
