//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{FieldErrors, UserProfile};
use crate::domain::FlightOffer;
use crate::history::{ChatMessage, SearchRecord};

/// Health check body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub status: &'static str,
}

/// Returned by signup and login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub message: &'static str,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub valid: bool,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserProfile,
}

/// A chat message to answer.
#[derive(Debug, Deserialize)]
pub struct FlightSearchRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct FlightSearchResponse {
    /// The rendered chat reply
    pub response: String,

    /// Offers found, empty when the search failed
    pub flights: Vec<FlightOffer>,

    /// Id of the stored reply message
    pub message_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct SearchHistoryResponse {
    pub searches: Vec<SearchRecord>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Error body for the assistant endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error body for the account endpoints.
#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    pub message: String,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub existing_user: bool,
}
