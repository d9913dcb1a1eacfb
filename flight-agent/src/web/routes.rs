//! HTTP route handlers.

use axum::{
    Extension, Json, Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Local;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::auth::{AuthError, FieldErrors, LoginRequest, SignupRequest, User, bearer_token};
use crate::history::{CHAT_HISTORY_LIMIT, HistoryError, SEARCH_HISTORY_LIMIT};

use super::dto::*;
use super::state::AppState;

const VALIDATE_PATH: &str = "/api/auth/validate";
const PROFILE_PATH: &str = "/api/auth/profile";

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(VALIDATE_PATH, get(validate_token))
        .route(PROFILE_PATH, get(profile))
        .route("/api/flight-search", post(flight_search))
        .route(
            "/api/chat-history",
            get(chat_history).delete(clear_chat_history),
        )
        .route("/api/search-history", get(search_history))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve the bearer token to a [`User`] and attach it to the request.
async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let reject = AppError::unauthorized_for(req.uri().path());

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| reject.clone())?;

    let user = state
        .accounts
        .authenticate(token)
        .await
        .map_err(|_| reject.clone())?;
    if !user.is_active {
        return Err(reject);
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "API is running",
        status: "healthy",
    })
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = state
        .accounts
        .signup(&req)
        .await
        .map_err(AppError::signup)?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            success: true,
            message: "Account created successfully!",
            token: session.token,
            user: session.user,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state
        .accounts
        .login(&req)
        .await
        .map_err(AppError::login)?;

    Ok(Json(SessionResponse {
        success: true,
        message: "Login successful",
        token: session.token,
        user: session.user,
    }))
}

async fn validate_token(Extension(user): Extension<User>) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        success: true,
        valid: true,
        user: (&user).into(),
    })
}

async fn profile(Extension(user): Extension<User>) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        success: true,
        user: (&user).into(),
    })
}

/// Answer one chat message.
async fn flight_search(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<FlightSearchRequest>,
) -> Result<Json<FlightSearchResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(AppError::BadRequest {
            message: "Query is required".to_string(),
        });
    }

    let today = Local::now().date_naive();
    let reply = state.agent.handle(user.id, &req.query, today).await;

    Ok(Json(FlightSearchResponse {
        flights: reply.flights().to_vec(),
        response: reply.response,
        message_id: reply.message_id,
    }))
}

async fn chat_history(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    let messages = state
        .agent
        .history()
        .chat_history(user.id, CHAT_HISTORY_LIMIT)
        .await?;
    Ok(Json(ChatHistoryResponse { messages }))
}

async fn clear_chat_history(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<MessageResponse>, AppError> {
    let removed = state.agent.history().clear_chat(user.id).await?;
    info!(user_id = %user.id, removed, "chat history cleared");
    Ok(Json(MessageResponse {
        message: "Chat history cleared",
    }))
}

async fn search_history(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<SearchHistoryResponse>, AppError> {
    let searches = state
        .agent
        .history()
        .search_history(user.id, SEARCH_HISTORY_LIMIT)
        .await?;
    Ok(Json(SearchHistoryResponse { searches }))
}

/// Application error type.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Malformed assistant request
    BadRequest { message: String },

    /// Missing or unusable bearer token. `valid` is echoed by the token check
    /// endpoint only.
    Unauthorized {
        message: &'static str,
        valid: Option<bool>,
    },

    /// Account request refused
    Rejected {
        status: StatusCode,
        message: String,
        errors: FieldErrors,
        existing_user: bool,
    },

    Internal { message: String },
}

impl AppError {
    /// The 401 for a protected path.
    fn unauthorized_for(path: &str) -> Self {
        match path {
            VALIDATE_PATH => AppError::Unauthorized {
                message: "Invalid or expired token",
                valid: Some(false),
            },
            PROFILE_PATH => AppError::Unauthorized {
                message: "Authentication required",
                valid: None,
            },
            _ => AppError::Unauthorized {
                message: "Invalid or expired token",
                valid: None,
            },
        }
    }

    fn signup(e: AuthError) -> Self {
        let (status, message) = match e {
            AuthError::EmailTaken => (
                StatusCode::CONFLICT,
                "An account with this email already exists. Please try logging in instead.",
            ),
            AuthError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "Registration failed. Please check your input.",
            ),
            _ => return AppError::from(e),
        };
        AppError::Rejected {
            status,
            message: message.to_string(),
            existing_user: matches!(e, AuthError::EmailTaken),
            errors: e.field_errors(),
        }
    }

    fn login(e: AuthError) -> Self {
        match e {
            AuthError::Validation(_)
            | AuthError::InvalidCredentials
            | AuthError::AccountDisabled => AppError::Rejected {
                status: StatusCode::BAD_REQUEST,
                message: "Invalid credentials".to_string(),
                errors: e.field_errors(),
                existing_user: false,
            },
            _ => AppError::from(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken => AppError::Unauthorized {
                message: "Invalid or expired token",
                valid: None,
            },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<HistoryError> for AppError {
    fn from(e: HistoryError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message })).into_response()
            }
            AppError::Unauthorized { message, valid } => (
                StatusCode::UNAUTHORIZED,
                Json(FailureResponse {
                    success: false,
                    valid,
                    message: message.to_string(),
                    errors: FieldErrors::new(),
                    existing_user: false,
                }),
            )
                .into_response(),
            AppError::Rejected {
                status,
                message,
                errors,
                existing_user,
            } => (
                status,
                Json(FailureResponse {
                    success: false,
                    valid: None,
                    message,
                    errors,
                    existing_user,
                }),
            )
                .into_response(),
            AppError::Internal { message } => {
                error!(%message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: format!("Internal server error: {message}"),
                    }),
                )
                    .into_response()
            }
        }
    }
}
