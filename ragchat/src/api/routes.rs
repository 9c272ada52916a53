//! HTTP handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::JwtAuth;
use super::middleware::AuthenticatedUser;
use super::users::{self, UserError, UserStore};
use crate::chat::ChatOrchestrator;
use crate::error::ChatError;
use ragchat_cache::{CacheStatsReport, HistoryStats};

/// Generic message for failures the client cannot act on
pub const INTERNAL_ERROR_MESSAGE: &str = "An error occurred while processing the request.";

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub chat: Arc<ChatOrchestrator>,
    pub auth: Arc<JwtAuth>,
    pub users: Arc<dyn UserStore>,
    pub token_ttl_hours: i64,
}

/// JSON error body `{status: "error", message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::InvalidInput(message) => ApiError::bad_request(message),
            ChatError::Provider(_) => ApiError::internal(),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidUsername(_) | UserError::InvalidPassword(_) => {
                ApiError::bad_request(err.to_string())
            }
            UserError::AlreadyExists(_) => ApiError::new(StatusCode::CONFLICT, err.to_string()),
            UserError::InvalidCredentials => {
                ApiError::new(StatusCode::UNAUTHORIZED, err.to_string())
            }
            UserError::Hashing(_) | UserError::Storage(_) => {
                warn!("Account operation failed: {}", err);
                ApiError::internal()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterResponse {
    pub status: String,
    pub username: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in_hours: i64,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub status: String,
    pub response: String,
}

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub caches: CacheStatsReport,
    pub conversations: HistoryStats,
}

#[derive(Serialize, Deserialize)]
pub struct ClearResponse {
    pub status: String,
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn register(
    State(state): State<ApiState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(payload) = payload?;
    users::register(state.users.as_ref(), &payload.username, &payload.password).await?;

    info!(user = %payload.username, "Registered user");
    Ok(Json(RegisterResponse {
        status: "registered".to_string(),
        username: payload.username,
    }))
}

/// Exchange a registered username and password for a token
pub async fn login(
    State(state): State<ApiState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    let username = payload.username.as_str();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }

    if let Err(e) = users::authenticate(state.users.as_ref(), username, &payload.password).await {
        if matches!(e, UserError::InvalidCredentials) {
            info!(user = %username, "Rejected login");
        }
        return Err(e.into());
    }

    let token = state
        .auth
        .generate_token(username, Some(state.token_ttl_hours))
        .map_err(|e| {
            warn!("Token generation failed: {}", e);
            ApiError::internal()
        })?;

    info!(user = %username, "Issued token");
    Ok(Json(LoginResponse {
        token,
        expires_in_hours: state.token_ttl_hours,
    }))
}

pub async fn chat(
    State(state): State<ApiState>,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(payload) = payload?;
    let request_id = Uuid::new_v4();
    info!(%request_id, user = %username, "Chat request");

    let response = state.chat.respond(&payload.message, &username).await?;

    Ok(Json(ChatResponse {
        status: "completed".to_string(),
        response,
    }))
}

pub async fn status(State(state): State<ApiState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        caches: state.chat.cache_stats(),
        conversations: state.chat.conversation_stats(),
    })
}

pub async fn clear_conversation(
    State(state): State<ApiState>,
    Extension(AuthenticatedUser(username)): Extension<AuthenticatedUser>,
) -> Json<ClearResponse> {
    state.chat.clear_conversation(&username);
    info!(user = %username, "Conversation cleared");

    Json(ClearResponse {
        status: "cleared".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;

    #[test]
    fn test_chat_errors_map_to_status_codes() {
        let invalid: ApiError = ChatError::InvalidInput("empty".into()).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.message, "empty");

        let provider: ApiError =
            ChatError::Provider(ProviderError::Connection("refused".into())).into();
        assert_eq!(provider.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(provider.message, INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_account_errors_map_to_status_codes() {
        let cases = [
            (UserError::InvalidUsername("short".into()), StatusCode::BAD_REQUEST),
            (UserError::InvalidPassword("short".into()), StatusCode::BAD_REQUEST),
            (UserError::AlreadyExists("ana".into()), StatusCode::CONFLICT),
            (UserError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (UserError::Hashing("salt".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, expected);
        }
    }
}
