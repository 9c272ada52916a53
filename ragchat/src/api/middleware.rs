//! Bearer-token guard for the chat routes

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::auth::{AuthError, JwtAuth};
use super::routes::{ApiError, ApiState};

/// Username taken from a validated token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

/// Reject requests without a valid token; otherwise attach the caller
pub async fn auth_middleware(
    State(state): State<ApiState>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = match authenticate(&state, &request) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Rejected request: {}", e);
            return ApiError::unauthorized().into_response();
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser(claims.sub));

    next.run(request).await
}

fn authenticate(state: &ApiState, request: &Request) -> Result<super::auth::Claims, AuthError> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader)?;

    let token = JwtAuth::extract_bearer_token(header)?;
    state.auth.validate_token(token)
}
