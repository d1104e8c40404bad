//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use tracing::warn;

use crate::AppState;
use crate::config::LogoutPolicy;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::bearer_token;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest};

/// `POST /auth/register`: create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<&'static str> {
    let Json(body) = body?;
    state.auth.register(&body.username, &body.password).await?;
    Ok("User register success!")
}

/// `POST /auth/login`: authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(body) = body?;
    let token = state.auth.login(&body.username, &body.password).await?;
    Ok(Json(AuthResponse::bearer(token)))
}

/// `GET /auth/logout`: revoke the bearer token from the request.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<&'static str> {
    let strict = state.logout_policy == LogoutPolicy::Strict;

    match bearer_token(&headers) {
        Some(token) => {
            if let Err(e) = state.auth.logout(token).await {
                if strict {
                    return Err(AppError::Validation(e.to_string()));
                }
                warn!(error = %e, "ignoring invalid token on logout");
            }
        }
        None if strict => {
            return Err(AppError::Validation("Missing bearer token".into()));
        }
        None => warn!("logout without bearer token"),
    }

    Ok("Logged out successfully")
}
