//! Authentication middleware: Bearer token extraction and JWT verification.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use gig_core::models::auth::Identity;

use crate::AppState;
use crate::error::AppError;
use crate::models::TOKEN_TYPE;

/// Identity of the caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

/// Token from `Authorization: Bearer <token>`, if present and non-empty.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(TOKEN_TYPE))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Axum middleware: extracts the bearer token, verifies it (signature,
/// expiry, revocation), and injects `AuthenticatedUser` into request
/// extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;

    let identity = state.auth.verify(token)?;

    request.extensions_mut().insert(AuthenticatedUser(identity));

    Ok(next.run(request).await)
}
