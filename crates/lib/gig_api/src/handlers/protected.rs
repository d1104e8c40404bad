//! Token-protected test endpoint.

use axum::Extension;
use tracing::debug;

use crate::middleware::auth::AuthenticatedUser;

/// `GET /test/get`: answers only for a valid, unrevoked token.
pub async fn test_handler(
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> &'static str {
    debug!(username = %identity.username, "authenticated test request");
    "test success"
}
