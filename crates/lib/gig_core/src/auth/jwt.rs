//! JWT token issuance, verification, and revocation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{debug, info};

use super::AuthError;
use super::revocation::RevocationList;
use crate::models::auth::{Identity, TokenClaims};
use crate::uuid::uuidv7;

/// Default access token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Longest accepted access token lifetime: 10 years.
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Issues, verifies, and revokes HS256 access tokens.
///
/// Cloning is cheap; clones share the same revocation list.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    revocations: Arc<RevocationList>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .field("revoked", &self.revocations.len())
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Token service with the default 24h lifetime.
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, Duration::seconds(DEFAULT_TOKEN_TTL_SECS))
    }

    /// Token service whose tokens expire `ttl` after issue.
    ///
    /// A lifetime that pushes `exp` past the representable range makes
    /// `issue_token` fail with [`AuthError::Internal`].
    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            revocations: Arc::new(RevocationList::new()),
        }
    }

    /// Shared revocation list, for the background sweeper.
    pub fn revocations(&self) -> Arc<RevocationList> {
        Arc::clone(&self.revocations)
    }

    /// Issue a signed token for `username` carrying `roles`.
    pub fn issue_token(&self, username: &str, roles: &[String]) -> Result<String, AuthError> {
        self.issue_token_at(username, roles, Utc::now())
    }

    pub(crate) fn issue_token_at(
        &self,
        username: &str,
        roles: &[String],
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Internal("token expiry out of range".into()))?;
        let claims = TokenClaims {
            sub: username.to_string(),
            roles: roles.to_vec(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: uuidv7().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify signature, expiry, and revocation; return the token's identity.
    pub fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.decode_claims(token, true)?;
        if self.revocations.is_revoked(&claims.jti) {
            return Err(AuthError::InvalidToken("token has been revoked".into()));
        }
        Ok(claims.into())
    }

    /// Add a token to the revocation list for its remaining lifetime.
    ///
    /// Fails only when the token is malformed or its signature is wrong.
    /// Revoking twice, or revoking an already-expired token, is a no-op.
    pub fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.decode_claims(token, false)?;
        if claims.exp < Utc::now().timestamp() {
            debug!(jti = %claims.jti, "token already expired, nothing to revoke");
            return Ok(());
        }
        self.revocations.revoke(&claims.jti, claims.exp);
        Ok(())
    }

    fn decode_claims(&self, token: &str, validate_exp: bool) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = validate_exp;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    load_or_create_secret(&jwt_secret_path())
}

/// Read the secret persisted at `path`, generating and writing one if absent.
pub fn load_or_create_secret(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(path, &secret);
    info!(path = %path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gigadventure")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn service() -> TokenService {
        TokenService::new(SECRET)
    }

    fn roles() -> Vec<String> {
        vec!["USER".to_string()]
    }

    #[test]
    fn issued_token_verifies_to_username() {
        let svc = service();
        let token = svc.issue_token("alice", &roles()).unwrap();
        let identity = svc.verify_token(&token).unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.roles, roles());
    }

    #[test]
    fn each_token_gets_a_fresh_id() {
        let svc = service();
        let a = svc.issue_token("alice", &roles()).unwrap();
        let b = svc.issue_token("alice", &roles()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = TokenService::new(b"other").issue_token("alice", &roles()).unwrap();
        let err = service().verify_token(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            service().verify_token("not.a.jwt"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected_without_revocation() {
        let svc = TokenService::with_ttl(SECRET, Duration::seconds(60));
        let token = svc
            .issue_token_at("alice", &roles(), Utc::now() - Duration::seconds(120))
            .unwrap();
        assert!(matches!(
            svc.verify_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn unrepresentable_expiry_is_an_error_not_a_panic() {
        let svc = TokenService::with_ttl(SECRET, Duration::seconds(9_000_000_000_000));
        assert!(matches!(
            svc.issue_token("alice", &roles()),
            Err(AuthError::Internal(_))
        ));
    }

    #[test]
    fn max_ttl_still_issues_verifiable_tokens() {
        let svc = TokenService::with_ttl(SECRET, Duration::seconds(MAX_TOKEN_TTL_SECS));
        let token = svc.issue_token("alice", &roles()).unwrap();
        assert_eq!(svc.verify_token(&token).unwrap().username, "alice");
    }

    #[test]
    fn revoked_token_fails_verification() {
        let svc = service();
        let token = svc.issue_token("alice", &roles()).unwrap();
        svc.revoke_token(&token).unwrap();
        assert!(matches!(
            svc.verify_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn revocation_is_shared_between_clones() {
        let svc = service();
        let other = svc.clone();
        let token = svc.issue_token("alice", &roles()).unwrap();
        other.revoke_token(&token).unwrap();
        assert!(svc.verify_token(&token).is_err());
    }

    #[test]
    fn revoking_twice_is_a_no_op() {
        let svc = service();
        let token = svc.issue_token("alice", &roles()).unwrap();
        svc.revoke_token(&token).unwrap();
        svc.revoke_token(&token).unwrap();
        assert_eq!(svc.revocations().len(), 1);
    }

    #[test]
    fn revoking_expired_token_records_nothing() {
        let svc = TokenService::with_ttl(SECRET, Duration::seconds(60));
        let token = svc
            .issue_token_at("alice", &roles(), Utc::now() - Duration::seconds(120))
            .unwrap();
        svc.revoke_token(&token).unwrap();
        assert!(svc.revocations().is_empty());
    }

    #[test]
    fn revoking_malformed_token_fails() {
        assert!(matches!(
            service().revoke_token("garbage"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn other_tokens_survive_a_revocation() {
        let svc = service();
        let a = svc.issue_token("alice", &roles()).unwrap();
        let b = svc.issue_token("alice", &roles()).unwrap();
        svc.revoke_token(&a).unwrap();
        assert!(svc.verify_token(&b).is_ok());
    }

    #[test]
    fn secret_is_generated_then_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jwt-secret");
        let first = load_or_create_secret(&path);
        assert_eq!(first.len(), 64);
        assert_eq!(load_or_create_secret(&path), first);
    }

    #[test]
    fn persisted_secret_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jwt-secret");
        std::fs::write(&path, "  abc123\n").unwrap();
        assert_eq!(load_or_create_secret(&path), "abc123");
    }
}
