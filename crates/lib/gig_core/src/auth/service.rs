//! Register / login / logout orchestration.

use std::sync::Arc;

use tracing::{info, warn};

use super::AuthError;
use super::jwt::TokenService;
use super::password::PasswordHasher;
use super::store::CredentialStore;
use crate::models::auth::{DEFAULT_ROLE, Identity, NewUser};

/// Authentication flows over explicitly injected collaborators.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenService,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    /// The token service used for issuing and verifying tokens.
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Fail with [`AuthError::RoleMissing`] unless the default role exists.
    ///
    /// Meant to be called once at startup.
    pub async fn ensure_default_role(&self) -> Result<(), AuthError> {
        match self.store.find_role_by_name(DEFAULT_ROLE).await? {
            Some(_) => Ok(()),
            None => Err(AuthError::RoleMissing(DEFAULT_ROLE.to_string())),
        }
    }

    /// Create a user with the default role.
    ///
    /// The username is stored without surrounding whitespace.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("username must not be empty".into()));
        }
        if password.is_empty() {
            return Err(AuthError::Validation("password must not be empty".into()));
        }

        if self.store.exists_by_username(username).await? {
            return Err(AuthError::UserExists);
        }

        let role = self
            .store
            .find_role_by_name(DEFAULT_ROLE)
            .await?
            .ok_or_else(|| AuthError::RoleMissing(DEFAULT_ROLE.to_string()))?;

        let password_hash = self.hasher.hash(password)?;
        let user = self
            .store
            .save_user(NewUser {
                username: username.to_string(),
                password_hash,
                roles: vec![role],
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(())
    }

    /// Check credentials and issue an access token.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let username = username.trim();
        let Some(user) = self.store.find_user_by_username(username).await? else {
            warn!(username, "login failed: unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            warn!(username, "login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue_token(&user.username, &user.role_names())?;
        info!(user_id = user.id, username = %user.username, "user logged in");
        Ok(token)
    }

    /// Revoke a token so it no longer verifies.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.tokens.revoke_token(token)?;
        info!("token revoked");
        Ok(())
    }

    /// Verify a token and return its identity.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.tokens.verify_token(token)
    }
}
