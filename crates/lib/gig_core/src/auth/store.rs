//! Credential store abstraction over user and role persistence.

use async_trait::async_trait;

use super::AuthError;
use crate::models::auth::{NewUser, Role, User};

/// Persistence for users and their roles.
///
/// `save_user` must reject a duplicate username with
/// [`AuthError::UserExists`] atomically, even when `exists_by_username` was
/// checked first by a racing request.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch a user, with roles, by username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    /// Check whether a username is already registered.
    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError>;

    /// Insert a user, returning it with its store-assigned id.
    async fn save_user(&self, user: NewUser) -> Result<User, AuthError>;

    /// Look up a provisioned role by name.
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AuthError>;
}
