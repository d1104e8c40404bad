//! Authentication and authorization logic.
//!
//! Password hashing, JWT issuance and revocation, credential storage, and
//! the register/login/logout orchestration shared by `gig_api`.

pub mod jwt;
pub mod memory;
pub mod password;
pub mod queries;
pub mod revocation;
pub mod service;
pub mod store;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User name is taken.")]
    UserExists,

    #[error("Role not provisioned: {0}")]
    RoleMissing(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
