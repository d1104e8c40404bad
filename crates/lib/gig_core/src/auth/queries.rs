//! Auth-related database queries, exposed as a PostgreSQL [`CredentialStore`].

use async_trait::async_trait;
use sqlx::PgPool;

use super::AuthError;
use super::store::CredentialStore;
use crate::models::auth::{NewUser, Role, User};

/// [`CredentialStore`] backed by the `users`, `roles`, and `user_roles` tables.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Fetch roles for a user.
async fn get_user_roles(pool: &PgPool, user_id: i64) -> Result<Vec<Role>, AuthError> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        "SELECT r.id, r.name FROM roles r \
         JOIN user_roles ur ON ur.role_id = r.id \
         WHERE ur.user_id = $1 \
         ORDER BY r.id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, name)| Role { id, name })
        .collect())
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, password_hash)) = row else {
            return Ok(None);
        };
        let roles = get_user_roles(&self.pool, id).await?;
        Ok(Some(User {
            id,
            username: username.to_string(),
            password_hash,
            roles,
        }))
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn save_user(&self, user: NewUser) -> Result<User, AuthError> {
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AuthError::UserExists
            } else {
                AuthError::DbError(e)
            }
        })?;

        for role in &user.roles {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(role.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(User {
            id: user_id,
            username: user.username,
            password_hash: user.password_hash,
            roles: user.roles,
        })
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AuthError> {
        let row = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id, name)| Role { id, name }))
    }
}
