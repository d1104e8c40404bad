//! In-memory credential store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::AuthError;
use super::store::CredentialStore;
use crate::models::auth::{NewUser, Role, User};

/// [`CredentialStore`] kept in process memory. Data is lost on restart.
#[derive(Debug)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
    roles: HashMap<String, Role>,
    next_user_id: AtomicI64,
}

impl MemoryCredentialStore {
    /// Store with the given role names provisioned (ids assigned from 1).
    pub fn with_roles<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let name = name.into();
                let role = Role {
                    id: i as i64 + 1,
                    name: name.clone(),
                };
                (name, role)
            })
            .collect();
        Self {
            users: RwLock::new(HashMap::new()),
            roles,
            next_user_id: AtomicI64::new(1),
        }
    }

    /// Number of stored users.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.users.read().await.contains_key(username))
    }

    async fn save_user(&self, user: NewUser) -> Result<User, AuthError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(AuthError::UserExists);
        }
        let stored = User {
            id: self.next_user_id.fetch_add(1, Ordering::Relaxed),
            username: user.username,
            password_hash: user.password_hash,
            roles: user.roles,
        };
        users.insert(stored.username.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AuthError> {
        Ok(self.roles.get(name).cloned())
    }
}
