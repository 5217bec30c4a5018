//! In-memory user directory for tests and local runs

use chrono::Utc;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;

use super::{NewUser, User, UserDirectory};
use crate::error::{DatabaseError, DatabaseResult};

#[derive(Debug, Default)]
struct Users {
    by_id: BTreeMap<i64, User>,
    last_id: i64,
}

/// User directory kept in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<Users>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered users
    pub async fn len(&self) -> usize {
        self.users.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        Ok(self.users.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .by_id
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> DatabaseResult<bool> {
        let users = self.users.read().await;
        Ok(users.by_id.values().any(|user| user.username == username))
    }

    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut users = self.users.write().await;

        if users
            .by_id
            .values()
            .any(|user| user.username == new_user.username)
        {
            return Err(DatabaseError::Duplicate(format!(
                "username '{}' already exists",
                new_user.username
            )));
        }

        users.last_id += 1;
        let user = User {
            id: users.last_id,
            username: new_user.username.clone(),
            password_hash: new_user.password_hash.clone(),
            full_name: new_user.full_name.clone(),
            role: new_user.role,
            created_at: Utc::now(),
        };
        users.by_id.insert(user.id, user.clone());

        Ok(user)
    }
}
