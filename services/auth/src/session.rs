//! Session management using Redis
//!
//! A user has at most one live session: the refresh token most recently
//! issued to them, stored under `session:<user id>`.

use anyhow::Result;
use common::cache::RedisPool;
use tracing::info;

/// Session manager for handling user sessions in Redis
#[derive(Clone)]
pub struct SessionManager {
    redis_pool: RedisPool,
    ttl_seconds: u64,
}

fn session_key(user_id: i64) -> String {
    format!("session:{}", user_id)
}

impl SessionManager {
    /// Create a new session manager whose sessions live `ttl_seconds`
    pub fn new(redis_pool: RedisPool, ttl_seconds: u64) -> Self {
        Self {
            redis_pool,
            ttl_seconds,
        }
    }

    /// Store `refresh_token` as the user's session, replacing any previous one
    pub async fn store_session(&self, user_id: i64, refresh_token: &str) -> Result<()> {
        info!("Storing session for user: {}", user_id);

        self.redis_pool
            .set(&session_key(user_id), refresh_token, Some(self.ttl_seconds))
            .await
    }

    /// Get a session for a user
    pub async fn get_session(&self, user_id: i64) -> Result<Option<String>> {
        self.redis_pool.get(&session_key(user_id)).await
    }

    /// Delete a session for a user
    pub async fn delete_session(&self, user_id: i64) -> Result<()> {
        info!("Deleting session for user: {}", user_id);

        self.redis_pool.delete(&session_key(user_id)).await
    }

    /// Check if `refresh_token` is the user's current session
    pub async fn is_session_valid(&self, user_id: i64, refresh_token: &str) -> Result<bool> {
        let stored_token = self.get_session(user_id).await?;

        Ok(stored_token.as_deref() == Some(refresh_token))
    }

    /// Get Redis health status
    pub async fn health_check(&self) -> Result<bool> {
        self.redis_pool.health_check().await
    }
}
