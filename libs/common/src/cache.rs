//! Redis cache module
//!
//! This module provides functionality for connecting to Redis and performing
//! the key/value operations the auth service needs for refresh-token
//! sessions and the token blacklist: get, set with TTL, delete.

use anyhow::Result;
use redis::{AsyncCommands, Client};
use tracing::info;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        Ok(RedisConfig { url })
    }
}

/// Redis connection pool
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    /// Initialize a new Redis connection pool
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool { client })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// Set a key-value pair in Redis with optional TTL
    ///
    /// A zero TTL would be rejected by Redis, so it is stored without expiry.
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<()> {
        let mut conn = self.get_connection().await?;

        match ttl_seconds {
            Some(ttl) if ttl > 0 => {
                let _: () = conn.set_ex(key, value, ttl).await?;
            }
            _ => {
                let _: () = conn.set(key, value).await?;
            }
        }

        Ok(())
    }

    /// Get a value from Redis by key
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Delete a key from Redis
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(key).await?;
        Ok(())
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_redis_config_defaults() {
        unsafe {
            std::env::remove_var("REDIS_URL");
        }

        let config = RedisConfig::from_env().unwrap();
        assert_eq!(config.url, "redis://localhost:6379");
    }

    #[test]
    #[serial]
    fn test_redis_config_only_reads_url() {
        unsafe {
            std::env::set_var("REDIS_URL", "redis://cache:6380");
            std::env::set_var("REDIS_MAX_CONNECTIONS", "not-a-number");
        }

        let config = RedisConfig::from_env().unwrap();
        assert_eq!(config.url, "redis://cache:6380");

        unsafe {
            std::env::remove_var("REDIS_URL");
            std::env::remove_var("REDIS_MAX_CONNECTIONS");
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let config = RedisConfig {
            url: "not a url".to_string(),
        };

        assert!(RedisPool::new(&config).await.is_err());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_set_get_delete() -> Result<()> {
        let pool = RedisPool::new(&RedisConfig::from_env()?).await?;
        assert!(pool.health_check().await?);

        let key = "test_key";
        pool.set(key, "test_value", Some(5)).await?;
        assert_eq!(pool.get(key).await?, Some("test_value".to_string()));

        pool.delete(key).await?;
        assert_eq!(pool.get(key).await?, None);

        Ok(())
    }
}
