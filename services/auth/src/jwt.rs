//! JWT service for token generation, validation, and management
//!
//! This module provides functionality for creating and validating JWT tokens
//! using the RS256 algorithm, as well as refresh token rotation and
//! token blacklisting using Redis.

use anyhow::Result;
use common::{
    cache::RedisPool,
    identity::{Claims, TokenType},
    users::User,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::{
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::info;
use uuid::Uuid;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Private key for signing tokens
    pub private_key: String,
    /// Public key for verifying tokens
    pub public_key: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

/// Inline PEM, or a path tried against the CWD and then the crate root
fn read_key(value: String, name: &str) -> Result<String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value);
    }

    std::fs::read_to_string(&value)
        .or_else(|_| {
            let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push(&value);
            std::fs::read_to_string(path)
        })
        .map(|pem| pem.trim().to_string())
        .map_err(|e| anyhow::anyhow!("Failed to read {} file: {}", name, e))
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PRIVATE_KEY`: Private key for signing tokens (PEM format) or path to private key file
    /// - `JWT_PUBLIC_KEY`: Public key for verifying tokens (PEM format) or path to public key file
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let private_key = std::env::var("JWT_PRIVATE_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PRIVATE_KEY environment variable not set"))?;
        let public_key = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PUBLIC_KEY environment variable not set"))?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()
            .unwrap_or(604800);

        Ok(JwtConfig {
            private_key: read_key(private_key, "private key")?,
            public_key: read_key(public_key, "public key")?,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

fn now_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs())
}

fn blacklist_key(token: &str) -> String {
    format!("blacklisted_token:{}", token)
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    access_token_expiry: u64,
    refresh_token_expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;
        let decoding_key = DecodingKey::from_rsa_pem(config.public_key.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(JwtService {
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
        })
    }

    fn issue(&self, user: &User, token_type: TokenType, lifetime: u64) -> Result<String> {
        let now = now_secs()?;

        let claims = Claims {
            sub: user.username.clone(),
            uid: user.id,
            role: user.role,
            iat: now,
            exp: now + lifetime,
            jti: Uuid::new_v4(),
            token_type,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        self.issue(user, TokenType::Access, self.access_token_expiry)
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user: &User) -> Result<String> {
        self.issue(user, TokenType::Refresh, self.refresh_token_expiry)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Validate a token and require it to be a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(anyhow::anyhow!("Token is not a refresh token"));
        }
        Ok(claims)
    }

    /// Check if a token is blacklisted in Redis
    pub async fn is_token_blacklisted(&self, redis_pool: &RedisPool, token: &str) -> Result<bool> {
        let result = redis_pool.get(&blacklist_key(token)).await?;
        Ok(result.is_some())
    }

    /// Blacklist a token in Redis for its remaining lifetime
    pub async fn blacklist_token(&self, redis_pool: &RedisPool, token: &str, exp: u64) -> Result<()> {
        let remaining = exp.saturating_sub(now_secs()?);
        if remaining == 0 {
            // Expired tokens already fail validation
            return Ok(());
        }

        redis_pool
            .set(&blacklist_key(token), "1", Some(remaining))
            .await?;
        Ok(())
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.access_token_expiry
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.refresh_token_expiry
    }

    /// Rotate a refresh token
    ///
    /// Blacklists the old refresh token and issues a new one for `user`.
    pub async fn rotate_refresh_token(
        &self,
        redis_pool: &RedisPool,
        user: &User,
        old_refresh_token: &str,
    ) -> Result<String> {
        let claims = self.validate_refresh_token(old_refresh_token)?;

        if claims.uid != user.id {
            return Err(anyhow::anyhow!("Token does not belong to user"));
        }

        self.blacklist_token(redis_pool, old_refresh_token, claims.exp)
            .await?;
        info!("Rotated refresh token for user {}", user.id);

        self.generate_refresh_token(user)
    }
}
