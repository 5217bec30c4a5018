//! User directory
//!
//! Stores user identity (username, password hash, full name, role) and
//! resolves identity-to-id lookups for both services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::{error::DatabaseResult, identity::Role};

mod in_memory;
mod postgres;

pub use in_memory::InMemoryUserDirectory;
pub use postgres::PgUserDirectory;

/// User entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// New user creation payload, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
}

/// Lookup and registration of users
pub trait UserDirectory: Send + Sync {
    /// Find a user by ID
    fn find_by_id(&self, id: i64) -> impl Future<Output = DatabaseResult<Option<User>>> + Send;

    /// Find a user by username
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = DatabaseResult<Option<User>>> + Send;

    /// Check whether a username is already taken
    fn exists_by_username(&self, username: &str)
    -> impl Future<Output = DatabaseResult<bool>> + Send;

    /// Persist a new user; a taken username yields `DatabaseError::Duplicate`
    fn create(&self, new_user: &NewUser) -> impl Future<Output = DatabaseResult<User>> + Send;
}
