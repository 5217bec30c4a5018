//! Account registration and credential checks

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use common::{
    error::DatabaseError,
    identity::Role,
    users::{NewUser, User, UserDirectory},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::validation::{validate_full_name, validate_password, validate_username};

#[derive(Error, Debug)]
pub enum AccountError {
    /// Username already registered
    #[error("Username '{0}' is already taken")]
    Conflict(String),

    #[error("{0}")]
    InvalidArgument(String),

    /// Unknown user or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type AccountResult<T> = Result<T, AccountError>;

/// Registration and authentication over a user directory
#[derive(Clone)]
pub struct AccountService<U> {
    users: U,
}

impl<U: UserDirectory> AccountService<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    /// Register a new user with role USER
    ///
    /// A taken username is reported before the password is looked at.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        full_name: &str,
    ) -> AccountResult<User> {
        validate_username(username).map_err(AccountError::InvalidArgument)?;

        if self.users.exists_by_username(username).await? {
            warn!("Registration rejected, username taken: {}", username);
            return Err(AccountError::Conflict(username.to_string()));
        }

        validate_password(password).map_err(AccountError::InvalidArgument)?;
        validate_full_name(full_name).map_err(AccountError::InvalidArgument)?;

        let salt = SaltString::generate(&mut rand::thread_rng());
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AccountError::Hashing(e.to_string()))?
            .to_string();

        let new_user = NewUser {
            username: username.to_string(),
            password_hash,
            full_name: full_name.trim().to_string(),
            role: Role::User,
        };

        let user = self.users.create(&new_user).await.map_err(|e| match e {
            // Lost a registration race after the existence check
            DatabaseError::Duplicate(_) => AccountError::Conflict(username.to_string()),
            other => AccountError::Database(other),
        })?;

        info!("Registered user {} with id {}", user.username, user.id);
        Ok(user)
    }

    /// Check a username and password pair
    pub async fn authenticate(&self, username: &str, password: &str) -> AccountResult<User> {
        let Some(user) = self.users.find_by_username(username).await? else {
            warn!("Login for unknown user: {}", username);
            return Err(AccountError::InvalidCredentials);
        };

        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| AccountError::Hashing(format!("Failed to parse password hash: {}", e)))?;

        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_err()
        {
            warn!("Wrong password for user: {}", username);
            return Err(AccountError::InvalidCredentials);
        }

        Ok(user)
    }
}
