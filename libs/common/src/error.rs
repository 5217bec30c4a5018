//! Storage error types shared by the services
//!
//! Every repository in the workspace reports failures through
//! [`DatabaseError`] so the service layers can map them onto their own
//! client-facing error kinds.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A unique constraint rejected the write
    #[error("Duplicate value: {0}")]
    Duplicate(String),

    /// A stored value could not be mapped back onto its domain type
    #[error("Failed to decode stored value: {0}")]
    Decode(String),
}

impl DatabaseError {
    /// Classify a query error, singling out unique-constraint violations
    pub fn from_query(error: SqlxError) -> Self {
        let duplicate = error
            .as_database_error()
            .filter(|db_error| db_error.is_unique_violation())
            .map(|db_error| db_error.message().to_string());

        match duplicate {
            Some(message) => DatabaseError::Duplicate(message),
            None => DatabaseError::Query(error),
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
