//! Caller identity and token claims
//!
//! The auth service signs [`Claims`]; the tasks service verifies them and
//! turns them into the [`Caller`] every task mutation receives explicitly.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Role of a registered user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Stored and serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// The authenticated actor behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl Caller {
    pub fn new(id: i64, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
        }
    }
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// User ID
    pub uid: i64,
    /// User role
    pub role: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Unique token ID
    pub jti: Uuid,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

impl From<&Claims> for Caller {
    fn from(claims: &Claims) -> Self {
        Caller::new(claims.uid, claims.sub.clone(), claims.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_stored_form() {
        for role in [Role::Admin, Role::User] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn role_serializes_in_upper_case() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"USER\"").unwrap(),
            Role::User
        );
    }

    #[test]
    fn caller_is_built_from_claims() {
        let claims = Claims {
            sub: "alice".to_string(),
            uid: 42,
            role: Role::User,
            iat: 0,
            exp: 60,
            jti: Uuid::new_v4(),
            token_type: TokenType::Access,
        };

        let caller = Caller::from(&claims);
        assert_eq!(caller, Caller::new(42, "alice", Role::User));
    }
}
