//! Authentication middleware for JWT token validation

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::identity::{Caller, Claims, TokenType};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use std::{env, path::PathBuf, sync::Arc};
use tracing::{debug, warn};

use crate::error::ApiError;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Public key for verifying tokens
    pub public_key: String,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    pub fn from_env() -> Result<Self, String> {
        let public_key = env::var("JWT_PUBLIC_KEY")
            .map_err(|_| "JWT_PUBLIC_KEY environment variable not set".to_string())?;

        Ok(JwtConfig {
            public_key: read_pem(&public_key)?,
        })
    }
}

/// Accept inline PEM, otherwise read the file (CWD first, then the crate root)
fn read_pem(value: &str) -> Result<String, String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    std::fs::read_to_string(value)
        .or_else(|_| {
            let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push(value);
            std::fs::read_to_string(path)
        })
        .map(|pem| pem.trim().to_string())
        .map_err(|e| format!("Failed to read public key file: {}", e))
}

/// Verifies access tokens issued by the auth service
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenVerifier {
    pub fn new(public_key_pem: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    pub fn from_config(config: &JwtConfig) -> Result<Self, jsonwebtoken::errors::Error> {
        Self::new(&config.public_key)
    }

    /// Resolve the caller behind a valid, unexpired access token
    pub fn verify(&self, token: &str) -> Result<Caller, ApiError> {
        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Failed to validate token: {}", e);
                ApiError::Unauthorized
            })?;

        if token_data.claims.token_type != TokenType::Access {
            warn!("Refresh token presented for user {}", token_data.claims.sub);
            return Err(ApiError::Unauthorized);
        }

        Ok(Caller::from(&token_data.claims))
    }
}

/// Authentication middleware
///
/// Inserts the resolved [`Caller`] into the request extensions.
pub async fn auth_middleware(
    State(verifier): State<TokenVerifier>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;

    let caller = verifier.verify(bearer.token())?;
    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}
