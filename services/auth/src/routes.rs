//! Authentication service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use common::users::UserDirectory;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    AppState,
    error::{AuthError, AuthResult},
};

/// Response for token generation
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request carrying a refresh token
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request for user registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
}

/// Create the router for the authentication service
pub fn create_router<U>(state: AppState<U>) -> Router
where
    U: UserDirectory + Clone + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register::<U>))
        .route("/auth/login", post(login::<U>))
        .route("/auth/refresh", post(refresh_token::<U>))
        .route("/auth/logout", post(logout::<U>))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

fn internal(context: &'static str) -> impl Fn(anyhow::Error) -> AuthError {
    move |e| {
        error!("{}: {}", context, e);
        AuthError::InternalServerError
    }
}

/// User registration endpoint
pub async fn register<U: UserDirectory>(
    State(state): State<AppState<U>>,
    Json(payload): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Registration request for user: {}", payload.username);

    let user = state
        .accounts
        .register(&payload.username, &payload.password, &payload.full_name)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// User login endpoint
pub async fn login<U: UserDirectory>(
    State(state): State<AppState<U>>,
    Json(payload): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Login attempt for user: {}", payload.username);

    if let Err(ban) = state.rate_limiter.check(&payload.username).await {
        warn!("Login rate limit hit for user: {}", payload.username);
        return Err(AuthError::TooManyRequests {
            retry_after: ban.as_secs(),
        });
    }

    let user = state
        .accounts
        .authenticate(&payload.username, &payload.password)
        .await?;

    let access_token = state
        .jwt_service
        .generate_access_token(&user)
        .map_err(internal("Failed to generate access token"))?;
    let refresh_token = state
        .jwt_service
        .generate_refresh_token(&user)
        .map_err(internal("Failed to generate refresh token"))?;

    state
        .sessions
        .store_session(user.id, &refresh_token)
        .await
        .map_err(internal("Failed to store session in Redis"))?;

    state.rate_limiter.reset(&payload.username).await;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    }))
}

/// Refresh token endpoint
pub async fn refresh_token<U: UserDirectory>(
    State(state): State<AppState<U>>,
    Json(payload): Json<RefreshTokenRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Token refresh request");

    let claims = state
        .jwt_service
        .validate_refresh_token(&payload.refresh_token)
        .map_err(|_| AuthError::Unauthorized)?;

    let is_blacklisted = state
        .jwt_service
        .is_token_blacklisted(&state.redis_pool, &payload.refresh_token)
        .await
        .map_err(internal("Failed to check if token is blacklisted"))?;
    if is_blacklisted {
        return Err(AuthError::Unauthorized);
    }

    let is_current = state
        .sessions
        .is_session_valid(claims.uid, &payload.refresh_token)
        .await
        .map_err(internal("Failed to read session from Redis"))?;
    if !is_current {
        warn!("Refresh token is not the current session of user {}", claims.uid);
        return Err(AuthError::Unauthorized);
    }

    let user = state
        .accounts
        .users()
        .find_by_id(claims.uid)
        .await
        .map_err(|e| {
            error!("Failed to load user {}: {}", claims.uid, e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::Unauthorized)?;

    let access_token = state
        .jwt_service
        .generate_access_token(&user)
        .map_err(internal("Failed to generate access token"))?;

    let new_refresh_token = state
        .jwt_service
        .rotate_refresh_token(&state.redis_pool, &user, &payload.refresh_token)
        .await
        .map_err(internal("Failed to rotate refresh token"))?;

    state
        .sessions
        .store_session(user.id, &new_refresh_token)
        .await
        .map_err(internal("Failed to update session in Redis"))?;

    Ok(Json(TokenResponse {
        access_token,
        refresh_token: new_refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
    }))
}

/// Logout endpoint
pub async fn logout<U: UserDirectory>(
    State(state): State<AppState<U>>,
    Json(payload): Json<RefreshTokenRequest>,
) -> AuthResult<impl IntoResponse> {
    info!("Logout request");

    let claims = state
        .jwt_service
        .validate_refresh_token(&payload.refresh_token)
        .map_err(|_| AuthError::Unauthorized)?;

    state
        .jwt_service
        .blacklist_token(&state.redis_pool, &payload.refresh_token, claims.exp)
        .await
        .map_err(internal("Failed to blacklist token"))?;

    state
        .sessions
        .delete_session(claims.uid)
        .await
        .map_err(internal("Failed to remove session from Redis"))?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Logged out successfully"})),
    ))
}
