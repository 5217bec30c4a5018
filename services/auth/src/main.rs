use anyhow::Result;
use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    users::PgUserDirectory,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod accounts;
mod error;
mod jwt;
mod rate_limiter;
mod routes;
mod session;
mod validation;

use crate::{
    accounts::AccountService,
    jwt::{JwtConfig, JwtService},
    rate_limiter::{RateLimiter, RateLimiterConfig},
    session::SessionManager,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<U> {
    pub accounts: AccountService<U>,
    pub redis_pool: RedisPool,
    pub jwt_service: JwtService,
    pub sessions: SessionManager,
    pub rate_limiter: RateLimiter,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config)?;

    // Initialize Redis connection pool
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    let sessions = SessionManager::new(redis_pool.clone(), jwt_service.refresh_token_expiry());
    match sessions.health_check().await {
        Ok(true) => info!("Redis connection successful"),
        _ => warn!("Redis is not reachable, logins will fail until it is"),
    }

    let app_state = AppState {
        accounts: AccountService::new(PgUserDirectory::new(pool)),
        redis_pool,
        jwt_service,
        sessions,
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_address =
        std::env::var("AUTH_BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_address).await?;
    info!("Authentication service listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
