use anyhow::{Context, Result};
use common::{
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    users::PgUserDirectory,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tasks::{
    middleware::{JwtConfig, TokenVerifier},
    repositories::PgTaskStore,
    routes,
    service::TaskService,
    settings::Settings,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting tasks service");

    let settings = Settings::from_env().context("Failed to load tasks settings")?;

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

    let jwt_config = JwtConfig::from_env().map_err(anyhow::Error::msg)?;
    let verifier = TokenVerifier::from_config(&jwt_config).context("Invalid JWT public key")?;

    let task_service = TaskService::new(PgTaskStore::new(pool.clone()), PgUserDirectory::new(pool));
    let app_state = AppState::new(task_service, verifier, settings.clone());

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&settings.bind_address).await?;
    info!("Tasks service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
