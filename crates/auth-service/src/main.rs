use auth_service::config::{Config, KEY_ROTATION_INTERVAL_DAYS};
use auth_service::handlers::AppState;
use auth_service::routes;
use auth_service::services::key_rotation;
use auth_service::tasks::Scheduler;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting auth service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    // Initialize database connection pool
    info!("Connecting to database...");
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    info!("Database connection established");

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| {
            error!("Failed to run migrations: {}", e);
            e
        })?;

    // A fresh deployment has no signing key; create one so login works
    // before the first scheduled rotation.
    key_rotation::ensure_bootstrap_key(&db_pool).await.map_err(|e| {
        error!("Failed to initialize signing key: {}", e);
        e
    })?;

    info!("Signing keys initialized");

    // Start the weekly rotation task
    let cancel_token = CancellationToken::new();
    let mut scheduler = Scheduler::new();
    let rotation_pool = db_pool.clone();
    scheduler.register(
        "key_rotation",
        Duration::from_secs(KEY_ROTATION_INTERVAL_DAYS as u64 * 24 * 60 * 60),
        move || {
            let pool = rotation_pool.clone();
            async move { key_rotation::rotate(&pool).await }
        },
    );
    let task_handles = scheduler.spawn(cancel_token.clone());

    // Parse bind address before moving config
    let bind_address = config.bind_address.clone();

    let state = Arc::new(AppState {
        pool: db_pool,
        config,
    });

    let app = routes::build_routes(state);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Auth service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Server stopped; wind down background tasks
    cancel_token.cancel();
    for handle in task_handles {
        if let Err(e) = handle.await {
            error!("Background task panicked during shutdown: {}", e);
        }
    }

    info!("Auth service stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
