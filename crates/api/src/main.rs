use jobportal_api::{config::Config, router, AppState};
use jobportal_core::PgRepository;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobportal_api=info,jobportal_auth=info,tower_http=info".into()),
        )
        .init();

    // Fails fast on a missing DATABASE_URL or JWT_SECRET
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await?;

    info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;

    let repo = Arc::new(PgRepository::new(pool));
    let state = Arc::new(AppState {
        users: repo.clone(),
        jobs: repo,
        jwt: Arc::new(config.jwt),
    });

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server is running on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
