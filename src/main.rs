use anyhow::Context;
use autocrm::bootstrap;
use autocrm::config::Config;
use autocrm::infrastructure::http::build_router;
use autocrm::infrastructure::observability;
use autocrm::infrastructure::persistence::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let _guard = observability::init(&config)?;
    tracing::info!("configuration loaded");

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    db.run_migrations()
        .await
        .context("failed to run migrations")?;
    tracing::info!("database ready");

    let state = bootstrap::build_app_state(db, &config)?;
    bootstrap::initialize_admin(&state, &config).await?;
    bootstrap::spawn_session_cleanup(state.auth_service.clone());

    let app = build_router(state);

    let addr = config.server_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
