use crate::application::services::*;
use crate::config::Config;
use crate::domain::ports::*;
use crate::infrastructure::http::middleware::AppState;
use crate::infrastructure::persistence::Database;
use crate::infrastructure::providers::OpenAiClient;
use crate::shared::SignInRateLimiter;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Wire every service against `db` and the configured OpenAI-compatible provider.
pub fn build_app_state(db: Database, config: &Config) -> anyhow::Result<AppState> {
    let client = Arc::new(
        OpenAiClient::new(
            config.llm_api_url.clone(),
            config.llm_api_key.clone(),
            config.chat_model.clone(),
            config.embedding_model.clone(),
            Duration::from_secs(config.ai_timeout_secs.max(1)),
        )
        .context("failed to build LLM client")?,
    );

    if config.llm_api_key.is_none() {
        tracing::warn!("LLM_API_KEY is not set; AI replies and doc search will fail");
    }

    Ok(build_app_state_with_providers(
        db,
        config,
        client.clone(),
        client,
    ))
}

/// Same wiring with caller-supplied model providers.
pub fn build_app_state_with_providers(
    db: Database,
    config: &Config,
    chat: Arc<dyn ChatModel>,
    embedder: Arc<dyn EmbeddingModel>,
) -> AppState {
    let user_repo: Arc<dyn UserRepository> = Arc::new(db.clone());
    let session_repo: Arc<dyn SessionRepository> = Arc::new(db.clone());
    let ticket_repo: Arc<dyn TicketRepository> = Arc::new(db.clone());
    let message_repo: Arc<dyn MessageRepository> = Arc::new(db.clone());
    let attachment_repo: Arc<dyn AttachmentRepository> = Arc::new(db.clone());
    let document_repo: Arc<dyn DocumentRepository> = Arc::new(db);

    let auth_service = AuthService::new(
        user_repo.clone(),
        session_repo,
        SignInRateLimiter::new(),
        config.session_duration_hours,
    );
    let user_service = UserService::new(user_repo.clone());
    let ticket_service = TicketService::new(
        ticket_repo.clone(),
        message_repo.clone(),
        user_repo.clone(),
    );
    let message_service =
        MessageService::new(message_repo.clone(), ticket_repo, attachment_repo);
    let document_service = DocumentService::new(
        document_repo,
        embedder,
        config.docs_path.clone(),
        config.search_match_threshold,
        config.search_match_count,
    );
    let ai_service = AiService::new(
        ticket_service.clone(),
        document_service.clone(),
        message_repo,
        user_repo,
        chat,
        Duration::from_secs(config.ai_timeout_secs.max(1)),
    );

    AppState {
        session_duration_hours: config.session_duration_hours,
        cookie_secure: config.cookie_secure,
        auth_service,
        user_service,
        ticket_service,
        message_service,
        document_service,
        ai_service,
    }
}

/// Create the admin account named by `ADMIN_EMAIL`/`ADMIN_PASSWORD` if it does not exist.
pub async fn initialize_admin(state: &AppState, config: &Config) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        tracing::info!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin bootstrap");
        return Ok(());
    };

    let created = state
        .auth_service
        .ensure_admin(email, password)
        .await
        .map_err(|e| anyhow::anyhow!("failed to create admin account: {}", e))?;

    if created {
        tracing::info!(%email, "admin account created");
    } else {
        tracing::debug!(%email, "admin account already exists");
    }
    Ok(())
}

/// Purge expired sessions every hour for the life of the process.
pub fn spawn_session_cleanup(auth_service: AuthService) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut cleanup_interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        tracing::info!("session cleanup task started (1-hour interval)");

        loop {
            cleanup_interval.tick().await;

            match auth_service.cleanup_expired_sessions().await {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "expired sessions removed"),
                Err(e) => tracing::error!("session cleanup failed: {}", e),
            }
        }
    })
}
