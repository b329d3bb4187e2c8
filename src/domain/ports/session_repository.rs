use crate::domain::entities::Session;
use crate::infrastructure::http::middleware::error::ApiResult;

#[async_trait::async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, session: &Session) -> ApiResult<()>;
    async fn get_session_by_token(&self, token: &str) -> ApiResult<Option<Session>>;
    async fn delete_session(&self, token: &str) -> ApiResult<()>;
    /// Slide a session's expiry and record the access time.
    async fn touch_session(
        &self,
        token: &str,
        expires_at: &str,
        last_accessed_at: &str,
    ) -> ApiResult<()>;
    async fn cleanup_expired_sessions(&self) -> ApiResult<u64>;
}
