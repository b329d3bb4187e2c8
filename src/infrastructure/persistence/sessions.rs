use crate::domain::entities::Session;
use crate::domain::errors::DatabaseResultExt;
use crate::domain::ports::session_repository::SessionRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::Database;
use crate::shared::utils::now_rfc3339;
use sqlx::{any::AnyRow, Row};

fn row_to_session(row: &AnyRow) -> Result<Session, sqlx::Error> {
    Ok(Session {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        token: row.try_get("token")?,
        expires_at: row.try_get("expires_at")?,
        created_at: row.try_get("created_at")?,
        last_accessed_at: row.try_get("last_accessed_at")?,
    })
}

#[async_trait::async_trait]
impl SessionRepository for Database {
    async fn create_session(&self, session: &Session) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token, expires_at, created_at, last_accessed_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.token)
        .bind(&session.expires_at)
        .bind(&session.created_at)
        .bind(&session.last_accessed_at)
        .execute(&self.pool)
        .await
        .op("create_session")?;

        Ok(())
    }

    async fn get_session_by_token(&self, token: &str) -> ApiResult<Option<Session>> {
        let row = sqlx::query(
            "SELECT id, user_id, token, expires_at, created_at, last_accessed_at
             FROM sessions
             WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .op("get_session_by_token")?;

        Ok(row
            .as_ref()
            .map(row_to_session)
            .transpose()
            .op("get_session_by_token")?)
    }

    async fn delete_session(&self, token: &str) -> ApiResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .op("delete_session")?;

        Ok(())
    }

    async fn touch_session(
        &self,
        token: &str,
        expires_at: &str,
        last_accessed_at: &str,
    ) -> ApiResult<()> {
        sqlx::query("UPDATE sessions SET expires_at = ?, last_accessed_at = ? WHERE token = ?")
            .bind(expires_at)
            .bind(last_accessed_at)
            .bind(token)
            .execute(&self.pool)
            .await
            .op("touch_session")?;

        Ok(())
    }

    async fn cleanup_expired_sessions(&self) -> ApiResult<u64> {
        // Timestamps are fixed-width RFC 3339, so text comparison is chronological
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now_rfc3339())
            .execute(&self.pool)
            .await
            .op("cleanup_expired_sessions")?;

        Ok(result.rows_affected())
    }
}
