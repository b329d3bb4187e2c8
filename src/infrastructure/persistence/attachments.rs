use crate::domain::entities::Attachment;
use crate::domain::errors::DatabaseResultExt;
use crate::domain::ports::attachment_repository::AttachmentRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::{any::AnyRow, Row};

fn row_to_attachment(row: &AnyRow) -> Result<Attachment, sqlx::Error> {
    Ok(Attachment {
        id: row.try_get("id")?,
        message_id: row.try_get("message_id")?,
        file_name: row.try_get("file_name")?,
        content_type: row.try_get("content_type")?,
        size_bytes: row.try_get("size_bytes")?,
        storage_path: row.try_get("storage_path")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl AttachmentRepository for Database {
    async fn create_attachment(&self, attachment: &Attachment) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO message_attachments
                (id, message_id, file_name, content_type, size_bytes, storage_path, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&attachment.id)
        .bind(&attachment.message_id)
        .bind(&attachment.file_name)
        .bind(&attachment.content_type)
        .bind(attachment.size_bytes)
        .bind(&attachment.storage_path)
        .bind(&attachment.created_at)
        .execute(&self.pool)
        .await
        .op("create_attachment")?;

        Ok(())
    }

    async fn list_message_attachments(&self, message_id: &str) -> ApiResult<Vec<Attachment>> {
        let rows = sqlx::query(
            "SELECT id, message_id, file_name, content_type, size_bytes, storage_path, created_at
             FROM message_attachments
             WHERE message_id = ?
             ORDER BY created_at ASC",
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await
        .op("list_message_attachments")?;

        Ok(rows
            .iter()
            .map(row_to_attachment)
            .collect::<Result<Vec<_>, _>>()
            .op("list_message_attachments")?)
    }
}
