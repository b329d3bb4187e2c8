use crate::domain::entities::{field_map_from_json, field_map_to_json, Message};
use crate::domain::errors::{decode_error, DatabaseResultExt};
use crate::domain::ports::message_repository::MessageRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::{any::AnyRow, Any, QueryBuilder, Row};

const MESSAGE_COLUMNS: &str = "id, ticket_id, user_id, content, visibility, message_type, \
     is_ai_generated, metadata, created_at, updated_at";

fn row_to_message(row: &AnyRow) -> Result<Message, sqlx::Error> {
    let visibility: String = row.try_get("visibility")?;
    let message_type: String = row.try_get("message_type")?;
    let is_ai_generated: i64 = row.try_get("is_ai_generated")?;
    let metadata: String = row.try_get("metadata")?;

    Ok(Message {
        id: row.try_get("id")?,
        ticket_id: row.try_get("ticket_id")?,
        user_id: row.try_get("user_id")?,
        content: row.try_get("content")?,
        visibility: visibility.parse().map_err(decode_error)?,
        message_type: message_type.parse().map_err(decode_error)?,
        is_ai_generated: is_ai_generated != 0,
        metadata: field_map_from_json(&metadata).map_err(|e| decode_error(e.to_string()))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl MessageRepository for Database {
    async fn create_message(&self, message: &Message) -> ApiResult<()> {
        self.create_messages(std::slice::from_ref(message)).await
    }

    /// One multi-row INSERT for the whole batch.
    async fn create_messages(&self, messages: &[Message]) -> ApiResult<()> {
        if messages.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<Any>::new(format!("INSERT INTO messages ({}) ", MESSAGE_COLUMNS));
        qb.push_values(messages, |mut row, message| {
            row.push_bind(message.id.clone())
                .push_bind(message.ticket_id.clone())
                .push_bind(message.user_id.clone())
                .push_bind(message.content.clone())
                .push_bind(message.visibility.as_str().to_string())
                .push_bind(message.message_type.as_str().to_string())
                .push_bind(message.is_ai_generated as i64)
                .push_bind(field_map_to_json(&message.metadata))
                .push_bind(message.created_at.clone())
                .push_bind(message.updated_at.clone());
        });

        qb.build()
            .execute(&self.pool)
            .await
            .op("create_messages")?;

        Ok(())
    }

    async fn get_message(&self, id: &str) -> ApiResult<Option<Message>> {
        let row = sqlx::query(&format!("SELECT {} FROM messages WHERE id = ?", MESSAGE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .op("get_message")?;

        Ok(row.as_ref().map(row_to_message).transpose().op("get_message")?)
    }

    async fn get_ticket_messages(
        &self,
        ticket_id: &str,
        include_internal: bool,
    ) -> ApiResult<Vec<Message>> {
        let visibility_clause = if include_internal {
            ""
        } else {
            " AND visibility = 'public'"
        };

        // rowid breaks ties between messages written in the same microsecond
        let rows = sqlx::query(&format!(
            "SELECT {} FROM messages WHERE ticket_id = ?{} ORDER BY created_at ASC, rowid ASC",
            MESSAGE_COLUMNS, visibility_clause
        ))
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
        .op("get_ticket_messages")?;

        Ok(rows
            .iter()
            .map(row_to_message)
            .collect::<Result<Vec<_>, _>>()
            .op("get_ticket_messages")?)
    }
}
