use crate::domain::entities::DocumentChunk;
use crate::domain::errors::{decode_error, DatabaseResultExt};
use crate::domain::ports::document_repository::DocumentRepository;
use crate::infrastructure::http::middleware::error::ApiResult;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::{any::AnyRow, Row};

const CHUNK_COLUMNS: &str =
    "id, category, slug, title, tags, content, line_start, line_end, embedding, created_at";

fn row_to_chunk(row: &AnyRow) -> Result<DocumentChunk, sqlx::Error> {
    let tags: String = row.try_get("tags")?;
    let embedding: String = row.try_get("embedding")?;

    Ok(DocumentChunk {
        id: row.try_get("id")?,
        category: row.try_get("category")?,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        tags: serde_json::from_str(&tags).map_err(|e| decode_error(e.to_string()))?,
        content: row.try_get("content")?,
        line_start: row.try_get("line_start")?,
        line_end: row.try_get("line_end")?,
        embedding: serde_json::from_str(&embedding).map_err(|e| decode_error(e.to_string()))?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl DocumentRepository for Database {
    /// Delete and insert inside one transaction so searches never see a
    /// half-indexed document.
    async fn replace_document_chunks(
        &self,
        category: &str,
        slug: &str,
        chunks: &[DocumentChunk],
    ) -> ApiResult<()> {
        let mut tx = self.pool.begin().await.op("replace_document_chunks")?;

        sqlx::query("DELETE FROM document_embeddings WHERE category = ? AND slug = ?")
            .bind(category)
            .bind(slug)
            .execute(&mut *tx)
            .await
            .op("replace_document_chunks")?;

        for chunk in chunks {
            let tags = serde_json::to_string(&chunk.tags).unwrap_or_else(|_| "[]".to_string());
            let embedding =
                serde_json::to_string(&chunk.embedding).unwrap_or_else(|_| "[]".to_string());

            sqlx::query(&format!(
                "INSERT INTO document_embeddings ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                CHUNK_COLUMNS
            ))
            .bind(&chunk.id)
            .bind(&chunk.category)
            .bind(&chunk.slug)
            .bind(&chunk.title)
            .bind(tags)
            .bind(&chunk.content)
            .bind(chunk.line_start)
            .bind(chunk.line_end)
            .bind(embedding)
            .bind(&chunk.created_at)
            .execute(&mut *tx)
            .await
            .op("replace_document_chunks")?;
        }

        tx.commit().await.op("replace_document_chunks")?;
        Ok(())
    }

    async fn prune_documents(&self, keep: &[(String, String)]) -> ApiResult<usize> {
        let mut tx = self.pool.begin().await.op("prune_documents")?;

        let rows = sqlx::query("SELECT DISTINCT category, slug FROM document_embeddings")
            .fetch_all(&mut *tx)
            .await
            .op("prune_documents")?;

        let mut removed = 0;
        for row in &rows {
            let category: String = row.try_get("category").op("prune_documents")?;
            let slug: String = row.try_get("slug").op("prune_documents")?;
            if keep.iter().any(|(c, s)| *c == category && *s == slug) {
                continue;
            }

            sqlx::query("DELETE FROM document_embeddings WHERE category = ? AND slug = ?")
                .bind(&category)
                .bind(&slug)
                .execute(&mut *tx)
                .await
                .op("prune_documents")?;
            removed += 1;
        }

        tx.commit().await.op("prune_documents")?;
        Ok(removed)
    }

    async fn list_chunks(&self, category: Option<&str>) -> ApiResult<Vec<DocumentChunk>> {
        let rows = match category {
            Some(category) => {
                sqlx::query(&format!(
                    "SELECT {} FROM document_embeddings WHERE category = ? ORDER BY slug, line_start",
                    CHUNK_COLUMNS
                ))
                .bind(category)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM document_embeddings ORDER BY category, slug, line_start",
                    CHUNK_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .op("list_chunks")?;

        Ok(rows
            .iter()
            .map(row_to_chunk)
            .collect::<Result<Vec<_>, _>>()
            .op("list_chunks")?)
    }

    async fn count_chunks(&self) -> ApiResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM document_embeddings")
            .fetch_one(&self.pool)
            .await
            .op("count_chunks")?;
        Ok(count)
    }
}
