use crate::domain::entities::DocumentChunk;
use crate::infrastructure::http::middleware::error::ApiResult;
use async_trait::async_trait;

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Swap the stored chunks of one document for `chunks`.
    async fn replace_document_chunks(
        &self,
        category: &str,
        slug: &str,
        chunks: &[DocumentChunk],
    ) -> ApiResult<()>;
    /// Delete the chunks of every stored document not named in `keep`.
    /// Returns the number of documents removed.
    async fn prune_documents(&self, keep: &[(String, String)]) -> ApiResult<usize>;
    async fn list_chunks(&self, category: Option<&str>) -> ApiResult<Vec<DocumentChunk>>;
    async fn count_chunks(&self) -> ApiResult<i64>;
}
