use crate::domain::entities::Attachment;
use crate::infrastructure::http::middleware::error::ApiResult;
use async_trait::async_trait;

#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    async fn create_attachment(&self, attachment: &Attachment) -> ApiResult<()>;
    async fn list_message_attachments(&self, message_id: &str) -> ApiResult<Vec<Attachment>>;
}
