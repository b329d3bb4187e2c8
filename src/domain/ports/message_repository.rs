use crate::domain::entities::Message;
use crate::infrastructure::http::middleware::error::ApiResult;
use async_trait::async_trait;

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create_message(&self, message: &Message) -> ApiResult<()>;
    async fn create_messages(&self, messages: &[Message]) -> ApiResult<()>;
    async fn get_message(&self, id: &str) -> ApiResult<Option<Message>>;
    /// Messages in posting order; internal notes only when `include_internal`.
    async fn get_ticket_messages(
        &self,
        ticket_id: &str,
        include_internal: bool,
    ) -> ApiResult<Vec<Message>>;
}
