use crate::domain::entities::ChatMessage;
use crate::domain::errors::AiError;
use async_trait::async_trait;

/// Chat completion provider.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AiError>;
}

/// Text embedding provider. Returns one vector per input, in input order.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiError>;
}
