use async_trait::async_trait;
use autocrm::domain::entities::{ChatMessage, ChatRole};
use autocrm::domain::errors::AiError;
use autocrm::domain::ports::{ChatModel, EmbeddingModel};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Chat model that answers every prompt with a fixed string.
pub struct FakeChat {
    response: String,
    delay: Option<Duration>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeChat {
    pub fn replying(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(response: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            delay: Some(delay),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// User-role content of the most recent prompt.
    pub fn last_user_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().and_then(|messages| {
            messages
                .iter()
                .find(|m| m.role == ChatRole::User)
                .map(|m| m.content.clone())
        })
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AiError> {
        self.prompts.lock().unwrap().push(messages);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.response.clone())
    }
}

const VOCABULARY: &[&str] = &[
    "refund", "invoice", "billing", "password", "sign", "account", "ticket", "status",
];

/// Keyword-count embedding: texts sharing vocabulary words point the same way.
#[derive(Default)]
pub struct FakeEmbedder {
    calls: AtomicUsize,
    inputs: AtomicUsize,
    drop_last: bool,
}

impl FakeEmbedder {
    /// Answers every batch with one vector fewer than requested.
    pub fn short() -> Arc<Self> {
        Arc::new(Self {
            drop_last: true,
            ..Self::default()
        })
    }

    /// Total texts embedded across all calls.
    pub fn inputs(&self) -> usize {
        self.inputs.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect();
        vector.push(0.1);
        vector
    }
}

#[async_trait]
impl EmbeddingModel for FakeEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.fetch_add(inputs.len(), Ordering::SeqCst);
        let mut vectors: Vec<Vec<f32>> = inputs.iter().map(|text| Self::vector(text)).collect();
        if self.drop_last {
            vectors.pop();
        }
        Ok(vectors)
    }
}
