use crate::domain::entities::ChatMessage;
use crate::domain::errors::AiError;
use crate::domain::ports::{ChatModel, EmbeddingModel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Client for OpenAI-compatible `/chat/completions` and `/embeddings` endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    chat_model: String,
    embedding_model: String,
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::Provider(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            chat_model: chat_model.into(),
            embedding_model: embedding_model.into(),
        })
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, AiError> {
        let api_key = self.api_key.as_deref().ok_or(AiError::NotConfigured)?;
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%url, %status, "LLM provider returned an error");
            return Err(AiError::Provider(format!(
                "{} returned {}: {}",
                path,
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| AiError::Provider(format!("unreadable {} response: {}", path, e)))
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AiError> {
        let request = ChatCompletionRequest {
            model: &self.chat_model,
            messages: &messages,
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response: ChatCompletionResponse = self.post("/chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AiError::InvalidResponse("completion had no content".to_string()))
    }
}

#[async_trait]
impl EmbeddingModel for OpenAiClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: inputs,
        };
        let mut response: EmbeddingResponse = self.post("/embeddings", &request).await?;

        if response.data.len() != inputs.len() {
            return Err(AiError::Provider(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                response.data.len()
            )));
        }

        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = OpenAiClient::new(
            "http://localhost:1/v1/",
            None,
            "chat",
            "embed",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:1/v1");

        let err = client
            .complete(vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::NotConfigured));

        let err = client.embed(&["hi".to_string()]).await.unwrap_err();
        assert!(matches!(err, AiError::NotConfigured));
    }

    #[test]
    fn test_chat_request_shape() {
        let messages = vec![ChatMessage::system("rules"), ChatMessage::user("question")];
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_embedding_response_parses() {
        let parsed: EmbeddingResponse = serde_json::from_str(
            r#"{"data": [{"index": 1, "embedding": [0.5]}, {"index": 0, "embedding": [0.25]}], "model": "m"}"#,
        )
        .unwrap();
        assert_eq!(parsed.data.len(), 2);
    }
}
