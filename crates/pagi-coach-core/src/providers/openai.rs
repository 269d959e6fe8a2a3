//! OpenAI bridge: chat completions for the coach reply and embeddings for the context index.
//!
//! API key: `OPENAI_API_KEY`. The whole prompt goes out as one `user` message; the reply
//! text is returned untouched.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{http_client, read_json, require_key, Embedder, LanguageModel, ProviderError};
use crate::config::CoachConfig;

const PROVIDER: &str = "OpenAI";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct OpenAiClient {
    api_key: String,
    api_base: String,
    model: String,
    embedding_model: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            api_key: require_key(PROVIDER, "OPENAI_API_KEY", api_key)?,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            client: http_client(PROVIDER, timeout)?,
        })
    }

    pub fn from_config(config: &CoachConfig) -> Result<Self, ProviderError> {
        Ok(Self::new(&config.openai_api_key, config.provider_timeout)?
            .with_api_base(&config.openai_api_base)
            .with_model(&config.openai_model)
            .with_embedding_model(&config.openai_embedding_model))
    }

    /// Override the API base (e.g. an OpenAI-compatible proxy).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_embedding_model(mut self, model: &str) -> Self {
        self.embedding_model = model.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let res = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: PROVIDER,
                source,
            })?;

        let parsed: ChatResponse = read_json(PROVIDER, res).await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Parse {
                provider: PROVIDER,
                detail: "completion has no message content".to_string(),
            })
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let body = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
        };
        let res = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: PROVIDER,
                source,
            })?;

        let parsed: EmbeddingResponse = read_json(PROVIDER, res).await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::Parse {
                provider: PROVIDER,
                detail: "embedding response has no data".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_rejected() {
        let err = OpenAiClient::new("  ", Duration::from_secs(5)).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured { provider: "OpenAI", .. }));
    }

    #[test]
    fn builder_overrides_apply() {
        let client = OpenAiClient::new("sk-test", Duration::from_secs(5))
            .unwrap()
            .with_api_base("http://localhost:9000/v1/")
            .with_model("gpt-4");
        assert_eq!(client.model(), "gpt-4");
        assert_eq!(client.api_base, "http://localhost:9000/v1");
    }

    #[test]
    fn chat_request_carries_prompt_as_single_user_message() {
        let body = ChatRequest {
            model: "gpt-3.5-turbo",
            messages: vec![ChatMessage {
                role: "user",
                content: "Bonjour",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Bonjour");
    }

    #[test]
    fn completion_without_content_parses_to_none() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
