//! External provider seams: language model, vector index and meeting scheduler.
//!
//! Components depend on the traits below; the reqwest bridges in the submodules are the
//! production implementations and tests substitute their own.

pub mod openai;
pub mod pinecone;
pub mod zoom;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

pub use openai::OpenAiClient;
pub use pinecone::PineconeIndex;
pub use zoom::ZoomClient;

use crate::config::CoachConfig;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} not configured: {reason}")]
    NotConfigured {
        provider: &'static str,
        reason: String,
    },
    #[error("{provider} request failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider} response parse failed: {detail}")]
    Parse {
        provider: &'static str,
        detail: String,
    },
}

/// Text completion from a single prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Text embedding for similarity queries.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Similarity search returning the provider's matches (with metadata) as opaque JSON.
#[async_trait]
pub trait ContextIndex: Send + Sync {
    async fn query(&self, text: &str, top_k: usize) -> Result<serde_json::Value, ProviderError>;
}

/// Parameters for a scheduled (non-recurring) meeting. Start time is always UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingParams {
    pub topic: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
}

/// What the provider returned for a created meeting, unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedMeeting {
    pub join_url: String,
    pub meeting_id: String,
}

#[async_trait]
pub trait MeetingProvider: Send + Sync {
    async fn create_meeting(&self, params: &MeetingParams) -> Result<CreatedMeeting, ProviderError>;
}

/// Which provider clients came up at start-up. Never re-probed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderStatus {
    pub language_model: bool,
    pub context_index: bool,
    pub meetings: bool,
}

/// Provider handles built once at start-up. A client that failed to construct is `None`.
#[derive(Clone, Default)]
pub struct Providers {
    pub language_model: Option<Arc<dyn LanguageModel>>,
    pub context_index: Option<Arc<dyn ContextIndex>>,
    pub meetings: Option<Arc<dyn MeetingProvider>>,
}

impl Providers {
    /// Construct every client from config. Failures are logged and leave that slot empty.
    pub fn from_config(config: &CoachConfig) -> Self {
        let openai = match OpenAiClient::from_config(config) {
            Ok(c) => {
                tracing::info!(target: "pagi::coach::providers", model = %config.openai_model, "OpenAI client initialized");
                Some(Arc::new(c))
            }
            Err(e) => {
                tracing::warn!(target: "pagi::coach::providers", error = %e, "OpenAI client unavailable");
                None
            }
        };

        let embedder = openai.clone().map(|c| c as Arc<dyn Embedder>);
        let context_index = match PineconeIndex::from_config(config, embedder) {
            Ok(index) => {
                tracing::info!(target: "pagi::coach::providers", host = %index.host(), "Pinecone index initialized");
                Some(Arc::new(index) as Arc<dyn ContextIndex>)
            }
            Err(e) => {
                tracing::warn!(target: "pagi::coach::providers", error = %e, "Pinecone index unavailable");
                None
            }
        };

        let meetings = match ZoomClient::from_config(config) {
            Ok(c) => {
                tracing::info!(target: "pagi::coach::providers", "Zoom client initialized");
                Some(Arc::new(c) as Arc<dyn MeetingProvider>)
            }
            Err(e) => {
                tracing::warn!(target: "pagi::coach::providers", error = %e, "Zoom client unavailable");
                None
            }
        };

        Self {
            language_model: openai.map(|c| c as Arc<dyn LanguageModel>),
            context_index,
            meetings,
        }
    }

    pub fn status(&self) -> ProviderStatus {
        ProviderStatus {
            language_model: self.language_model.is_some(),
            context_index: self.context_index.is_some(),
            meetings: self.meetings.is_some(),
        }
    }
}

pub(crate) fn http_client(
    provider: &'static str,
    timeout: Duration,
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| ProviderError::Request { provider, source })
}

/// Read a provider response body, turning non-2xx statuses into `ProviderError::Api`.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &'static str,
    res: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = res.status();
    let text = res
        .text()
        .await
        .map_err(|source| ProviderError::Request { provider, source })?;
    if !status.is_success() {
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            body: text,
        });
    }
    serde_json::from_str(&text).map_err(|e| ProviderError::Parse {
        provider,
        detail: e.to_string(),
    })
}

pub(crate) fn require_key(
    provider: &'static str,
    name: &str,
    value: &str,
) -> Result<String, ProviderError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ProviderError::NotConfigured {
            provider,
            reason: format!("{} is empty", name),
        });
    }
    Ok(v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(extra: &[(&str, &str)]) -> CoachConfig {
        let mut vars: HashMap<String, String> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("PINECONE_API_KEY", "pc-test"),
            ("ZOOM_API_KEY", "zoom-key"),
            ("ZOOM_API_SECRET", "zoom-secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }
        CoachConfig::from_env_map(vars).unwrap()
    }

    #[test]
    fn index_is_unavailable_without_host() {
        let providers = Providers::from_config(&config(&[]));
        assert_eq!(
            providers.status(),
            ProviderStatus {
                language_model: true,
                context_index: false,
                meetings: true,
            }
        );
    }

    #[test]
    fn all_providers_come_up_with_full_config() {
        let providers = Providers::from_config(&config(&[(
            "PINECONE_INDEX_HOST",
            "coach-abc.svc.pinecone.io",
        )]));
        let status = providers.status();
        assert!(status.language_model && status.context_index && status.meetings);
    }
}
