//! Pinecone context index. The message is embedded first, then the index is queried for
//! its nearest matches with metadata. The `matches` array is handed back as-is.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::{http_client, read_json, require_key, ContextIndex, Embedder, ProviderError};
use crate::config::CoachConfig;

const PROVIDER: &str = "Pinecone";
const API_VERSION: &str = "2024-07";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<serde_json::Value>,
}

pub struct PineconeIndex {
    api_key: String,
    host: String,
    embedder: Arc<dyn Embedder>,
    client: reqwest::Client,
}

impl PineconeIndex {
    /// `index_host` is the data-plane host of the index, with or without scheme.
    pub fn new(
        api_key: &str,
        index_host: Option<&str>,
        embedder: Option<Arc<dyn Embedder>>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let api_key = require_key(PROVIDER, "PINECONE_API_KEY", api_key)?;
        let host = index_host
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(normalize_host)
            .ok_or_else(|| ProviderError::NotConfigured {
                provider: PROVIDER,
                reason: "PINECONE_INDEX_HOST is not set".to_string(),
            })?;
        let embedder = embedder.ok_or_else(|| ProviderError::NotConfigured {
            provider: PROVIDER,
            reason: "no embedding client available".to_string(),
        })?;
        Ok(Self {
            api_key,
            host,
            embedder,
            client: http_client(PROVIDER, timeout)?,
        })
    }

    pub fn from_config(
        config: &CoachConfig,
        embedder: Option<Arc<dyn Embedder>>,
    ) -> Result<Self, ProviderError> {
        Self::new(
            &config.pinecone_api_key,
            config.pinecone_index_host.as_deref(),
            embedder,
            config.provider_timeout,
        )
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[async_trait]
impl ContextIndex for PineconeIndex {
    async fn query(&self, text: &str, top_k: usize) -> Result<serde_json::Value, ProviderError> {
        let vector = self.embedder.embed(text).await?;
        let body = QueryRequest {
            vector: &vector,
            top_k,
            include_metadata: true,
        };
        let res = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: PROVIDER,
                source,
            })?;

        let parsed: QueryResponse = read_json(PROVIDER, res).await?;
        Ok(serde_json::Value::Array(parsed.matches))
    }
}
