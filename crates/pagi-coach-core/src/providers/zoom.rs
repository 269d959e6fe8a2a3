//! Zoom meeting bridge (API key + secret, HS256 JWT per request).
//!
//! Meetings are created for `users/me` as type 2 (scheduled, non-recurring) with the
//! timezone pinned to UTC.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;

use super::{
    http_client, read_json, require_key, CreatedMeeting, MeetingParams, MeetingProvider,
    ProviderError,
};
use crate::config::CoachConfig;

const PROVIDER: &str = "Zoom";
const DEFAULT_API_BASE: &str = "https://api.zoom.us/v2";
const TOKEN_TTL_SECS: i64 = 3600;
const SCHEDULED_MEETING: u8 = 2;
const JWT_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    exp: i64,
}

#[derive(Serialize)]
struct CreateMeetingRequest<'a> {
    topic: &'a str,
    #[serde(rename = "type")]
    kind: u8,
    start_time: String,
    duration: u32,
    timezone: &'static str,
}

#[derive(Deserialize)]
struct CreateMeetingResponse {
    join_url: String,
    id: serde_json::Value,
}

pub struct ZoomClient {
    api_key: String,
    api_secret: String,
    api_base: String,
    client: reqwest::Client,
}

impl ZoomClient {
    pub fn new(api_key: &str, api_secret: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            api_key: require_key(PROVIDER, "ZOOM_API_KEY", api_key)?,
            api_secret: require_key(PROVIDER, "ZOOM_API_SECRET", api_secret)?,
            api_base: DEFAULT_API_BASE.to_string(),
            client: http_client(PROVIDER, timeout)?,
        })
    }

    pub fn from_config(config: &CoachConfig) -> Result<Self, ProviderError> {
        Ok(
            Self::new(&config.zoom_api_key, &config.zoom_api_secret, config.provider_timeout)?
                .with_api_base(&config.zoom_api_base),
        )
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Signed token valid for one hour from `now`.
    fn access_token(&self, now: DateTime<Utc>) -> Result<String, ProviderError> {
        let claims = JwtClaims {
            iss: &self.api_key,
            exp: now.timestamp() + TOKEN_TTL_SECS,
        };
        let claims = serde_json::to_vec(&claims).map_err(|e| ProviderError::Parse {
            provider: PROVIDER,
            detail: e.to_string(),
        })?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(JWT_HEADER),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let mut mac = Hmac::<Sha256>::new_from_slice(self.api_secret.as_bytes()).map_err(|e| {
            ProviderError::NotConfigured {
                provider: PROVIDER,
                reason: format!("unusable API secret: {}", e),
            }
        })?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{}.{}", signing_input, signature))
    }
}

fn meeting_id_string(id: serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[async_trait]
impl MeetingProvider for ZoomClient {
    async fn create_meeting(&self, params: &MeetingParams) -> Result<CreatedMeeting, ProviderError> {
        let token = self.access_token(Utc::now())?;
        let body = CreateMeetingRequest {
            topic: &params.topic,
            kind: SCHEDULED_MEETING,
            start_time: params.start_time.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            duration: params.duration_minutes,
            timezone: "UTC",
        };
        let res = self
            .client
            .post(format!("{}/users/me/meetings", self.api_base))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|source| ProviderError::Request {
                provider: PROVIDER,
                source,
            })?;

        let created: CreateMeetingResponse = read_json(PROVIDER, res).await?;
        tracing::debug!(target: "pagi::coach::zoom", "Zoom meeting created");
        Ok(CreatedMeeting {
            join_url: created.join_url,
            meeting_id: meeting_id_string(created.id),
        })
    }
}
