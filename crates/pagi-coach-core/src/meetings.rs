//! Meeting scheduling: start-time validation and provider hand-off.
//!
//! Validation runs before the provider check, so a bad request is reported as such even
//! when the meeting provider never came up.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::providers::{MeetingParams, MeetingProvider, ProviderError};

pub const DEFAULT_TOPIC: &str = "Session de coaching";
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeetingRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MeetingResponse {
    pub meeting_url: String,
    pub meeting_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("start_time is required (ISO 8601 format, e.g. 2024-02-10T15:00:00Z)")]
    MissingStartTime,
    #[error("Invalid start_time format. Use ISO 8601 (e.g. 2024-02-10T15:00:00Z)")]
    InvalidStartTime,
    #[error("meeting provider is not available")]
    ProviderUnavailable,
    #[error("meeting creation failed")]
    Provider(#[source] ProviderError),
}

/// Parse an ISO 8601 timestamp. Offsets are converted to UTC; naive values are taken as UTC
/// and a bare date means midnight.
pub fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl MeetingRequest {
    /// Resolve defaults and validate the start time. Only an omitted field takes its
    /// default; a supplied topic is forwarded as given.
    pub fn into_params(self) -> Result<MeetingParams, ScheduleError> {
        let raw = self
            .start_time
            .as_deref()
            .ok_or(ScheduleError::MissingStartTime)?;
        let start_time = parse_start_time(raw).ok_or(ScheduleError::InvalidStartTime)?;
        let topic = self.topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string());
        Ok(MeetingParams {
            topic,
            start_time,
            duration_minutes: self.duration.unwrap_or(DEFAULT_DURATION_MINUTES),
        })
    }
}

pub struct MeetingScheduler {
    provider: Option<Arc<dyn MeetingProvider>>,
}

impl MeetingScheduler {
    pub fn new(provider: Option<Arc<dyn MeetingProvider>>) -> Self {
        Self { provider }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn schedule(&self, request: MeetingRequest) -> Result<MeetingResponse, ScheduleError> {
        let params = request.into_params().map_err(|e| {
            tracing::debug!(target: "pagi::coach::meetings", error = %e, "Meeting request rejected");
            e
        })?;

        let Some(provider) = self.provider.as_ref() else {
            tracing::error!(target: "pagi::coach::meetings", "Meeting provider not initialized");
            return Err(ScheduleError::ProviderUnavailable);
        };

        match provider.create_meeting(&params).await {
            Ok(created) => {
                tracing::info!(
                    target: "pagi::coach::meetings",
                    meeting_id = %created.meeting_id,
                    start_time = %params.start_time,
                    duration = params.duration_minutes,
                    "Meeting scheduled"
                );
                Ok(MeetingResponse {
                    meeting_url: created.join_url,
                    meeting_id: created.meeting_id,
                })
            }
            Err(e) => {
                tracing::error!(target: "pagi::coach::meetings", error = %e, "Meeting creation failed");
                Err(ScheduleError::Provider(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::CreatedMeeting;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        seen: Mutex<Vec<MeetingParams>>,
    }

    #[async_trait]
    impl MeetingProvider for RecordingProvider {
        async fn create_meeting(
            &self,
            params: &MeetingParams,
        ) -> Result<CreatedMeeting, ProviderError> {
            self.seen.lock().unwrap().push(params.clone());
            Ok(CreatedMeeting {
                join_url: "https://zoom.us/j/85746065432".to_string(),
                meeting_id: "85746065432".to_string(),
            })
        }
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn accepted_timestamp_forms() {
        let expected = at(2024, 2, 10, 15, 0);
        assert_eq!(parse_start_time("2024-02-10T15:00:00Z"), Some(expected));
        assert_eq!(parse_start_time("2024-02-10T15:00:00.000Z"), Some(expected));
        assert_eq!(parse_start_time("2024-02-10T16:00:00+01:00"), Some(expected));
        assert_eq!(parse_start_time("2024-02-10T16:00:00+0100"), Some(expected));
        assert_eq!(parse_start_time("2024-02-10T15:00:00"), Some(expected));
        assert_eq!(parse_start_time("2024-02-10 15:00"), Some(expected));
        assert_eq!(parse_start_time("2024-02-10"), Some(at(2024, 2, 10, 0, 0)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_start_time("not-a-date").is_none());
        assert!(parse_start_time("2024-13-40T99:00:00Z").is_none());
        assert!(parse_start_time("").is_none());
    }

    #[test]
    fn defaults_fill_topic_and_duration() {
        let params = MeetingRequest {
            start_time: Some("2024-02-10T15:00:00Z".to_string()),
            ..Default::default()
        }
        .into_params()
        .unwrap();
        assert_eq!(params.topic, DEFAULT_TOPIC);
        assert_eq!(params.duration_minutes, DEFAULT_DURATION_MINUTES);
    }

    #[test]
    fn missing_start_time_names_the_field() {
        let err = MeetingRequest::default().into_params().unwrap_err();
        assert!(matches!(err, ScheduleError::MissingStartTime));
        assert!(err.to_string().contains("start_time"));
        assert!(err.to_string().contains("ISO 8601"));
    }

    #[test]
    fn supplied_topic_is_forwarded_as_given() {
        let params = MeetingRequest {
            topic: Some("  Coaching personnel ".to_string()),
            start_time: Some("2024-02-10T15:00:00Z".to_string()),
            duration: None,
        }
        .into_params()
        .unwrap();
        assert_eq!(params.topic, "  Coaching personnel ");

        let params = MeetingRequest {
            topic: Some(String::new()),
            start_time: Some("2024-02-10T15:00:00Z".to_string()),
            duration: None,
        }
        .into_params()
        .unwrap();
        assert_eq!(params.topic, "");
    }

    #[test]
    fn blank_start_time_is_malformed_not_missing() {
        let err = MeetingRequest {
            start_time: Some("   ".to_string()),
            ..Default::default()
        }
        .into_params()
        .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidStartTime));
    }

    #[tokio::test]
    async fn validation_precedes_provider_check() {
        let scheduler = MeetingScheduler::new(None);
        let err = scheduler
            .schedule(MeetingRequest {
                start_time: Some("not-a-date".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidStartTime));

        let err = scheduler
            .schedule(MeetingRequest {
                start_time: Some("2024-02-10T15:00:00Z".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::ProviderUnavailable));
    }

    #[tokio::test]
    async fn provider_values_are_returned_unchanged() {
        let provider = Arc::new(RecordingProvider::default());
        let scheduler = MeetingScheduler::new(Some(provider.clone()));
        let res = scheduler
            .schedule(MeetingRequest {
                topic: Some("Coaching personnel".to_string()),
                start_time: Some("2024-02-10T15:00:00Z".to_string()),
                duration: Some(45),
            })
            .await
            .unwrap();
        assert_eq!(
            res,
            MeetingResponse {
                meeting_url: "https://zoom.us/j/85746065432".to_string(),
                meeting_id: "85746065432".to_string(),
            }
        );

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].topic, "Coaching personnel");
        assert_eq!(seen[0].duration_minutes, 45);
        assert_eq!(seen[0].start_time, at(2024, 2, 10, 15, 0));
    }
}
