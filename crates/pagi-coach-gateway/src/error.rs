//! HTTP error mapping. Every failure answers `{"detail": "<message>"}`.
//!
//! Provider failures surface as fixed messages; the underlying error is logged where it
//! happened and never reaches the client.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pagi_coach_core::{ChatError, DatasetError, ScheduleError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid or missing token")]
    Forbidden,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Service(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "detail": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl From<ChatError> for ApiError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::InvalidRequest(msg) => ApiError::Unprocessable(msg.to_string()),
            ChatError::ModelUnavailable => ApiError::Service("Language model unavailable"),
            ChatError::ContextUnavailable => ApiError::Service("Knowledge context unavailable"),
            ChatError::Generation(_) => ApiError::Service("Error generating response"),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::MissingStartTime | ScheduleError::InvalidStartTime => {
                ApiError::BadRequest(e.to_string())
            }
            ScheduleError::ProviderUnavailable => ApiError::Service("Zoom service unavailable"),
            ScheduleError::Provider(_) => ApiError::Service("Error creating Zoom meeting"),
        }
    }
}

impl From<DatasetError> for ApiError {
    fn from(e: DatasetError) -> Self {
        match e {
            DatasetError::Unknown(name) => ApiError::NotFound(format!("Unknown dataset: {}", name)),
            _ => ApiError::Service("Dataset storage error"),
        }
    }
}
