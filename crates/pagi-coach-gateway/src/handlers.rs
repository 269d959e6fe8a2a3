//! Route handlers. Authentication is applied by the router, not here.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use pagi_coach_core::{ChatRequest, ChatResponse, Dataset, JsonMap, MeetingRequest, MeetingResponse};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    openai: bool,
    pinecone: bool,
    zoom: bool,
}

#[derive(Serialize)]
pub struct SaveResponse {
    saved: bool,
}

/// GET /health – provider availability recorded at start-up. No auth.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        openai: state.providers.language_model,
        pinecone: state.providers.context_index,
        zoom: state.providers.meetings,
    })
}

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;
    let response = state.chat.chat(&request.user_id, &request.message).await?;
    Ok(Json(response))
}

/// POST /schedule_zoom
pub async fn schedule_zoom(
    State(state): State<AppState>,
    payload: Result<Json<MeetingRequest>, JsonRejection>,
) -> Result<Json<MeetingResponse>, ApiError> {
    let Json(request) = payload?;
    let meeting = state.meetings.schedule(request).await?;
    Ok(Json(meeting))
}

/// GET /datasets/:name – the stored mapping (empty when never saved or unreadable).
pub async fn get_dataset(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<JsonMap>, ApiError> {
    let dataset: Dataset = name.parse()?;
    Ok(Json(state.datasets.load(dataset).await))
}

/// PUT /datasets/:name – replace the mapping. A failed write is logged by the store and
/// reported as `saved: false`, never as an HTTP error.
pub async fn put_dataset(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<JsonMap>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let dataset: Dataset = name.parse()?;
    let Json(data) = payload?;
    let saved = state.datasets.save(dataset, &data).await.is_ok();
    Ok(Json(SaveResponse { saved }))
}
