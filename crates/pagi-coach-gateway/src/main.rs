//! PAGI Coach Gateway — chat, Zoom scheduling and coaching datasets over HTTP.
//! Providers (OpenAI, Pinecone, Zoom) are constructed once at start-up and injected via `AppState`.

mod auth;
mod error;
mod handlers;
mod state;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use pagi_coach_core::{CoachConfig, Providers};
use std::process::ExitCode;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::state::AppState;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CoachConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(target: "pagi::coach::gateway", error = %e, "Configuration error; refusing to start");
            return ExitCode::FAILURE;
        }
    };
    if config.uses_placeholder_token() {
        tracing::warn!(
            target: "pagi::coach::gateway",
            "SECRET_TOKEN is not set; the placeholder token is in use. Override it before any real deployment."
        );
    }

    let providers = Providers::from_config(&config);
    let state = AppState::new(
        &config.secret_token,
        providers,
        config.context_cache_capacity,
        config.data_dir.clone(),
    );
    tracing::info!(
        target: "pagi::coach::gateway",
        openai = state.providers.language_model,
        pinecone = state.providers.context_index,
        zoom = state.providers.meetings,
        data_dir = %config.data_dir.display(),
        "Provider start-up complete"
    );

    let app = build_app(state);

    let listener = match tokio::net::TcpListener::bind(&config.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(target: "pagi::coach::gateway", addr = %config.bind_addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(target: "pagi::coach::gateway", "PAGI Coach gateway listening on {}", config.bind_addr);

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!(target: "pagi::coach::gateway", "Server error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(target: "pagi::coach::gateway", "Shutdown initiated (Ctrl+C received)");
        }
    }
    ExitCode::SUCCESS
}

/// Full router: `/health` is public, everything else sits behind the bearer gate.
fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/chat", post(handlers::chat))
        .route("/schedule_zoom", post(handlers::schedule_zoom))
        .route(
            "/datasets/:name",
            get(handlers::get_dataset).put(handlers::put_dataset),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        target: "pagi::coach::http",
        %method,
        %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}
