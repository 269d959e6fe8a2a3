//! Bearer-token gate for the protected routes.
//!
//! The token is a static shared secret compared by exact equality. Anything else (missing
//! header, other scheme, wrong token) is rejected with 403 before the handler runs.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Token from `Authorization: Bearer <token>`. The scheme is matched case-insensitively;
/// everything after the single separating space is the token, untrimmed.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorized =
        bearer_token(request.headers()).is_some_and(|token| token == state.secret_token.as_ref());
    if !authorized {
        tracing::warn!(
            target: "pagi::coach::auth",
            method = %request.method(),
            path = %request.uri().path(),
            "Rejected request: missing or invalid bearer token"
        );
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(request).await)
}
