//! Bearer-token authentication middleware.
//!
//! The explicit interceptor stage in front of the engine's operations:
//! it resolves whether the caller presented the configured token and
//! rejects the request before any handler runs. The core takes no
//! dependency on any of this; `/api/health` is mounted outside the
//! stage as the documented unauthenticated probe.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// Require `Authorization: Bearer <token>` on protected routes.
///
/// With no token configured the service runs open (development mode)
/// and every request passes through.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(req).await;
    };

    let presented = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected => next.run(req).await,
        _ => ApiError::Unauthorized.into_response(),
    }
}
