//! Owner bearer-token middleware.
//!
//! When `CAREDIARY_OWNER_TOKEN` is set, owner routes require
//! `Authorization: Bearer <token>`. Without it the owner routes are open,
//! which is only meant for a loopback bind.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

pub async fn require_owner(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_owner_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_owner_inner(
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let Some(expected) = ctx.config.owner_token.as_deref() else {
        return Ok(next.run(req).await);
    };

    let presented = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(ApiError::Unauthorized)?;

    if !bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
        tracing::warn!("Rejected owner request with invalid token");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}
