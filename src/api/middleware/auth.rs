//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, verifies the signature and
//! expiry, and injects [`AuthContext`] into request extensions for
//! downstream handlers.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::auth;

pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let claims = auth::verify_token(&ctx.config.jwt_secret, &token)?;

    req.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        username: claims.username,
        role: claims.role,
        permissions: claims.permissions,
    });

    Ok(next.run(req).await)
}
