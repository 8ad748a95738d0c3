//! Request logging middleware.
//!
//! Logs every API request with the acting user (when authenticated), the
//! method, path, and response status. Runs innermost, after auth has
//! injected `AuthContext`.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::AuthContext;

pub async fn log_request(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let username = req
        .extensions()
        .get::<AuthContext>()
        .map(|a| a.username.clone());

    let response = next.run(req).await;
    let status = response.status().as_u16();

    match username {
        Some(user) => tracing::info!(%method, %path, status, user, "request"),
        None => tracing::info!(%method, %path, status, "request"),
    }

    response
}
