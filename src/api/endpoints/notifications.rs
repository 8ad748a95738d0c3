//! Role-targeted notifications.
//!
//! A notification addressed to role `all` reaches everyone; otherwise only
//! users whose role matches the recipient role see it.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::notification;
use crate::models::Notification;
use crate::validation::Violations;

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(notification::list_for_role(&conn, &auth.role)?))
}

#[derive(Deserialize)]
pub struct NotificationRequest {
    pub recipient_role: String,
    pub title: String,
    pub body: Option<String>,
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<NotificationRequest>,
) -> Result<Json<Notification>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::Forbidden);
    }
    let mut v = Violations::new();
    v.require("recipient_role", &req.recipient_role);
    v.require("title", &req.title);
    v.into_result()?;

    let new_notification = Notification {
        id: Uuid::new_v4(),
        recipient_role: req.recipient_role,
        title: req.title,
        body: req.body,
        read: false,
        created_at: Utc::now(),
    };

    let conn = ctx.open_db()?;
    notification::insert_notification(&conn, &new_notification)?;
    Ok(Json(new_notification))
}

pub async fn mark_read(
    State(ctx): State<ApiContext>,
    Extension(_auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.open_db()?;
    notification::mark_read(&conn, &id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
