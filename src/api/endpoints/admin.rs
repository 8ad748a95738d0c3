//! User administration. Every route here is admin-only.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::user;
use crate::models::{ModulePermission, User};
use crate::validation::Violations;

pub async fn list_users(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<User>>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    Ok(Json(user::list_users(&conn)?))
}

#[derive(Deserialize)]
pub struct AccessRequest {
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<ModulePermission>,
}

/// `PUT /api/admin/users/:id/access` — change a user's role and grants.
pub async fn update_access(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<AccessRequest>,
) -> Result<Json<User>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::Forbidden);
    }
    let mut v = Violations::new();
    v.require("role", &req.role);
    v.into_result()?;

    let conn = ctx.open_db()?;
    user::update_user_access(&conn, &id, &req.role, &req.permissions)?;
    Ok(Json(user::get_user_by_id(&conn, &id)?))
}

pub async fn delete_user(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::Forbidden);
    }
    if auth.user_id == id {
        return Err(ApiError::BadRequest("cannot delete your own account".into()));
    }
    let conn = ctx.open_db()?;
    user::delete_user(&conn, &id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
