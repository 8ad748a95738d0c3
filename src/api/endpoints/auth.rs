//! Login, registration, and the current user's profile.
//!
//! `POST /api/auth/login` is the only route that works without a token.
//! Registration is admin-only so staff accounts cannot self-provision.

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::auth::{self, hash_password, verify_password};
use crate::db::repository::user;
use crate::models::{ModulePermission, User};
use crate::validation::Violations;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

pub async fn login(
    State(ctx): State<ApiContext>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut v = Violations::new();
    v.require("username", &req.username);
    v.require("password", &req.password);
    v.into_result()?;

    let conn = ctx.open_db()?;
    let user = user::get_user_by_username(&conn, &req.username)?
        .filter(|u| verify_password(&req.password, &u.password_hash))
        .ok_or(ApiError::Unauthorized)?;

    let token = auth::issue_token(
        &ctx.config.jwt_secret,
        &user.id.to_string(),
        &user.username,
        &user.role,
        &user.permissions,
    )
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(LoginResponse { token, user }))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<ModulePermission>,
}

pub async fn register(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<User>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::Forbidden);
    }

    let mut v = Violations::new();
    v.require("username", &req.username);
    v.require("password", &req.password);
    v.require("full_name", &req.full_name);
    v.require("role", &req.role);
    if req.password.len() < 6 {
        v.add("password", "password must be at least 6 characters");
    }
    v.into_result()?;

    let new_user = User {
        id: Uuid::new_v4(),
        username: req.username,
        password_hash: hash_password(&req.password)
            .map_err(|e| ApiError::Internal(e.to_string()))?,
        full_name: req.full_name,
        role: req.role,
        permissions: req.permissions,
        created_at: Utc::now(),
    };

    let conn = ctx.open_db()?;
    user::insert_user(&conn, &new_user)?;
    Ok(Json(new_user))
}

pub async fn get_profile(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<User>, ApiError> {
    let conn = ctx.open_db()?;
    let user = user::get_user_by_id(&conn, &auth.user_id)?;
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: String,
}

pub async fn update_profile(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let mut v = Violations::new();
    v.require("full_name", &req.full_name);
    v.into_result()?;

    let conn = ctx.open_db()?;
    user::update_profile(&conn, &auth.user_id, &req.full_name)?;
    let user = user::get_user_by_id(&conn, &auth.user_id)?;
    Ok(Json(user))
}
