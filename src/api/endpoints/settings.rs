//! Lab settings and the report template store.
//!
//! The template is stored verbatim, so `PUT /settings/report-template`
//! followed by `GET /settings` round-trips the submitted JSON unchanged.
//! Writes accept an optional `expected_revision` for conditional updates;
//! omitting it keeps the historical last-write-wins behavior.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::settings;
use crate::models::LabSettings;
use crate::validation::Violations;

pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(_auth): Extension<AuthContext>,
) -> Result<Json<LabSettings>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(settings::get_settings(&conn)?))
}

#[derive(Deserialize)]
pub struct TemplateRequest {
    pub report_template: serde_json::Value,
    pub expected_revision: Option<i64>,
}

#[derive(Serialize)]
pub struct RevisionResponse {
    pub revision: i64,
}

pub async fn put_report_template(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<RevisionResponse>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::Forbidden);
    }
    if !req.report_template.is_object() {
        return Err(ApiError::BadRequest("report_template must be an object".into()));
    }

    let conn = ctx.open_db()?;
    let revision =
        settings::update_report_template(&conn, &req.report_template, req.expected_revision)?;
    Ok(Json(RevisionResponse { revision }))
}

#[derive(Deserialize)]
pub struct IdentityRequest {
    pub lab_name: String,
    pub lab_subtitle: Option<String>,
    pub logo_url: Option<String>,
    pub contact: Option<String>,
    pub expected_revision: Option<i64>,
}

pub async fn put_identity(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<IdentityRequest>,
) -> Result<Json<LabSettings>, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::Forbidden);
    }
    let mut v = Violations::new();
    v.require("lab_name", &req.lab_name);
    v.into_result()?;

    let conn = ctx.open_db()?;
    let mut current = settings::get_settings(&conn)?;
    current.lab_name = req.lab_name;
    current.lab_subtitle = req.lab_subtitle;
    current.logo_url = req.logo_url;
    current.contact = req.contact;
    settings::update_identity(&conn, &current, req.expected_revision)?;
    Ok(Json(settings::get_settings(&conn)?))
}
