//! Appointment booking.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::authz::Capability;
use crate::db::repository::appointment;
use crate::models::{Appointment, AppointmentStatus};
use crate::validation::Violations;

const MODULE: &str = "appointments";

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    Ok(Json(appointment::list_appointments(&conn)?))
}

#[derive(Deserialize)]
pub struct AppointmentRequest {
    pub patient_name: String,
    pub phone: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub note: Option<String>,
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<AppointmentRequest>,
) -> Result<Json<Appointment>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    let mut v = Violations::new();
    v.require("patient_name", &req.patient_name);
    v.check_phone("phone", req.phone.as_deref());
    v.into_result()?;

    let new_appointment = Appointment {
        id: Uuid::new_v4(),
        patient_name: req.patient_name,
        phone: req.phone,
        scheduled_at: req.scheduled_at,
        status: AppointmentStatus::Scheduled,
        note: req.note,
    };

    let conn = ctx.open_db()?;
    appointment::insert_appointment(&conn, &new_appointment)?;
    Ok(Json(new_appointment))
}

#[derive(Deserialize)]
pub struct AppointmentUpdateRequest {
    pub patient_name: Option<String>,
    pub phone: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub note: Option<String>,
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<AppointmentUpdateRequest>,
) -> Result<Json<Appointment>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    let mut existing = appointment::get_appointment(&conn, &id)?;

    if let Some(name) = req.patient_name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("patient_name is required".into()));
        }
        existing.patient_name = name;
    }
    if req.phone.is_some() {
        existing.phone = req.phone;
    }
    if let Some(at) = req.scheduled_at {
        existing.scheduled_at = at;
    }
    if let Some(status) = req.status {
        existing.status = AppointmentStatus::from_str(&status)
            .map_err(|_| ApiError::BadRequest("unknown appointment status".into()))?;
    }
    if req.note.is_some() {
        existing.note = req.note;
    }

    appointment::update_appointment(&conn, &existing)?;
    Ok(Json(existing))
}

pub async fn delete(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !auth.can(MODULE, Capability::Delete) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    appointment::delete_appointment(&conn, &id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
