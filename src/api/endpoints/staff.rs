//! Staff records, attendance marking, and salary payments.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::authz::Capability;
use crate::db::repository::staff;
use crate::models::{AttendanceRecord, AttendanceStatus, SalaryPayment, Staff};
use crate::validation::Violations;

const MODULE: &str = "staff";

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Staff>>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    Ok(Json(staff::list_staff(&conn)?))
}

#[derive(Deserialize)]
pub struct StaffRequest {
    pub name: String,
    pub designation: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub joined_at: Option<NaiveDate>,
    #[serde(default)]
    pub base_salary: f64,
}

fn validate(req: &StaffRequest) -> Result<(), ApiError> {
    let mut v = Violations::new();
    v.require("name", &req.name);
    v.check_phone("phone", req.phone.as_deref());
    v.check_email("email", req.email.as_deref());
    v.require_non_negative("base_salary", req.base_salary);
    Ok(v.into_result()?)
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<StaffRequest>,
) -> Result<Json<Staff>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    validate(&req)?;

    let member = Staff {
        id: Uuid::new_v4(),
        name: req.name,
        designation: req.designation,
        phone: req.phone,
        email: req.email,
        joined_at: req.joined_at,
        base_salary: req.base_salary,
    };

    let conn = ctx.open_db()?;
    staff::insert_staff(&conn, &member)?;
    Ok(Json(member))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<StaffRequest>,
) -> Result<Json<Staff>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    validate(&req)?;

    let conn = ctx.open_db()?;
    let mut existing = staff::get_staff(&conn, &id)?;
    existing.name = req.name;
    existing.designation = req.designation;
    existing.phone = req.phone;
    existing.email = req.email;
    existing.joined_at = req.joined_at;
    existing.base_salary = req.base_salary;
    staff::update_staff(&conn, &existing)?;
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
    staff::delete_staff(&conn, &id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct AttendanceRequest {
    pub staff_id: Uuid,
    pub date: NaiveDate,
    pub status: String,
}

/// `POST /api/lab/attendance` — one mark per staff member per day.
pub async fn mark_attendance(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<AttendanceRequest>,
) -> Result<Json<AttendanceRecord>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    let status = AttendanceStatus::from_str(&req.status)
        .map_err(|_| ApiError::BadRequest("unknown attendance status".into()))?;

    let record = AttendanceRecord {
        id: Uuid::new_v4(),
        staff_id: req.staff_id,
        date: req.date,
        status,
    };

    let conn = ctx.open_db()?;
    staff::get_staff(&conn, &req.staff_id.to_string())?;
    staff::mark_attendance(&conn, &record)?;
    Ok(Json(record))
}

#[derive(Deserialize)]
pub struct AttendanceQuery {
    pub date: Option<NaiveDate>,
    pub staff_id: Option<Uuid>,
}

pub async fn list_attendance(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    let records = match (query.staff_id, query.date) {
        (Some(staff_id), _) => staff::list_attendance_for_staff(&conn, &staff_id.to_string())?,
        (None, Some(date)) => staff::list_attendance_by_date(&conn, date)?,
        (None, None) => staff::list_attendance_by_date(&conn, Utc::now().date_naive())?,
    };
    Ok(Json(records))
}

#[derive(Deserialize)]
pub struct SalaryRequest {
    pub staff_id: Uuid,
    pub month: String,
    pub amount: f64,
}

/// `POST /api/lab/staff/:id/salaries` would be redundant with the body's
/// staff_id, so salaries hang off the collection route instead.
pub async fn pay_salary(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SalaryRequest>,
) -> Result<Json<SalaryPayment>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    let mut v = Violations::new();
    v.check_month("month", &req.month);
    v.require_positive("amount", req.amount);
    v.into_result()?;

    let payment = SalaryPayment {
        id: Uuid::new_v4(),
        staff_id: req.staff_id,
        month: req.month,
        amount: req.amount,
        paid_at: Utc::now(),
    };

    let conn = ctx.open_db()?;
    staff::get_staff(&conn, &req.staff_id.to_string())?;
    staff::pay_salary(&conn, &payment)?;
    Ok(Json(payment))
}

pub async fn list_salaries(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<Vec<SalaryPayment>>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    Ok(Json(staff::list_salaries_for_staff(&conn, &id)?))
}
