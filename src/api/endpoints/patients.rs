//! Patient records.
//!
//! `GET /api/lab/patients` supports `?search=` matching name or phone.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::authz::Capability;
use crate::db::repository::patient;
use crate::models::Patient;
use crate::validation::Violations;

const MODULE: &str = "patients";

#[derive(Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    let patients = patient::list_patients(&conn, query.search.as_deref())?;
    Ok(Json(patients))
}

pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    Ok(Json(patient::get_patient(&conn, &id)?))
}

#[derive(Deserialize)]
pub struct PatientRequest {
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

fn validate(req: &PatientRequest) -> Result<(), ApiError> {
    let mut v = Violations::new();
    v.require("name", &req.name);
    v.check_phone("phone", req.phone.as_deref());
    v.check_email("email", req.email.as_deref());
    if let Some(age) = req.age {
        if age > 130 {
            v.add("age", "age is out of range");
        }
    }
    Ok(v.into_result()?)
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<PatientRequest>,
) -> Result<Json<Patient>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    validate(&req)?;

    let new_patient = Patient {
        id: Uuid::new_v4(),
        name: req.name,
        age: req.age,
        gender: req.gender,
        phone: req.phone,
        email: req.email,
        address: req.address,
        created_at: Utc::now(),
    };

    let conn = ctx.open_db()?;
    patient::insert_patient(&conn, &new_patient)?;
    Ok(Json(new_patient))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<PatientRequest>,
) -> Result<Json<Patient>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    validate(&req)?;

    let conn = ctx.open_db()?;
    let mut existing = patient::get_patient(&conn, &id)?;
    existing.name = req.name;
    existing.age = req.age;
    existing.gender = req.gender;
    existing.phone = req.phone;
    existing.email = req.email;
    existing.address = req.address;
    patient::update_patient(&conn, &existing)?;
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
    patient::delete_patient(&conn, &id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
