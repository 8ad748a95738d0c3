//! Test catalog management.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::authz::Capability;
use crate::db::repository::test_catalog;
use crate::models::{LabTest, TestParameter};
use crate::validation::Violations;

const MODULE: &str = "tests";

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<LabTest>>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    Ok(Json(test_catalog::list_tests(&conn)?))
}

pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<LabTest>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    Ok(Json(test_catalog::get_test(&conn, &id)?))
}

#[derive(Deserialize)]
pub struct TestRequest {
    pub name: String,
    pub code: Option<String>,
    pub category: Option<String>,
    pub price: f64,
    pub sample_type: Option<String>,
    #[serde(default)]
    pub parameters: Vec<TestParameter>,
    pub turnaround_hours: Option<u32>,
}

fn validate(req: &TestRequest) -> Result<(), ApiError> {
    let mut v = Violations::new();
    v.require("name", &req.name);
    v.require_non_negative("price", req.price);
    for (i, param) in req.parameters.iter().enumerate() {
        if param.id.trim().is_empty() {
            v.add("parameters", format!("parameter {} has no id", i + 1));
        }
        if param.name.trim().is_empty() {
            v.add("parameters", format!("parameter {} has no name", i + 1));
        }
    }
    Ok(v.into_result()?)
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<TestRequest>,
) -> Result<Json<LabTest>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    validate(&req)?;

    let test = LabTest {
        id: Uuid::new_v4(),
        name: req.name,
        code: req.code,
        category: req.category,
        price: req.price,
        sample_type: req.sample_type,
        parameters: req.parameters,
        turnaround_hours: req.turnaround_hours,
    };

    let conn = ctx.open_db()?;
    test_catalog::insert_test(&conn, &test)?;
    Ok(Json(test))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<TestRequest>,
) -> Result<Json<LabTest>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    validate(&req)?;

    let conn = ctx.open_db()?;
    let mut existing = test_catalog::get_test(&conn, &id)?;
    existing.name = req.name;
    existing.code = req.code;
    existing.category = req.category;
    existing.price = req.price;
    existing.sample_type = req.sample_type;
    existing.parameters = req.parameters;
    existing.turnaround_hours = req.turnaround_hours;
    test_catalog::update_test(&conn, &existing)?;
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
    test_catalog::delete_test(&conn, &id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
