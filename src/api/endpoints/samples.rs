//! Sample intake, result entry, and report generation.
//!
//! `GET /api/labtech/samples/:id/report` returns printable HTML. When the
//! full report data cannot be assembled (the patient record is gone), it
//! degrades to a receipt-style slip rather than failing the request.

use axum::extract::{Path, Query, State};
use axum::response::Html;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::authz::Capability;
use crate::db::repository::{patient, sample, settings, test_catalog};
use crate::db::DatabaseError;
use crate::models::{
    OrderedTest, ResultFlag, Sample, SampleInterpretation, SampleResult, SampleStatus,
};
use crate::report;
use crate::validation::Violations;

const MODULE: &str = "samples";

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Sample>>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let status = query
        .status
        .as_deref()
        .map(SampleStatus::from_str)
        .transpose()
        .map_err(|_| ApiError::BadRequest("unknown sample status".into()))?;

    let conn = ctx.open_db()?;
    Ok(Json(sample::list_samples(&conn, status)?))
}

pub async fn get(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<Sample>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    Ok(Json(sample::get_sample(&conn, &id)?))
}

#[derive(Deserialize)]
pub struct SampleRequest {
    pub patient_id: Uuid,
    pub sample_no: String,
    #[serde(default)]
    pub tests: Vec<OrderedTest>,
    pub priority: Option<String>,
    pub referred_by: Option<String>,
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SampleRequest>,
) -> Result<Json<Sample>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    let mut v = Violations::new();
    v.require("sample_no", &req.sample_no);
    if req.tests.is_empty() {
        v.add("tests", "at least one test must be ordered");
    }
    v.into_result()?;

    let conn = ctx.open_db()?;
    // Intake requires an existing patient record
    patient::get_patient(&conn, &req.patient_id.to_string())?;

    let new_sample = Sample {
        id: Uuid::new_v4(),
        patient_id: req.patient_id,
        sample_no: req.sample_no,
        tests: req.tests,
        status: SampleStatus::Pending,
        priority: req.priority,
        referred_by: req.referred_by,
        collected_at: Utc::now(),
    };
    sample::insert_sample(&conn, &new_sample)?;
    Ok(Json(new_sample))
}

#[derive(Deserialize)]
pub struct SampleUpdateRequest {
    #[serde(default)]
    pub tests: Option<Vec<OrderedTest>>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub referred_by: Option<String>,
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<SampleUpdateRequest>,
) -> Result<Json<Sample>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    let mut existing = sample::get_sample(&conn, &id)?;

    if let Some(tests) = req.tests {
        if tests.is_empty() {
            return Err(ApiError::BadRequest("at least one test must be ordered".into()));
        }
        existing.tests = tests;
    }
    if let Some(status) = req.status {
        existing.status = SampleStatus::from_str(&status)
            .map_err(|_| ApiError::BadRequest("unknown sample status".into()))?;
    }
    if req.priority.is_some() {
        existing.priority = req.priority;
    }
    if req.referred_by.is_some() {
        existing.referred_by = req.referred_by;
    }

    sample::update_sample(&conn, &existing)?;
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
    sample::delete_sample(&conn, &id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct ResultEntry {
    pub parameter_id: String,
    pub value: String,
    pub unit: Option<String>,
    pub flag: Option<String>,
}

#[derive(Deserialize)]
pub struct ResultsRequest {
    pub results: Vec<ResultEntry>,
}

/// `PUT /api/labtech/samples/:id/results` — replace the whole result sheet.
pub async fn put_results(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<ResultsRequest>,
) -> Result<Json<Vec<SampleResult>>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }

    let mut v = Violations::new();
    for (i, entry) in req.results.iter().enumerate() {
        if entry.parameter_id.trim().is_empty() {
            v.add("results", format!("entry {} has no parameter_id", i + 1));
        }
        if entry.value.trim().is_empty() {
            v.add("results", format!("entry {} has no value", i + 1));
        }
    }
    v.into_result()?;

    let conn = ctx.open_db()?;
    let target = sample::get_sample(&conn, &id)?;

    let now = Utc::now();
    let mut results = Vec::with_capacity(req.results.len());
    for entry in req.results {
        let flag = entry
            .flag
            .as_deref()
            .map(ResultFlag::from_str)
            .transpose()
            .map_err(|_| ApiError::BadRequest("unknown result flag".into()))?;
        results.push(SampleResult {
            id: Uuid::new_v4(),
            sample_id: target.id,
            parameter_id: entry.parameter_id,
            value: entry.value,
            unit: entry.unit,
            flag,
            entered_by: Some(auth.username.clone()),
            entered_at: now,
        });
    }

    sample::replace_results(&conn, &target.id, &results)?;
    if target.status == SampleStatus::Pending {
        sample::update_sample_status(&conn, &id, SampleStatus::Processing)?;
    }
    Ok(Json(results))
}

#[derive(Deserialize)]
pub struct InterpretationRequest {
    pub test_key: String,
    pub text: String,
}

/// `PUT /api/labtech/samples/:id/interpretation` — upsert the free-text
/// interpretation for one test of the sample.
pub async fn put_interpretation(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<InterpretationRequest>,
) -> Result<Json<SampleInterpretation>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    let mut v = Violations::new();
    v.require("test_key", &req.test_key);
    v.into_result()?;

    let conn = ctx.open_db()?;
    let target = sample::get_sample(&conn, &id)?;

    let interp = SampleInterpretation {
        id: Uuid::new_v4(),
        sample_id: target.id,
        test_key: req.test_key,
        text: req.text,
    };
    sample::upsert_interpretation(&conn, &interp)?;
    Ok(Json(interp))
}

/// `GET /api/labtech/samples/:id/report` — printable HTML.
pub async fn report(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }

    let conn = ctx.open_db()?;
    let target = sample::get_sample(&conn, &id)?;
    let lab = settings::get_settings(&conn)?;

    // Degrade to the slip when the patient record can no longer be joined.
    let patient = match patient::get_patient(&conn, &target.patient_id.to_string()) {
        Ok(p) => p,
        Err(DatabaseError::NotFound { .. }) => {
            return Ok(Html(report::render_slip(&lab, &target, "Unknown")));
        }
        Err(e) => return Err(e.into()),
    };

    let mut catalog = Vec::new();
    for ordered in &target.tests {
        match test_catalog::get_test(&conn, &ordered.test_id) {
            Ok(test) => catalog.push(test),
            // Catalog edits after intake are fine, rows fall back to raw ids
            Err(DatabaseError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }
    }

    let results = sample::get_results(&conn, &id)?;
    let interpretations = sample::get_interpretations(&conn, &id)?;

    let html = report::render_report(&lab, &target, &patient, &catalog, &results, &interpretations);

    if target.status == SampleStatus::Completed {
        sample::update_sample_status(&conn, &id, SampleStatus::Reported)?;
    }

    Ok(Html(html))
}
