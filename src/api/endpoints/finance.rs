//! Finance ledger: income/expense records and the running summary.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::authz::Capability;
use crate::db::repository::finance;
use crate::models::{FinanceKind, FinanceRecord};
use crate::validation::Violations;

const MODULE: &str = "finance";

#[derive(Deserialize)]
pub struct ListQuery {
    pub kind: Option<String>,
}

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<FinanceRecord>>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let kind = query
        .kind
        .as_deref()
        .map(FinanceKind::from_str)
        .transpose()
        .map_err(|_| ApiError::BadRequest("kind must be income or expense".into()))?;

    let conn = ctx.open_db()?;
    Ok(Json(finance::list_records(&conn, kind)?))
}

#[derive(Deserialize)]
pub struct RecordRequest {
    pub kind: String,
    pub category: Option<String>,
    pub amount: f64,
    pub note: Option<String>,
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<RecordRequest>,
) -> Result<Json<FinanceRecord>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    let kind = FinanceKind::from_str(&req.kind)
        .map_err(|_| ApiError::BadRequest("kind must be income or expense".into()))?;
    let mut v = Violations::new();
    v.require_positive("amount", req.amount);
    v.into_result()?;

    let record = FinanceRecord {
        id: Uuid::new_v4(),
        kind,
        category: req.category,
        amount: req.amount,
        note: req.note,
        recorded_by: Some(auth.username.clone()),
        recorded_at: Utc::now(),
    };

    let conn = ctx.open_db()?;
    finance::insert_record(&conn, &record)?;
    Ok(Json(record))
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
    finance::delete_record(&conn, &id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
}

pub async fn summary(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<SummaryResponse>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    let (income, expense) = finance::summary(&conn)?;
    Ok(Json(SummaryResponse {
        income,
        expense,
        net: income - expense,
    }))
}
