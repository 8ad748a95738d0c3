//! `GET /api/lab/dashboard` — the stats the landing page charts are fed from.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{finance, inventory, patient, sample, test_catalog};
use crate::models::SampleStatus;

const TREND_DAYS: u32 = 7;

#[derive(Serialize)]
pub struct DashboardResponse {
    pub total_patients: i64,
    pub total_tests: i64,
    pub samples_pending: i64,
    pub samples_processing: i64,
    pub samples_completed: i64,
    pub samples_reported: i64,
    /// Trailing week of intake counts, oldest day first.
    pub samples_per_day: Vec<DayBucket>,
    pub low_stock_items: i64,
    pub stock_value: f64,
    pub income: f64,
    pub expense: f64,
}

#[derive(Serialize)]
pub struct DayBucket {
    pub date: String,
    pub count: i64,
}

pub async fn stats(
    State(ctx): State<ApiContext>,
    Extension(_auth): Extension<AuthContext>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let conn = ctx.open_db()?;

    let samples_per_day = sample::samples_per_day(&conn, TREND_DAYS)?
        .into_iter()
        .map(|(date, count)| DayBucket { date, count })
        .collect();

    let (income, expense) = finance::summary(&conn)?;

    Ok(Json(DashboardResponse {
        total_patients: patient::count_patients(&conn)?,
        total_tests: test_catalog::count_tests(&conn)?,
        samples_pending: sample::count_samples_by_status(&conn, SampleStatus::Pending)?,
        samples_processing: sample::count_samples_by_status(&conn, SampleStatus::Processing)?,
        samples_completed: sample::count_samples_by_status(&conn, SampleStatus::Completed)?,
        samples_reported: sample::count_samples_by_status(&conn, SampleStatus::Reported)?,
        samples_per_day,
        low_stock_items: inventory::list_low_stock(&conn)?.len() as i64,
        stock_value: inventory::total_stock_value(&conn)?,
        income,
        expense,
    }))
}
