//! Suppliers and payments against their outstanding balance.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::authz::Capability;
use crate::db::repository::supplier;
use crate::models::Supplier;
use crate::validation::Violations;

const MODULE: &str = "suppliers";

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Supplier>>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    Ok(Json(supplier::list_suppliers(&conn)?))
}

#[derive(Deserialize)]
pub struct SupplierRequest {
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub balance: f64,
}

fn validate(req: &SupplierRequest) -> Result<(), ApiError> {
    let mut v = Violations::new();
    v.require("name", &req.name);
    v.check_phone("phone", req.phone.as_deref());
    v.check_email("email", req.email.as_deref());
    Ok(v.into_result()?)
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<SupplierRequest>,
) -> Result<Json<Supplier>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    validate(&req)?;

    let new_supplier = Supplier {
        id: Uuid::new_v4(),
        name: req.name,
        contact_person: req.contact_person,
        phone: req.phone,
        email: req.email,
        address: req.address,
        balance: req.balance,
    };

    let conn = ctx.open_db()?;
    supplier::insert_supplier(&conn, &new_supplier)?;
    Ok(Json(new_supplier))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<SupplierRequest>,
) -> Result<Json<Supplier>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    validate(&req)?;

    let conn = ctx.open_db()?;
    let mut existing = supplier::get_supplier(&conn, &id)?;
    existing.name = req.name;
    existing.contact_person = req.contact_person;
    existing.phone = req.phone;
    existing.email = req.email;
    existing.address = req.address;
    existing.balance = req.balance;
    supplier::update_supplier(&conn, &existing)?;
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
    supplier::delete_supplier(&conn, &id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct PaymentRequest {
    pub amount: f64,
}

/// `POST /api/lab/suppliers/:id/payments` — pay down the balance.
pub async fn record_payment(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<Supplier>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    let mut v = Violations::new();
    v.require_positive("amount", req.amount);
    v.into_result()?;

    let conn = ctx.open_db()?;
    Ok(Json(supplier::record_payment(&conn, &id, req.amount)?))
}
