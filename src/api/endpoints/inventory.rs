//! Inventory items, low-stock listing, and total stock value.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::authz::Capability;
use crate::db::repository::inventory;
use crate::models::InventoryItem;
use crate::validation::Violations;

const MODULE: &str = "inventory";

pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    Ok(Json(inventory::list_items(&conn)?))
}

pub async fn low_stock(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    Ok(Json(inventory::list_low_stock(&conn)?))
}

#[derive(Serialize)]
pub struct StockValueResponse {
    pub total_value: f64,
}

pub async fn stock_value(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<StockValueResponse>, ApiError> {
    if !auth.can(MODULE, Capability::View) {
        return Err(ApiError::Forbidden);
    }
    let conn = ctx.open_db()?;
    Ok(Json(StockValueResponse {
        total_value: inventory::total_stock_value(&conn)?,
    }))
}

#[derive(Deserialize)]
pub struct ItemRequest {
    pub name: String,
    pub category: Option<String>,
    pub quantity: f64,
    pub unit: Option<String>,
    pub reorder_level: f64,
    pub unit_price: f64,
    pub expiry_date: Option<NaiveDate>,
    pub supplier_id: Option<Uuid>,
}

fn validate(req: &ItemRequest) -> Result<(), ApiError> {
    let mut v = Violations::new();
    v.require("name", &req.name);
    v.require_non_negative("quantity", req.quantity);
    v.require_non_negative("reorder_level", req.reorder_level);
    v.require_non_negative("unit_price", req.unit_price);
    Ok(v.into_result()?)
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    validate(&req)?;

    let item = InventoryItem {
        id: Uuid::new_v4(),
        name: req.name,
        category: req.category,
        quantity: req.quantity,
        unit: req.unit,
        reorder_level: req.reorder_level,
        unit_price: req.unit_price,
        expiry_date: req.expiry_date,
        supplier_id: req.supplier_id,
    };

    let conn = ctx.open_db()?;
    inventory::insert_item(&conn, &item)?;
    Ok(Json(item))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    if !auth.can(MODULE, Capability::Edit) {
        return Err(ApiError::Forbidden);
    }
    validate(&req)?;

    let conn = ctx.open_db()?;
    let mut existing = inventory::get_item(&conn, &id)?;
    existing.name = req.name;
    existing.category = req.category;
    existing.quantity = req.quantity;
    existing.unit = req.unit;
    existing.reorder_level = req.reorder_level;
    existing.unit_price = req.unit_price;
    existing.expiry_date = req.expiry_date;
    existing.supplier_id = req.supplier_id;
    inventory::update_item(&conn, &existing)?;
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
    inventory::delete_item(&conn, &id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
