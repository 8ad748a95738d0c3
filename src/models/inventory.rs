use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub quantity: f64,
    pub unit: Option<String>,
    pub reorder_level: f64,
    pub unit_price: f64,
    pub expiry_date: Option<NaiveDate>,
    pub supplier_id: Option<Uuid>,
}

impl InventoryItem {
    /// At or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    pub fn stock_value(&self) -> f64 {
        self.quantity * self.unit_price
    }
}
