use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::FinanceKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceRecord {
    pub id: Uuid,
    pub kind: FinanceKind,
    pub category: Option<String>,
    pub amount: f64,
    pub note: Option<String>,
    pub recorded_by: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
