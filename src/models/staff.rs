use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AttendanceStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: Uuid,
    pub name: String,
    pub designation: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub joined_at: Option<NaiveDate>,
    pub base_salary: f64,
}

/// One attendance mark. (staff_id, date) is unique at the database level;
/// a second mark for the same day is rejected as a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

/// Salary payment for one month (`month` is "YYYY-MM"; unique per staff).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryPayment {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub month: String,
    pub amount: f64,
    pub paid_at: DateTime<Utc>,
}
