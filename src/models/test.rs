use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One measurable parameter within a catalog test (e.g. "Hemoglobin" in CBC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestParameter {
    pub id: String,
    pub name: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
}

/// Catalog entry for an orderable lab test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabTest {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub category: Option<String>,
    pub price: f64,
    pub sample_type: Option<String>,
    pub parameters: Vec<TestParameter>,
    pub turnaround_hours: Option<u32>,
}
