use serde::{Deserialize, Serialize};

/// The lab-wide settings singleton. `report_template` is stored exactly as
/// submitted (opaque JSON) so a save/fetch round-trip loses no fields;
/// `revision` increments on every write and backs conditional updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabSettings {
    pub lab_name: String,
    pub lab_subtitle: Option<String>,
    pub logo_url: Option<String>,
    pub contact: Option<String>,
    pub report_template: Option<serde_json::Value>,
    pub revision: i64,
}
