use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ResultFlag, SampleStatus};

/// A test ordered on a sample. `test_id` references the catalog; the name
/// is denormalized at order time so reports survive catalog edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedTest {
    pub test_id: String,
    pub test_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub sample_no: String,
    pub tests: Vec<OrderedTest>,
    pub status: SampleStatus,
    pub priority: Option<String>,
    pub referred_by: Option<String>,
    pub collected_at: DateTime<Utc>,
}

/// One entered result value. For multi-test samples `parameter_id` is the
/// composite `<testKey>::<paramId>`; a bare id belongs to no test group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleResult {
    pub id: Uuid,
    pub sample_id: Uuid,
    pub parameter_id: String,
    pub value: String,
    pub unit: Option<String>,
    pub flag: Option<ResultFlag>,
    pub entered_by: Option<String>,
    pub entered_at: DateTime<Utc>,
}

impl SampleResult {
    /// Split the composite parameter id into (testKey, paramId), if prefixed.
    pub fn test_key(&self) -> Option<&str> {
        self.parameter_id.split_once("::").map(|(key, _)| key)
    }
}

/// Free-text interpretation attached to one test of a sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleInterpretation {
    pub id: Uuid,
    pub sample_id: Uuid,
    pub test_key: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(parameter_id: &str) -> SampleResult {
        SampleResult {
            id: Uuid::new_v4(),
            sample_id: Uuid::new_v4(),
            parameter_id: parameter_id.to_string(),
            value: "12.5".into(),
            unit: None,
            flag: None,
            entered_by: None,
            entered_at: Utc::now(),
        }
    }

    #[test]
    fn composite_parameter_id_yields_test_key() {
        assert_eq!(result_with("cbc::hb").test_key(), Some("cbc"));
    }

    #[test]
    fn bare_parameter_id_has_no_test_key() {
        assert_eq!(result_with("glucose").test_key(), None);
    }
}
