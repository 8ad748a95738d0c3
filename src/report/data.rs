//! Report data synthesis: join a sample with the catalog into printable rows
//! and fan multi-test samples out into one page per test key.
//!
//! The only linkage between a result and its test is the `testKey::` prefix
//! on `parameter_id`. Nothing enforces that the key matches an ordered test,
//! so name resolution degrades gracefully down to the raw key.

use std::collections::HashMap;

use crate::models::{
    LabTest, Patient, ResultFlag, Sample, SampleInterpretation, SampleResult, TestParameter,
};

/// One line of the result table, fully resolved for printing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub parameter_name: String,
    pub value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub flag: Option<ResultFlag>,
}

/// Everything one rendered page needs, computed fresh per print request.
#[derive(Debug, Clone)]
pub struct ReportData {
    pub patient_name: String,
    pub patient_age: Option<u32>,
    pub patient_gender: Option<String>,
    pub sample_no: String,
    pub referred_by: Option<String>,
    pub collected_at: String,
    pub rows: Vec<ResultRow>,
    pub clinical_notes: Option<String>,
}

/// A single page of the final report. `title` is the resolved test name for
/// fan-out pages, `None` for the whole-sample page.
#[derive(Debug, Clone)]
pub struct ReportPage {
    pub title: Option<String>,
    pub data: ReportData,
}

/// Resolve a test key to a display name: ordered-test id match first, then
/// case-insensitive name match, then the raw key as-is.
fn resolve_test_name(sample: &Sample, key: &str) -> String {
    if let Some(ordered) = sample.tests.iter().find(|t| t.test_id == key) {
        return ordered.test_name.clone();
    }
    if let Some(ordered) = sample
        .tests
        .iter()
        .find(|t| t.test_name.eq_ignore_ascii_case(key))
    {
        return ordered.test_name.clone();
    }
    key.to_string()
}

/// Look a bare parameter id up across the ordered tests' catalog entries.
fn find_parameter<'a>(catalog: &'a [LabTest], param_id: &str) -> Option<&'a TestParameter> {
    catalog
        .iter()
        .flat_map(|test| test.parameters.iter())
        .find(|p| p.id == param_id)
}

fn row_from_result(catalog: &[LabTest], result: &SampleResult) -> ResultRow {
    let bare_id = result
        .parameter_id
        .split_once("::")
        .map(|(_, id)| id)
        .unwrap_or(&result.parameter_id);

    match find_parameter(catalog, bare_id) {
        Some(param) => ResultRow {
            parameter_name: param.name.clone(),
            value: result.value.clone(),
            unit: result.unit.clone().or_else(|| param.unit.clone()),
            reference_range: param.reference_range.clone(),
            flag: result.flag,
        },
        None => ResultRow {
            parameter_name: bare_id.to_string(),
            value: result.value.clone(),
            unit: result.unit.clone(),
            reference_range: None,
            flag: result.flag,
        },
    }
}

fn base_data(sample: &Sample, patient: &Patient) -> ReportData {
    ReportData {
        patient_name: patient.name.clone(),
        patient_age: patient.age,
        patient_gender: patient.gender.clone(),
        sample_no: sample.sample_no.clone(),
        referred_by: sample.referred_by.clone(),
        collected_at: sample.collected_at.format("%d %b %Y %H:%M").to_string(),
        rows: Vec::new(),
        clinical_notes: None,
    }
}

/// Split results into pages.
///
/// Results with a `testKey::` prefix are grouped by key in first-seen order,
/// one page per key. Results without a prefix all land on one page; when both
/// kinds are present the unprefixed page comes last. A sample with no
/// prefixed results at all produces exactly one page with every row.
pub fn build_pages(
    sample: &Sample,
    patient: &Patient,
    catalog: &[LabTest],
    results: &[SampleResult],
    interpretations: &[SampleInterpretation],
) -> Vec<ReportPage> {
    let notes_by_key: HashMap<&str, &str> = interpretations
        .iter()
        .map(|i| (i.test_key.as_str(), i.text.as_str()))
        .collect();

    let mut keyed: Vec<(String, Vec<ResultRow>)> = Vec::new();
    let mut unkeyed: Vec<ResultRow> = Vec::new();

    for result in results {
        let row = row_from_result(catalog, result);
        match result.test_key() {
            Some(key) => match keyed.iter_mut().find(|(k, _)| k == key) {
                Some((_, rows)) => rows.push(row),
                None => keyed.push((key.to_string(), vec![row])),
            },
            None => unkeyed.push(row),
        }
    }

    let mut pages = Vec::new();

    for (key, rows) in keyed {
        let mut data = base_data(sample, patient);
        data.rows = rows;
        data.clinical_notes = notes_by_key.get(key.as_str()).map(|s| s.to_string());
        pages.push(ReportPage {
            title: Some(resolve_test_name(sample, &key)),
            data,
        });
    }

    if !unkeyed.is_empty() || pages.is_empty() {
        let mut data = base_data(sample, patient);
        data.rows = unkeyed;
        // The whole-sample page carries every interpretation, stacked.
        let all_notes: Vec<&str> = interpretations.iter().map(|i| i.text.as_str()).collect();
        if !all_notes.is_empty() && pages.is_empty() {
            data.clinical_notes = Some(all_notes.join("\n\n"));
        }
        pages.push(ReportPage { title: None, data });
    }

    pages
}
