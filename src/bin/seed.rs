//! Seed the test catalog with a standard panel of lab tests.
//!
//! Idempotent: tests that already exist (by name) are left untouched.

use anyhow::Context;
use uuid::Uuid;

use labdesk::config::AppConfig;
use labdesk::db::{self, DatabaseError};
use labdesk::db::repository::test_catalog;
use labdesk::models::{LabTest, TestParameter};

fn param(id: &str, name: &str, unit: &str, range: &str) -> TestParameter {
    TestParameter {
        id: id.to_string(),
        name: name.to_string(),
        unit: if unit.is_empty() { None } else { Some(unit.to_string()) },
        reference_range: if range.is_empty() { None } else { Some(range.to_string()) },
    }
}

fn test(
    name: &str,
    code: &str,
    category: &str,
    price: f64,
    sample_type: &str,
    turnaround_hours: u32,
    parameters: Vec<TestParameter>,
) -> LabTest {
    LabTest {
        id: Uuid::new_v4(),
        name: name.to_string(),
        code: Some(code.to_string()),
        category: Some(category.to_string()),
        price,
        sample_type: Some(sample_type.to_string()),
        parameters,
        turnaround_hours: Some(turnaround_hours),
    }
}

fn catalog() -> Vec<LabTest> {
    vec![
        test("Complete Blood Count", "CBC", "Hematology", 350.0, "Whole Blood", 4, vec![
            param("hb", "Hemoglobin", "g/dL", "13.0 - 17.0"),
            param("rbc", "RBC Count", "million/µL", "4.5 - 5.5"),
            param("wbc", "WBC Count", "thousand/µL", "4.0 - 11.0"),
            param("platelets", "Platelet Count", "thousand/µL", "150 - 450"),
            param("hct", "Hematocrit", "%", "40 - 50"),
        ]),
        test("Lipid Profile", "LIPID", "Biochemistry", 600.0, "Serum", 12, vec![
            param("total-chol", "Total Cholesterol", "mg/dL", "< 200"),
            param("hdl", "HDL Cholesterol", "mg/dL", "> 40"),
            param("ldl", "LDL Cholesterol", "mg/dL", "< 100"),
            param("triglycerides", "Triglycerides", "mg/dL", "< 150"),
        ]),
        test("Liver Function Test", "LFT", "Biochemistry", 550.0, "Serum", 12, vec![
            param("bilirubin-total", "Total Bilirubin", "mg/dL", "0.3 - 1.2"),
            param("sgot", "SGOT (AST)", "U/L", "< 40"),
            param("sgpt", "SGPT (ALT)", "U/L", "< 41"),
            param("alk-phos", "Alkaline Phosphatase", "U/L", "44 - 147"),
            param("albumin", "Albumin", "g/dL", "3.5 - 5.0"),
        ]),
        test("Kidney Function Test", "KFT", "Biochemistry", 500.0, "Serum", 12, vec![
            param("urea", "Blood Urea", "mg/dL", "15 - 40"),
            param("creatinine", "Serum Creatinine", "mg/dL", "0.6 - 1.2"),
            param("uric-acid", "Uric Acid", "mg/dL", "3.5 - 7.2"),
        ]),
        test("Fasting Blood Sugar", "FBS", "Biochemistry", 120.0, "Plasma", 4, vec![
            param("fasting", "Glucose (Fasting)", "mg/dL", "70 - 100"),
        ]),
        test("Postprandial Blood Sugar", "PPBS", "Biochemistry", 120.0, "Plasma", 4, vec![
            param("pp", "Glucose (Postprandial)", "mg/dL", "< 140"),
        ]),
        test("HbA1c", "HBA1C", "Biochemistry", 450.0, "Whole Blood", 24, vec![
            param("hba1c", "Glycated Hemoglobin", "%", "< 5.7"),
        ]),
        test("Thyroid Profile", "TFT", "Endocrinology", 700.0, "Serum", 24, vec![
            param("t3", "Triiodothyronine (T3)", "ng/dL", "80 - 200"),
            param("t4", "Thyroxine (T4)", "µg/dL", "5.1 - 14.1"),
            param("tsh", "TSH", "µIU/mL", "0.4 - 4.0"),
        ]),
        test("Urine Routine", "URINE-R", "Clinical Pathology", 150.0, "Urine", 4, vec![
            param("color", "Color", "", "Pale Yellow"),
            param("protein", "Protein", "", "Absent"),
            param("glucose", "Glucose", "", "Absent"),
            param("pus-cells", "Pus Cells", "/hpf", "0 - 5"),
        ]),
        test("Erythrocyte Sedimentation Rate", "ESR", "Hematology", 100.0, "Whole Blood", 4, vec![
            param("esr", "ESR", "mm/hr", "0 - 20"),
        ]),
        test("C-Reactive Protein", "CRP", "Immunology", 400.0, "Serum", 12, vec![
            param("crp", "CRP", "mg/L", "< 6"),
        ]),
        test("Vitamin D (25-OH)", "VITD", "Biochemistry", 1200.0, "Serum", 48, vec![
            param("vit-d", "25-Hydroxy Vitamin D", "ng/mL", "30 - 100"),
        ]),
        test("Vitamin B12", "VITB12", "Biochemistry", 900.0, "Serum", 48, vec![
            param("b12", "Vitamin B12", "pg/mL", "200 - 900"),
        ]),
        test("Serum Electrolytes", "ELEC", "Biochemistry", 400.0, "Serum", 6, vec![
            param("sodium", "Sodium", "mEq/L", "135 - 145"),
            param("potassium", "Potassium", "mEq/L", "3.5 - 5.1"),
            param("chloride", "Chloride", "mEq/L", "98 - 107"),
        ]),
        test("Prothrombin Time", "PT-INR", "Hematology", 350.0, "Citrated Plasma", 6, vec![
            param("pt", "Prothrombin Time", "seconds", "11 - 13.5"),
            param("inr", "INR", "", "0.8 - 1.1"),
        ]),
        test("Blood Group & Rh Typing", "BG-RH", "Immunohematology", 150.0, "Whole Blood", 2, vec![
            param("abo", "ABO Group", "", ""),
            param("rh", "Rh Factor", "", ""),
        ]),
        test("Widal Test", "WIDAL", "Serology", 250.0, "Serum", 12, vec![
            param("to", "S. typhi O", "titre", "< 1:80"),
            param("th", "S. typhi H", "titre", "< 1:160"),
        ]),
        test("Dengue NS1 Antigen", "DENGUE-NS1", "Serology", 600.0, "Serum", 6, vec![
            param("ns1", "NS1 Antigen", "", "Negative"),
        ]),
        test("Malaria Parasite Smear", "MP", "Parasitology", 200.0, "Whole Blood", 4, vec![
            param("mp", "Malaria Parasite", "", "Not Seen"),
        ]),
        test("Serum Amylase", "AMYL", "Biochemistry", 450.0, "Serum", 12, vec![
            param("amylase", "Amylase", "U/L", "30 - 110"),
        ]),
    ]
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = db::open_database(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    let mut inserted = 0;
    let mut skipped = 0;
    for entry in catalog() {
        match test_catalog::insert_test(&conn, &entry) {
            Ok(()) => inserted += 1,
            Err(DatabaseError::Duplicate(_)) => skipped += 1,
            Err(e) => return Err(e).with_context(|| format!("seeding '{}'", entry.name)),
        }
    }

    println!("seeded {inserted} tests ({skipped} already present)");
    Ok(())
}
