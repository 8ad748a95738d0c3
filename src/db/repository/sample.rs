use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{parse_json, parse_uuid, to_json};
use crate::db::DatabaseError;
use crate::models::{ResultFlag, Sample, SampleInterpretation, SampleResult, SampleStatus};

pub fn insert_sample(conn: &Connection, sample: &Sample) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO samples (id, patient_id, sample_no, tests, status, priority,
                referred_by, collected_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            sample.id.to_string(),
            sample.patient_id.to_string(),
            sample.sample_no,
            to_json("samples.tests", &sample.tests)?,
            sample.status.as_str(),
            sample.priority,
            sample.referred_by,
            sample.collected_at,
        ],
    )
    .map_err(|e| DatabaseError::from_insert(e, "sample number already used"))?;
    Ok(())
}

pub fn get_sample(conn: &Connection, id: &str) -> Result<Sample, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, patient_id, sample_no, tests, status, priority, referred_by, collected_at
             FROM samples WHERE id = ?1",
            params![id],
            |row| Ok(sample_row_from_rusqlite(row)),
        )
        .optional()?;

    match row {
        Some(r) => sample_from_row(r?),
        None => Err(DatabaseError::NotFound {
            entity_type: "sample".into(),
            id: id.to_string(),
        }),
    }
}

pub fn list_samples(
    conn: &Connection,
    status: Option<SampleStatus>,
) -> Result<Vec<Sample>, DatabaseError> {
    let mut out = Vec::new();

    match status {
        Some(status) => {
            let mut stmt = conn.prepare(
                "SELECT id, patient_id, sample_no, tests, status, priority, referred_by, collected_at
                 FROM samples WHERE status = ?1 ORDER BY collected_at DESC",
            )?;
            let rows =
                stmt.query_map(params![status.as_str()], |row| Ok(sample_row_from_rusqlite(row)))?;
            for row in rows {
                out.push(sample_from_row(row??)?);
            }
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, patient_id, sample_no, tests, status, priority, referred_by, collected_at
                 FROM samples ORDER BY collected_at DESC",
            )?;
            let rows = stmt.query_map([], |row| Ok(sample_row_from_rusqlite(row)))?;
            for row in rows {
                out.push(sample_from_row(row??)?);
            }
        }
    }

    Ok(out)
}

pub fn update_sample(conn: &Connection, sample: &Sample) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE samples SET tests = ?2, status = ?3, priority = ?4, referred_by = ?5
         WHERE id = ?1",
        params![
            sample.id.to_string(),
            to_json("samples.tests", &sample.tests)?,
            sample.status.as_str(),
            sample.priority,
            sample.referred_by,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "sample".into(),
            id: sample.id.to_string(),
        });
    }
    Ok(())
}

pub fn update_sample_status(
    conn: &Connection,
    id: &str,
    status: SampleStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE samples SET status = ?2 WHERE id = ?1",
        params![id, status.as_str()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "sample".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_sample(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM samples WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "sample".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Replace the full result set for a sample. Result entry always submits the
/// whole sheet, so partial updates are not supported.
pub fn replace_results(
    conn: &Connection,
    sample_id: &Uuid,
    results: &[SampleResult],
) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM sample_results WHERE sample_id = ?1",
        params![sample_id.to_string()],
    )?;
    for result in results {
        conn.execute(
            "INSERT INTO sample_results (id, sample_id, parameter_id, value, unit, flag,
                    entered_by, entered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                result.id.to_string(),
                sample_id.to_string(),
                result.parameter_id,
                result.value,
                result.unit,
                result.flag.map(|f| f.as_str()),
                result.entered_by,
                result.entered_at,
            ],
        )?;
    }
    Ok(())
}

pub fn get_results(conn: &Connection, sample_id: &str) -> Result<Vec<SampleResult>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, sample_id, parameter_id, value, unit, flag, entered_by, entered_at
         FROM sample_results WHERE sample_id = ?1 ORDER BY rowid",
    )?;

    let rows = stmt.query_map(params![sample_id], |row| Ok(result_row_from_rusqlite(row)))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(result_from_row(row??)?);
    }
    Ok(results)
}

pub fn upsert_interpretation(
    conn: &Connection,
    interp: &SampleInterpretation,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sample_interpretations (id, sample_id, test_key, text)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(sample_id, test_key) DO UPDATE SET text = excluded.text",
        params![
            interp.id.to_string(),
            interp.sample_id.to_string(),
            interp.test_key,
            interp.text,
        ],
    )?;
    Ok(())
}

pub fn get_interpretations(
    conn: &Connection,
    sample_id: &str,
) -> Result<Vec<SampleInterpretation>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, sample_id, test_key, text
         FROM sample_interpretations WHERE sample_id = ?1",
    )?;

    let rows = stmt.query_map(params![sample_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut interps = Vec::new();
    for row in rows {
        let (id, sample_id, test_key, text) = row?;
        interps.push(SampleInterpretation {
            id: parse_uuid("sample_interpretations.id", &id)?,
            sample_id: parse_uuid("sample_interpretations.sample_id", &sample_id)?,
            test_key,
            text,
        });
    }
    Ok(interps)
}

pub fn count_samples_by_status(
    conn: &Connection,
    status: SampleStatus,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM samples WHERE status = ?1",
        params![status.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Samples collected per calendar day over the trailing `days` days,
/// oldest bucket first. Days with no samples appear with a zero count.
pub fn samples_per_day(
    conn: &Connection,
    days: u32,
) -> Result<Vec<(String, i64)>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT date(collected_at) AS day, COUNT(*)
         FROM samples
         WHERE date(collected_at) >= date('now', ?1)
         GROUP BY day",
    )?;
    let offset = format!("-{} days", days.saturating_sub(1));
    let rows = stmt.query_map(params![offset], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counted = std::collections::HashMap::new();
    for row in rows {
        let (day, count) = row?;
        counted.insert(day, count);
    }

    let today = Utc::now().date_naive();
    let mut buckets = Vec::with_capacity(days as usize);
    for back in (0..days).rev() {
        let day = today - chrono::Duration::days(back as i64);
        let key = day.format("%Y-%m-%d").to_string();
        let count = counted.get(&key).copied().unwrap_or(0);
        buckets.push((key, count));
    }
    Ok(buckets)
}

struct SampleRow {
    id: String,
    patient_id: String,
    sample_no: String,
    tests: String,
    status: String,
    priority: Option<String>,
    referred_by: Option<String>,
    collected_at: DateTime<Utc>,
}

fn sample_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<SampleRow, rusqlite::Error> {
    Ok(SampleRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        sample_no: row.get(2)?,
        tests: row.get(3)?,
        status: row.get(4)?,
        priority: row.get(5)?,
        referred_by: row.get(6)?,
        collected_at: row.get(7)?,
    })
}

fn sample_from_row(row: SampleRow) -> Result<Sample, DatabaseError> {
    Ok(Sample {
        id: parse_uuid("samples.id", &row.id)?,
        patient_id: parse_uuid("samples.patient_id", &row.patient_id)?,
        sample_no: row.sample_no,
        tests: parse_json("samples.tests", &row.tests)?,
        status: SampleStatus::from_str(&row.status)?,
        priority: row.priority,
        referred_by: row.referred_by,
        collected_at: row.collected_at,
    })
}

struct ResultRow {
    id: String,
    sample_id: String,
    parameter_id: String,
    value: String,
    unit: Option<String>,
    flag: Option<String>,
    entered_by: Option<String>,
    entered_at: DateTime<Utc>,
}

fn result_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ResultRow, rusqlite::Error> {
    Ok(ResultRow {
        id: row.get(0)?,
        sample_id: row.get(1)?,
        parameter_id: row.get(2)?,
        value: row.get(3)?,
        unit: row.get(4)?,
        flag: row.get(5)?,
        entered_by: row.get(6)?,
        entered_at: row.get(7)?,
    })
}

fn result_from_row(row: ResultRow) -> Result<SampleResult, DatabaseError> {
    Ok(SampleResult {
        id: parse_uuid("sample_results.id", &row.id)?,
        sample_id: parse_uuid("sample_results.sample_id", &row.sample_id)?,
        parameter_id: row.parameter_id,
        value: row.value,
        unit: row.unit,
        flag: row.flag.as_deref().map(ResultFlag::from_str).transpose()?,
        entered_by: row.entered_by,
        entered_at: row.entered_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::patient::insert_patient;
    use crate::models::{OrderedTest, Patient};

    fn seed_patient(conn: &Connection) -> Uuid {
        let patient = Patient {
            id: Uuid::new_v4(),
            name: "Test Patient".into(),
            age: Some(40),
            gender: None,
            phone: None,
            email: None,
            address: None,
            created_at: Utc::now(),
        };
        insert_patient(conn, &patient).unwrap();
        patient.id
    }

    fn seed_sample(conn: &Connection, patient_id: Uuid, sample_no: &str) -> Sample {
        let sample = Sample {
            id: Uuid::new_v4(),
            patient_id,
            sample_no: sample_no.to_string(),
            tests: vec![OrderedTest {
                test_id: "cbc".into(),
                test_name: "Complete Blood Count".into(),
            }],
            status: SampleStatus::Pending,
            priority: None,
            referred_by: None,
            collected_at: Utc::now(),
        };
        insert_sample(conn, &sample).unwrap();
        sample
    }

    fn result(sample_id: Uuid, parameter_id: &str, value: &str) -> SampleResult {
        SampleResult {
            id: Uuid::new_v4(),
            sample_id,
            parameter_id: parameter_id.to_string(),
            value: value.to_string(),
            unit: None,
            flag: Some(ResultFlag::Normal),
            entered_by: Some("tech1".into()),
            entered_at: Utc::now(),
        }
    }

    #[test]
    fn replace_results_overwrites_previous_sheet() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);
        let sample = seed_sample(&conn, patient_id, "S-0001");

        replace_results(&conn, &sample.id, &[result(sample.id, "cbc::hb", "13.1")]).unwrap();
        replace_results(
            &conn,
            &sample.id,
            &[
                result(sample.id, "cbc::hb", "13.4"),
                result(sample.id, "cbc::wbc", "7.2"),
            ],
        )
        .unwrap();

        let results = get_results(&conn, &sample.id.to_string()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].value, "13.4");
    }

    #[test]
    fn duplicate_sample_no_rejected() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);
        seed_sample(&conn, patient_id, "S-0001");

        let dup = Sample {
            id: Uuid::new_v4(),
            patient_id,
            sample_no: "S-0001".into(),
            tests: vec![],
            status: SampleStatus::Pending,
            priority: None,
            referred_by: None,
            collected_at: Utc::now(),
        };
        let err = insert_sample(&conn, &dup).unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate(_)));
    }

    #[test]
    fn interpretation_upsert_replaces_text() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);
        let sample = seed_sample(&conn, patient_id, "S-0002");

        let mut interp = SampleInterpretation {
            id: Uuid::new_v4(),
            sample_id: sample.id,
            test_key: "cbc".into(),
            text: "Within normal limits".into(),
        };
        upsert_interpretation(&conn, &interp).unwrap();

        interp.id = Uuid::new_v4();
        interp.text = "Mild leukocytosis".into();
        upsert_interpretation(&conn, &interp).unwrap();

        let interps = get_interpretations(&conn, &sample.id.to_string()).unwrap();
        assert_eq!(interps.len(), 1);
        assert_eq!(interps[0].text, "Mild leukocytosis");
    }

    #[test]
    fn deleting_sample_cascades_results() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);
        let sample = seed_sample(&conn, patient_id, "S-0003");
        replace_results(&conn, &sample.id, &[result(sample.id, "glu", "98")]).unwrap();

        delete_sample(&conn, &sample.id.to_string()).unwrap();
        assert!(get_results(&conn, &sample.id.to_string()).unwrap().is_empty());
    }

    #[test]
    fn samples_per_day_has_fixed_bucket_count() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);
        seed_sample(&conn, patient_id, "S-0004");

        let buckets = samples_per_day(&conn, 7).unwrap();
        assert_eq!(buckets.len(), 7);
        // Today's bucket is last and holds the seeded sample
        assert_eq!(buckets.last().unwrap().1, 1);
        assert_eq!(buckets.iter().map(|(_, c)| c).sum::<i64>(), 1);
    }
}
