use rusqlite::{params, Connection, OptionalExtension};

use super::{parse_json, parse_uuid, to_json};
use crate::db::DatabaseError;
use crate::models::LabTest;

pub fn insert_test(conn: &Connection, test: &LabTest) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO test_catalog (id, name, code, category, price, sample_type,
                parameters, turnaround_hours)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            test.id.to_string(),
            test.name,
            test.code,
            test.category,
            test.price,
            test.sample_type,
            to_json("test_catalog.parameters", &test.parameters)?,
            test.turnaround_hours,
        ],
    )
    .map_err(|e| DatabaseError::from_insert(e, "test name already in catalog"))?;
    Ok(())
}

pub fn get_test(conn: &Connection, id: &str) -> Result<LabTest, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, code, category, price, sample_type, parameters, turnaround_hours
             FROM test_catalog WHERE id = ?1",
            params![id],
            |row| Ok(test_row_from_rusqlite(row)),
        )
        .optional()?;

    match row {
        Some(r) => test_from_row(r?),
        None => Err(DatabaseError::NotFound {
            entity_type: "test".into(),
            id: id.to_string(),
        }),
    }
}

pub fn list_tests(conn: &Connection) -> Result<Vec<LabTest>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, code, category, price, sample_type, parameters, turnaround_hours
         FROM test_catalog ORDER BY name",
    )?;

    let rows = stmt.query_map([], |row| Ok(test_row_from_rusqlite(row)))?;

    let mut tests = Vec::new();
    for row in rows {
        tests.push(test_from_row(row??)?);
    }
    Ok(tests)
}

pub fn update_test(conn: &Connection, test: &LabTest) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE test_catalog SET name = ?2, code = ?3, category = ?4, price = ?5,
                sample_type = ?6, parameters = ?7, turnaround_hours = ?8
         WHERE id = ?1",
        params![
            test.id.to_string(),
            test.name,
            test.code,
            test.category,
            test.price,
            test.sample_type,
            to_json("test_catalog.parameters", &test.parameters)?,
            test.turnaround_hours,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "test".into(),
            id: test.id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_test(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM test_catalog WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "test".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn count_tests(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM test_catalog", [], |row| row.get(0))?;
    Ok(count)
}

struct TestRow {
    id: String,
    name: String,
    code: Option<String>,
    category: Option<String>,
    price: f64,
    sample_type: Option<String>,
    parameters: String,
    turnaround_hours: Option<u32>,
}

fn test_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<TestRow, rusqlite::Error> {
    Ok(TestRow {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        category: row.get(3)?,
        price: row.get(4)?,
        sample_type: row.get(5)?,
        parameters: row.get(6)?,
        turnaround_hours: row.get(7)?,
    })
}

fn test_from_row(row: TestRow) -> Result<LabTest, DatabaseError> {
    Ok(LabTest {
        id: parse_uuid("test_catalog.id", &row.id)?,
        name: row.name,
        code: row.code,
        category: row.category,
        price: row.price,
        sample_type: row.sample_type,
        parameters: parse_json("test_catalog.parameters", &row.parameters)?,
        turnaround_hours: row.turnaround_hours,
    })
}
