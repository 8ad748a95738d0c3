use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::Patient;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, age, gender, phone, email, address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            patient.id.to_string(),
            patient.name,
            patient.age,
            patient.gender,
            patient.phone,
            patient.email,
            patient.address,
            patient.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &str) -> Result<Patient, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, age, gender, phone, email, address, created_at
             FROM patients WHERE id = ?1",
            params![id],
            |row| Ok(patient_row_from_rusqlite(row)),
        )
        .optional()?;

    match row {
        Some(r) => patient_from_row(r?),
        None => Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: id.to_string(),
        }),
    }
}

/// List patients, optionally filtered by a case-insensitive name/phone match.
pub fn list_patients(
    conn: &Connection,
    search: Option<&str>,
) -> Result<Vec<Patient>, DatabaseError> {
    let mut out = Vec::new();

    match search {
        Some(term) => {
            let pattern = format!("%{term}%");
            let mut stmt = conn.prepare(
                "SELECT id, name, age, gender, phone, email, address, created_at
                 FROM patients
                 WHERE LOWER(name) LIKE LOWER(?1) OR phone LIKE ?1
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map(params![pattern], |row| Ok(patient_row_from_rusqlite(row)))?;
            for row in rows {
                out.push(patient_from_row(row??)?);
            }
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, name, age, gender, phone, email, address, created_at
                 FROM patients ORDER BY created_at DESC",
            )?;
            let rows = stmt.query_map([], |row| Ok(patient_row_from_rusqlite(row)))?;
            for row in rows {
                out.push(patient_from_row(row??)?);
            }
        }
    }

    Ok(out)
}

pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET name = ?2, age = ?3, gender = ?4, phone = ?5,
                email = ?6, address = ?7
         WHERE id = ?1",
        params![
            patient.id.to_string(),
            patient.name,
            patient.age,
            patient.gender,
            patient.phone,
            patient.email,
            patient.address,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: patient.id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_patient(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn count_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
    Ok(count)
}

struct PatientRow {
    id: String,
    name: String,
    age: Option<u32>,
    gender: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        address: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: parse_uuid("patients.id", &row.id)?,
        name: row.name,
        age: row.age,
        gender: row.gender,
        phone: row.phone,
        email: row.email,
        address: row.address,
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use uuid::Uuid;

    fn sample_patient(name: &str, phone: &str) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            name: name.to_string(),
            age: Some(34),
            gender: Some("female".into()),
            phone: Some(phone.to_string()),
            email: None,
            address: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn search_matches_name_case_insensitively() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, &sample_patient("Amina Yusuf", "0700111222")).unwrap();
        insert_patient(&conn, &sample_patient("John Okello", "0700999888")).unwrap();

        let hits = list_patients(&conn, Some("amina")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Amina Yusuf");
    }

    #[test]
    fn search_matches_phone() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, &sample_patient("Amina Yusuf", "0700111222")).unwrap();

        let hits = list_patients(&conn, Some("111")).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn update_missing_patient_is_not_found() {
        let conn = open_memory_database().unwrap();
        let ghost = sample_patient("Ghost", "000");
        let err = update_patient(&conn, &ghost).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
