use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentStatus};

pub fn insert_appointment(
    conn: &Connection,
    appointment: &Appointment,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_name, phone, scheduled_at, status, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            appointment.id.to_string(),
            appointment.patient_name,
            appointment.phone,
            appointment.scheduled_at,
            appointment.status.as_str(),
            appointment.note,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &str) -> Result<Appointment, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, patient_name, phone, scheduled_at, status, note
             FROM appointments WHERE id = ?1",
            params![id],
            |row| Ok(appointment_row_from_rusqlite(row)),
        )
        .optional()?;

    match row {
        Some(r) => appointment_from_row(r?),
        None => Err(DatabaseError::NotFound {
            entity_type: "appointment".into(),
            id: id.to_string(),
        }),
    }
}

pub fn list_appointments(conn: &Connection) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_name, phone, scheduled_at, status, note
         FROM appointments ORDER BY scheduled_at",
    )?;

    let rows = stmt.query_map([], |row| Ok(appointment_row_from_rusqlite(row)))?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row??)?);
    }
    Ok(appointments)
}

pub fn update_appointment(
    conn: &Connection,
    appointment: &Appointment,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET patient_name = ?2, phone = ?3, scheduled_at = ?4,
                status = ?5, note = ?6
         WHERE id = ?1",
        params![
            appointment.id.to_string(),
            appointment.patient_name,
            appointment.phone,
            appointment.scheduled_at,
            appointment.status.as_str(),
            appointment.note,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "appointment".into(),
            id: appointment.id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_appointment(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct AppointmentRow {
    id: String,
    patient_name: String,
    phone: Option<String>,
    scheduled_at: DateTime<Utc>,
    status: String,
    note: Option<String>,
}

fn appointment_row_from_rusqlite(
    row: &rusqlite::Row<'_>,
) -> Result<AppointmentRow, rusqlite::Error> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        patient_name: row.get(1)?,
        phone: row.get(2)?,
        scheduled_at: row.get(3)?,
        status: row.get(4)?,
        note: row.get(5)?,
    })
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: parse_uuid("appointments.id", &row.id)?,
        patient_name: row.patient_name,
        phone: row.phone,
        scheduled_at: row.scheduled_at,
        status: AppointmentStatus::from_str(&row.status)?,
        note: row.note,
    })
}
