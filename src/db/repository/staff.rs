use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::{AttendanceRecord, AttendanceStatus, SalaryPayment, Staff};

pub fn insert_staff(conn: &Connection, staff: &Staff) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO staff (id, name, designation, phone, email, joined_at, base_salary)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            staff.id.to_string(),
            staff.name,
            staff.designation,
            staff.phone,
            staff.email,
            staff.joined_at,
            staff.base_salary,
        ],
    )?;
    Ok(())
}

pub fn get_staff(conn: &Connection, id: &str) -> Result<Staff, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, designation, phone, email, joined_at, base_salary
             FROM staff WHERE id = ?1",
            params![id],
            |row| Ok(staff_row_from_rusqlite(row)),
        )
        .optional()?;

    match row {
        Some(r) => staff_from_row(r?),
        None => Err(DatabaseError::NotFound {
            entity_type: "staff".into(),
            id: id.to_string(),
        }),
    }
}

pub fn list_staff(conn: &Connection) -> Result<Vec<Staff>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, designation, phone, email, joined_at, base_salary
         FROM staff ORDER BY name",
    )?;

    let rows = stmt.query_map([], |row| Ok(staff_row_from_rusqlite(row)))?;

    let mut staff = Vec::new();
    for row in rows {
        staff.push(staff_from_row(row??)?);
    }
    Ok(staff)
}

pub fn update_staff(conn: &Connection, staff: &Staff) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE staff SET name = ?2, designation = ?3, phone = ?4, email = ?5,
                joined_at = ?6, base_salary = ?7
         WHERE id = ?1",
        params![
            staff.id.to_string(),
            staff.name,
            staff.designation,
            staff.phone,
            staff.email,
            staff.joined_at,
            staff.base_salary,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "staff".into(),
            id: staff.id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_staff(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM staff WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "staff".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Mark attendance for one staff member on one day. The UNIQUE(staff_id, date)
/// index rejects a second mark for the same day.
pub fn mark_attendance(conn: &Connection, record: &AttendanceRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO attendance (id, staff_id, date, status) VALUES (?1, ?2, ?3, ?4)",
        params![
            record.id.to_string(),
            record.staff_id.to_string(),
            record.date,
            record.status.as_str(),
        ],
    )
    .map_err(|e| DatabaseError::from_insert(e, "attendance already marked for this day"))?;
    Ok(())
}

pub fn list_attendance_by_date(
    conn: &Connection,
    date: NaiveDate,
) -> Result<Vec<AttendanceRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, staff_id, date, status FROM attendance WHERE date = ?1 ORDER BY staff_id",
    )?;

    let rows = stmt.query_map(params![date], |row| Ok(attendance_row_from_rusqlite(row)))?;

    let mut records = Vec::new();
    for row in rows {
        records.push(attendance_from_row(row??)?);
    }
    Ok(records)
}

pub fn list_attendance_for_staff(
    conn: &Connection,
    staff_id: &str,
) -> Result<Vec<AttendanceRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, staff_id, date, status FROM attendance WHERE staff_id = ?1 ORDER BY date DESC",
    )?;

    let rows = stmt.query_map(params![staff_id], |row| Ok(attendance_row_from_rusqlite(row)))?;

    let mut records = Vec::new();
    for row in rows {
        records.push(attendance_from_row(row??)?);
    }
    Ok(records)
}

/// Record a salary payment for one month. UNIQUE(staff_id, month) rejects
/// paying the same month twice.
pub fn pay_salary(conn: &Connection, payment: &SalaryPayment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO staff_salaries (id, staff_id, month, amount, paid_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            payment.id.to_string(),
            payment.staff_id.to_string(),
            payment.month,
            payment.amount,
            payment.paid_at,
        ],
    )
    .map_err(|e| DatabaseError::from_insert(e, "salary already paid for this month"))?;
    Ok(())
}

pub fn list_salaries_for_staff(
    conn: &Connection,
    staff_id: &str,
) -> Result<Vec<SalaryPayment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, staff_id, month, amount, paid_at
         FROM staff_salaries WHERE staff_id = ?1 ORDER BY month DESC",
    )?;

    let rows = stmt.query_map(params![staff_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, f64>(3)?,
            row.get::<_, DateTime<Utc>>(4)?,
        ))
    })?;

    let mut payments = Vec::new();
    for row in rows {
        let (id, staff_id, month, amount, paid_at) = row?;
        payments.push(SalaryPayment {
            id: parse_uuid("staff_salaries.id", &id)?,
            staff_id: parse_uuid("staff_salaries.staff_id", &staff_id)?,
            month,
            amount,
            paid_at,
        });
    }
    Ok(payments)
}

struct StaffRow {
    id: String,
    name: String,
    designation: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    joined_at: Option<NaiveDate>,
    base_salary: f64,
}

fn staff_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<StaffRow, rusqlite::Error> {
    Ok(StaffRow {
        id: row.get(0)?,
        name: row.get(1)?,
        designation: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        joined_at: row.get(5)?,
        base_salary: row.get(6)?,
    })
}

fn staff_from_row(row: StaffRow) -> Result<Staff, DatabaseError> {
    Ok(Staff {
        id: parse_uuid("staff.id", &row.id)?,
        name: row.name,
        designation: row.designation,
        phone: row.phone,
        email: row.email,
        joined_at: row.joined_at,
        base_salary: row.base_salary,
    })
}

struct AttendanceRow {
    id: String,
    staff_id: String,
    date: NaiveDate,
    status: String,
}

fn attendance_row_from_rusqlite(
    row: &rusqlite::Row<'_>,
) -> Result<AttendanceRow, rusqlite::Error> {
    Ok(AttendanceRow {
        id: row.get(0)?,
        staff_id: row.get(1)?,
        date: row.get(2)?,
        status: row.get(3)?,
    })
}

fn attendance_from_row(row: AttendanceRow) -> Result<AttendanceRecord, DatabaseError> {
    Ok(AttendanceRecord {
        id: parse_uuid("attendance.id", &row.id)?,
        staff_id: parse_uuid("attendance.staff_id", &row.staff_id)?,
        date: row.date,
        status: AttendanceStatus::from_str(&row.status)?,
    })
}
