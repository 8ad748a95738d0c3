use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::{FinanceKind, FinanceRecord};

pub fn insert_record(conn: &Connection, record: &FinanceRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO finance_records (id, kind, category, amount, note, recorded_by, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.id.to_string(),
            record.kind.as_str(),
            record.category,
            record.amount,
            record.note,
            record.recorded_by,
            record.recorded_at,
        ],
    )?;
    Ok(())
}

pub fn list_records(
    conn: &Connection,
    kind: Option<FinanceKind>,
) -> Result<Vec<FinanceRecord>, DatabaseError> {
    let mut out = Vec::new();

    match kind {
        Some(kind) => {
            let mut stmt = conn.prepare(
                "SELECT id, kind, category, amount, note, recorded_by, recorded_at
                 FROM finance_records WHERE kind = ?1 ORDER BY recorded_at DESC",
            )?;
            let rows =
                stmt.query_map(params![kind.as_str()], |row| Ok(record_row_from_rusqlite(row)))?;
            for row in rows {
                out.push(record_from_row(row??)?);
            }
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, kind, category, amount, note, recorded_by, recorded_at
                 FROM finance_records ORDER BY recorded_at DESC",
            )?;
            let rows = stmt.query_map([], |row| Ok(record_row_from_rusqlite(row)))?;
            for row in rows {
                out.push(record_from_row(row??)?);
            }
        }
    }

    Ok(out)
}

pub fn delete_record(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM finance_records WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "finance record".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// (total income, total expense) over the whole ledger.
pub fn summary(conn: &Connection) -> Result<(f64, f64), DatabaseError> {
    let income = sum_for(conn, FinanceKind::Income)?;
    let expense = sum_for(conn, FinanceKind::Expense)?;
    Ok((income, expense))
}

fn sum_for(conn: &Connection, kind: FinanceKind) -> Result<f64, DatabaseError> {
    let total = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM finance_records WHERE kind = ?1",
        params![kind.as_str()],
        |row| row.get(0),
    )?;
    Ok(total)
}

struct RecordRow {
    id: String,
    kind: String,
    category: Option<String>,
    amount: f64,
    note: Option<String>,
    recorded_by: Option<String>,
    recorded_at: DateTime<Utc>,
}

fn record_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<RecordRow, rusqlite::Error> {
    Ok(RecordRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        category: row.get(2)?,
        amount: row.get(3)?,
        note: row.get(4)?,
        recorded_by: row.get(5)?,
        recorded_at: row.get(6)?,
    })
}

fn record_from_row(row: RecordRow) -> Result<FinanceRecord, DatabaseError> {
    Ok(FinanceRecord {
        id: parse_uuid("finance_records.id", &row.id)?,
        kind: FinanceKind::from_str(&row.kind)?,
        category: row.category,
        amount: row.amount,
        note: row.note,
        recorded_by: row.recorded_by,
        recorded_at: row.recorded_at,
    })
}
