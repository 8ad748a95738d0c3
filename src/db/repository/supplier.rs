use rusqlite::{params, Connection, OptionalExtension};

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::Supplier;

pub fn insert_supplier(conn: &Connection, supplier: &Supplier) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO suppliers (id, name, contact_person, phone, email, address, balance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            supplier.id.to_string(),
            supplier.name,
            supplier.contact_person,
            supplier.phone,
            supplier.email,
            supplier.address,
            supplier.balance,
        ],
    )?;
    Ok(())
}

pub fn get_supplier(conn: &Connection, id: &str) -> Result<Supplier, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, contact_person, phone, email, address, balance
             FROM suppliers WHERE id = ?1",
            params![id],
            |row| Ok(supplier_row_from_rusqlite(row)),
        )
        .optional()?;

    match row {
        Some(r) => supplier_from_row(r?),
        None => Err(DatabaseError::NotFound {
            entity_type: "supplier".into(),
            id: id.to_string(),
        }),
    }
}

pub fn list_suppliers(conn: &Connection) -> Result<Vec<Supplier>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, contact_person, phone, email, address, balance
         FROM suppliers ORDER BY name",
    )?;

    let rows = stmt.query_map([], |row| Ok(supplier_row_from_rusqlite(row)))?;

    let mut suppliers = Vec::new();
    for row in rows {
        suppliers.push(supplier_from_row(row??)?);
    }
    Ok(suppliers)
}

pub fn update_supplier(conn: &Connection, supplier: &Supplier) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE suppliers SET name = ?2, contact_person = ?3, phone = ?4, email = ?5,
                address = ?6, balance = ?7
         WHERE id = ?1",
        params![
            supplier.id.to_string(),
            supplier.name,
            supplier.contact_person,
            supplier.phone,
            supplier.email,
            supplier.address,
            supplier.balance,
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "supplier".into(),
            id: supplier.id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_supplier(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM suppliers WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "supplier".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Reduce the supplier's outstanding balance by a payment amount.
/// A matching expense entry is a separate write by the caller; there is no
/// cross-entity transaction.
pub fn record_payment(conn: &Connection, id: &str, amount: f64) -> Result<Supplier, DatabaseError> {
    let changed = conn.execute(
        "UPDATE suppliers SET balance = balance - ?2 WHERE id = ?1",
        params![id, amount],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "supplier".into(),
            id: id.to_string(),
        });
    }
    get_supplier(conn, id)
}

struct SupplierRow {
    id: String,
    name: String,
    contact_person: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    balance: f64,
}

fn supplier_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<SupplierRow, rusqlite::Error> {
    Ok(SupplierRow {
        id: row.get(0)?,
        name: row.get(1)?,
        contact_person: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        address: row.get(5)?,
        balance: row.get(6)?,
    })
}

fn supplier_from_row(row: SupplierRow) -> Result<Supplier, DatabaseError> {
    Ok(Supplier {
        id: parse_uuid("suppliers.id", &row.id)?,
        name: row.name,
        contact_person: row.contact_person,
        phone: row.phone,
        email: row.email,
        address: row.address,
        balance: row.balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use uuid::Uuid;

    #[test]
    fn payment_reduces_balance() {
        let conn = open_memory_database().unwrap();
        let supplier = Supplier {
            id: Uuid::new_v4(),
            name: "MedSupply Co".into(),
            contact_person: None,
            phone: None,
            email: None,
            address: None,
            balance: 500.0,
        };
        insert_supplier(&conn, &supplier).unwrap();

        let updated = record_payment(&conn, &supplier.id.to_string(), 150.0).unwrap();
        assert!((updated.balance - 350.0).abs() < f64::EPSILON);
    }

    #[test]
    fn payment_to_unknown_supplier_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = record_payment(&conn, &Uuid::new_v4().to_string(), 10.0).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
