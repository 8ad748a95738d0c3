use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::InventoryItem;

pub fn insert_item(conn: &Connection, item: &InventoryItem) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO inventory_items (id, name, category, quantity, unit, reorder_level,
                unit_price, expiry_date, supplier_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            item.id.to_string(),
            item.name,
            item.category,
            item.quantity,
            item.unit,
            item.reorder_level,
            item.unit_price,
            item.expiry_date,
            item.supplier_id.map(|id| id.to_string()),
        ],
    )?;
    Ok(())
}

pub fn get_item(conn: &Connection, id: &str) -> Result<InventoryItem, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, category, quantity, unit, reorder_level, unit_price,
                    expiry_date, supplier_id
             FROM inventory_items WHERE id = ?1",
            params![id],
            |row| Ok(item_row_from_rusqlite(row)),
        )
        .optional()?;

    match row {
        Some(r) => item_from_row(r?),
        None => Err(DatabaseError::NotFound {
            entity_type: "inventory item".into(),
            id: id.to_string(),
        }),
    }
}

pub fn list_items(conn: &Connection) -> Result<Vec<InventoryItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category, quantity, unit, reorder_level, unit_price,
                expiry_date, supplier_id
         FROM inventory_items ORDER BY name",
    )?;

    let rows = stmt.query_map([], |row| Ok(item_row_from_rusqlite(row)))?;

    let mut items = Vec::new();
    for row in rows {
        items.push(item_from_row(row??)?);
    }
    Ok(items)
}

/// Items at or below their reorder threshold.
pub fn list_low_stock(conn: &Connection) -> Result<Vec<InventoryItem>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category, quantity, unit, reorder_level, unit_price,
                expiry_date, supplier_id
         FROM inventory_items WHERE quantity <= reorder_level ORDER BY name",
    )?;

    let rows = stmt.query_map([], |row| Ok(item_row_from_rusqlite(row)))?;

    let mut items = Vec::new();
    for row in rows {
        items.push(item_from_row(row??)?);
    }
    Ok(items)
}

pub fn total_stock_value(conn: &Connection) -> Result<f64, DatabaseError> {
    let value = conn.query_row(
        "SELECT COALESCE(SUM(quantity * unit_price), 0) FROM inventory_items",
        [],
        |row| row.get(0),
    )?;
    Ok(value)
}

pub fn update_item(conn: &Connection, item: &InventoryItem) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE inventory_items SET name = ?2, category = ?3, quantity = ?4, unit = ?5,
                reorder_level = ?6, unit_price = ?7, expiry_date = ?8, supplier_id = ?9
         WHERE id = ?1",
        params![
            item.id.to_string(),
            item.name,
            item.category,
            item.quantity,
            item.unit,
            item.reorder_level,
            item.unit_price,
            item.expiry_date,
            item.supplier_id.map(|id| id.to_string()),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "inventory item".into(),
            id: item.id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_item(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM inventory_items WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "inventory item".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct ItemRow {
    id: String,
    name: String,
    category: Option<String>,
    quantity: f64,
    unit: Option<String>,
    reorder_level: f64,
    unit_price: f64,
    expiry_date: Option<NaiveDate>,
    supplier_id: Option<String>,
}

fn item_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ItemRow, rusqlite::Error> {
    Ok(ItemRow {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        quantity: row.get(3)?,
        unit: row.get(4)?,
        reorder_level: row.get(5)?,
        unit_price: row.get(6)?,
        expiry_date: row.get(7)?,
        supplier_id: row.get(8)?,
    })
}

fn item_from_row(row: ItemRow) -> Result<InventoryItem, DatabaseError> {
    Ok(InventoryItem {
        id: parse_uuid("inventory_items.id", &row.id)?,
        name: row.name,
        category: row.category,
        quantity: row.quantity,
        unit: row.unit,
        reorder_level: row.reorder_level,
        unit_price: row.unit_price,
        expiry_date: row.expiry_date,
        supplier_id: row
            .supplier_id
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok()),
    })
}
