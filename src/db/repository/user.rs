use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{parse_json, parse_uuid, to_json};
use crate::db::DatabaseError;
use crate::models::{ModulePermission, User};

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, username, password_hash, full_name, role, permissions, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id.to_string(),
            user.username,
            user.password_hash,
            user.full_name,
            user.role,
            to_json("users.permissions", &user.permissions)?,
            user.created_at,
        ],
    )
    .map_err(|e| DatabaseError::from_insert(e, "username already taken"))?;
    Ok(())
}

pub fn get_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<User>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, username, password_hash, full_name, role, permissions, created_at
             FROM users WHERE username = ?1",
            params![username],
            |row| Ok(user_row_from_rusqlite(row)),
        )
        .optional()?;

    row.map(|r| user_from_row(r?)).transpose()
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<User, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, username, password_hash, full_name, role, permissions, created_at
             FROM users WHERE id = ?1",
            params![id],
            |row| Ok(user_row_from_rusqlite(row)),
        )
        .optional()?;

    match row {
        Some(r) => user_from_row(r?),
        None => Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        }),
    }
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password_hash, full_name, role, permissions, created_at
         FROM users ORDER BY username",
    )?;

    let rows = stmt.query_map([], |row| Ok(user_row_from_rusqlite(row)))?;

    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row??)?);
    }
    Ok(users)
}

pub fn update_user_access(
    conn: &Connection,
    id: &str,
    role: &str,
    permissions: &[ModulePermission],
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET role = ?2, permissions = ?3 WHERE id = ?1",
        params![id, role, to_json("users.permissions", &permissions)?],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn update_profile(conn: &Connection, id: &str, full_name: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET full_name = ?2 WHERE id = ?1",
        params![id, full_name],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_user(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Insert-or-replace by username. Used by the create-admin utility.
pub fn upsert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, username, password_hash, full_name, role, permissions, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(username) DO UPDATE SET
            password_hash = excluded.password_hash,
            full_name = excluded.full_name,
            role = excluded.role,
            permissions = excluded.permissions",
        params![
            user.id.to_string(),
            user.username,
            user.password_hash,
            user.full_name,
            user.role,
            to_json("users.permissions", &user.permissions)?,
            user.created_at,
        ],
    )?;
    Ok(())
}

struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    full_name: String,
    role: String,
    permissions: String,
    created_at: DateTime<Utc>,
}

fn user_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        full_name: row.get(3)?,
        role: row.get(4)?,
        permissions: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: parse_uuid("users.id", &row.id)?,
        username: row.username,
        password_hash: row.password_hash,
        full_name: row.full_name,
        role: row.role,
        permissions: parse_json("users.permissions", &row.permissions)?,
        created_at: row.created_at,
    })
}
