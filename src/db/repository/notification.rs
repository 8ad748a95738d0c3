use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::Notification;

pub fn insert_notification(
    conn: &Connection,
    notification: &Notification,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO notifications (id, recipient_role, title, body, read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            notification.id.to_string(),
            notification.recipient_role,
            notification.title,
            notification.body,
            notification.read,
            notification.created_at,
        ],
    )?;
    Ok(())
}

pub fn list_for_role(conn: &Connection, role: &str) -> Result<Vec<Notification>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, recipient_role, title, body, read, created_at
         FROM notifications
         WHERE recipient_role = ?1 OR recipient_role = 'all'
         ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![role], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, bool>(4)?,
            row.get::<_, DateTime<Utc>>(5)?,
        ))
    })?;

    let mut notifications = Vec::new();
    for row in rows {
        let (id, recipient_role, title, body, read, created_at) = row?;
        notifications.push(Notification {
            id: parse_uuid("notifications.id", &id)?,
            recipient_role,
            title,
            body,
            read,
            created_at,
        });
    }
    Ok(notifications)
}

pub fn mark_read(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE notifications SET read = 1 WHERE id = ?1",
        params![id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "notification".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use uuid::Uuid;

    fn notification(role: &str, title: &str) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient_role: role.to_string(),
            title: title.to_string(),
            body: None,
            read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn role_listing_includes_broadcast() {
        let conn = open_memory_database().unwrap();
        insert_notification(&conn, &notification("technician", "Low stock")).unwrap();
        insert_notification(&conn, &notification("all", "Maintenance window")).unwrap();
        insert_notification(&conn, &notification("admin", "New user request")).unwrap();

        let seen = list_for_role(&conn, "technician").unwrap();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn mark_read_flips_flag() {
        let conn = open_memory_database().unwrap();
        let n = notification("admin", "Ping");
        insert_notification(&conn, &n).unwrap();
        mark_read(&conn, &n.id.to_string()).unwrap();

        let seen = list_for_role(&conn, "admin").unwrap();
        assert!(seen[0].read);
    }
}
