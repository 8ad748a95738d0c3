use rusqlite::{params, Connection};

use super::parse_json;
use crate::db::DatabaseError;
use crate::models::LabSettings;

/// Load the lab settings singleton (row id = 1, created by the migration).
pub fn get_settings(conn: &Connection) -> Result<LabSettings, DatabaseError> {
    let (lab_name, lab_subtitle, logo_url, contact, report_template, revision) = conn.query_row(
        "SELECT lab_name, lab_subtitle, logo_url, contact, report_template, revision
         FROM settings WHERE id = 1",
        [],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, i64>(5)?,
            ))
        },
    )?;

    let report_template = report_template
        .as_deref()
        .map(|raw| parse_json("settings.report_template", raw))
        .transpose()?;

    Ok(LabSettings {
        lab_name,
        lab_subtitle,
        logo_url,
        contact,
        report_template,
        revision,
    })
}

/// Replace the report template wholesale with the submitted JSON, stored
/// verbatim so a later fetch returns it unchanged.
///
/// `expected_revision` is a compare-and-swap token: when present, the write
/// only happens if it matches the stored revision. When absent the replace
/// is unconditional (last write wins). The revision bumps either way.
pub fn update_report_template(
    conn: &Connection,
    template: &serde_json::Value,
    expected_revision: Option<i64>,
) -> Result<i64, DatabaseError> {
    let raw = template.to_string();
    match expected_revision {
        None => {
            conn.execute(
                "UPDATE settings SET report_template = ?1, revision = revision + 1 WHERE id = 1",
                params![raw],
            )?;
        }
        Some(expected) => {
            let changed = conn.execute(
                "UPDATE settings SET report_template = ?1, revision = revision + 1
                 WHERE id = 1 AND revision = ?2",
                params![raw, expected],
            )?;
            if changed == 0 {
                let found = current_revision(conn)?;
                return Err(DatabaseError::RevisionConflict { expected, found });
            }
        }
    }
    current_revision(conn)
}

/// Update the lab identity fields with the same CAS semantics.
pub fn update_identity(
    conn: &Connection,
    settings: &LabSettings,
    expected_revision: Option<i64>,
) -> Result<i64, DatabaseError> {
    match expected_revision {
        None => {
            conn.execute(
                "UPDATE settings SET lab_name = ?1, lab_subtitle = ?2, logo_url = ?3,
                        contact = ?4, revision = revision + 1
                 WHERE id = 1",
                params![
                    settings.lab_name,
                    settings.lab_subtitle,
                    settings.logo_url,
                    settings.contact,
                ],
            )?;
        }
        Some(expected) => {
            let changed = conn.execute(
                "UPDATE settings SET lab_name = ?1, lab_subtitle = ?2, logo_url = ?3,
                        contact = ?4, revision = revision + 1
                 WHERE id = 1 AND revision = ?5",
                params![
                    settings.lab_name,
                    settings.lab_subtitle,
                    settings.logo_url,
                    settings.contact,
                    expected,
                ],
            )?;
            if changed == 0 {
                let found = current_revision(conn)?;
                return Err(DatabaseError::RevisionConflict { expected, found });
            }
        }
    }
    current_revision(conn)
}

fn current_revision(conn: &Connection) -> Result<i64, DatabaseError> {
    let revision = conn.query_row("SELECT revision FROM settings WHERE id = 1", [], |row| {
        row.get(0)
    })?;
    Ok(revision)
}
