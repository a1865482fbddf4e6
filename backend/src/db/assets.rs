use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use scormhub_common::model::asset::ScormAsset;
use scormhub_common::requests::UploadScormRequest;

const COLUMNS: &str =
    "id, title, description, category, duration_minutes, upload_date, is_deleted, scorm_id, scorm_file";

fn from_row(row: &Row) -> rusqlite::Result<ScormAsset> {
    Ok(ScormAsset {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        duration_minutes: row.get(4)?,
        upload_date: row.get(5)?,
        is_deleted: row.get(6)?,
        scorm_id: row.get(7)?,
        scorm_file: row.get(8)?,
    })
}

pub fn insert(
    conn: &Connection,
    meta: &UploadScormRequest,
    scorm_id: Option<&str>,
    scorm_file: &str,
    lms_response: Option<&str>,
) -> rusqlite::Result<ScormAsset> {
    conn.execute(
        "INSERT INTO scorm_assets (title, description, category, duration_minutes, upload_date, scorm_id, scorm_file, lms_response)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            meta.title,
            meta.description,
            meta.category,
            meta.duration_minutes,
            Utc::now(),
            scorm_id,
            scorm_file,
            lms_response,
        ],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<ScormAsset>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM scorm_assets WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

pub fn list(conn: &Connection) -> rusqlite::Result<Vec<ScormAsset>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM scorm_assets WHERE is_deleted = 0 ORDER BY id"
    ))?;
    let rows = stmt.query_map([], from_row)?;
    rows.collect()
}

pub fn find_by_scorm_id(conn: &Connection, scorm_id: &str) -> rusqlite::Result<Option<ScormAsset>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM scorm_assets WHERE scorm_id = ?1"),
        params![scorm_id],
        from_row,
    )
    .optional()
}

#[cfg(test)]
pub(crate) fn sample_meta(title: &str) -> UploadScormRequest {
    UploadScormRequest {
        title: title.into(),
        description: "An introduction".into(),
        category: "Onboarding".into(),
        duration_minutes: Some(30),
        scorm_id: None,
    }
}
