use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use scormhub_common::model::assignment::ScormAssignment;

const COLUMNS: &str = "id, client_id, asset_id, date_assigned, number_of_seats, validity_start_date, validity_end_date, client_scorm_file, package_md5";

fn from_row(row: &Row) -> rusqlite::Result<ScormAssignment> {
    Ok(ScormAssignment {
        id: row.get(0)?,
        client_id: row.get(1)?,
        asset_id: row.get(2)?,
        date_assigned: row.get(3)?,
        number_of_seats: row.get(4)?,
        validity_start_date: row.get(5)?,
        validity_end_date: row.get(6)?,
        client_scorm_file: row.get(7)?,
        package_md5: row.get(8)?,
        package_url: None,
    })
}

/// Creates the assignment or, when the asset is already assigned to the client,
/// updates its seats and validity window.
pub fn upsert(
    conn: &Connection,
    client_id: i64,
    asset_id: i64,
    number_of_seats: i64,
    validity_start_date: Option<DateTime<Utc>>,
    validity_end_date: Option<DateTime<Utc>>,
) -> rusqlite::Result<ScormAssignment> {
    conn.execute(
        "INSERT INTO scorm_assignments (client_id, asset_id, date_assigned, number_of_seats, validity_start_date, validity_end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (client_id, asset_id) DO UPDATE SET
             number_of_seats = excluded.number_of_seats,
             validity_start_date = excluded.validity_start_date,
             validity_end_date = excluded.validity_end_date",
        params![
            client_id,
            asset_id,
            Utc::now(),
            number_of_seats,
            validity_start_date,
            validity_end_date,
        ],
    )?;
    find(conn, client_id, asset_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<ScormAssignment>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM scorm_assignments WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

pub fn find(
    conn: &Connection,
    client_id: i64,
    asset_id: i64,
) -> rusqlite::Result<Option<ScormAssignment>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM scorm_assignments WHERE client_id = ?1 AND asset_id = ?2"),
        params![client_id, asset_id],
        from_row,
    )
    .optional()
}

pub fn list_for_client(conn: &Connection, client_id: i64) -> rusqlite::Result<Vec<ScormAssignment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM scorm_assignments WHERE client_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![client_id], from_row)?;
    rows.collect()
}

/// Points the assignment at its (re)generated package.
pub fn set_package(
    conn: &Connection,
    id: i64,
    client_scorm_file: &str,
    package_md5: &str,
) -> rusqlite::Result<()> {
    let updated = conn.execute(
        "UPDATE scorm_assignments SET client_scorm_file = ?1, package_md5 = ?2 WHERE id = ?3",
        params![client_scorm_file, package_md5, id],
    )?;
    if updated == 0 {
        return Err(rusqlite::Error::QueryReturnedNoRows);
    }
    Ok(())
}

pub fn seats_taken(conn: &Connection, assignment_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM user_scorm_mappings WHERE assignment_id = ?1",
        params![assignment_id],
        |row| row.get(0),
    )
}
