use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use scormhub_common::model::learner::ClientUser;

const COLUMNS: &str = "id, client_id, learner_id, first_name, last_name, email, scorm_consumed, cloudscorm_user_id, created_at, updated_at";

fn from_row(row: &Row) -> rusqlite::Result<ClientUser> {
    Ok(ClientUser {
        id: row.get(0)?,
        client_id: row.get(1)?,
        learner_id: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        email: row.get(5)?,
        scorm_consumed: row.get(6)?,
        cloudscorm_user_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

pub fn find(conn: &Connection, client_id: i64, learner_id: &str) -> rusqlite::Result<Option<ClientUser>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM client_users WHERE client_id = ?1 AND learner_id = ?2"),
        params![client_id, learner_id],
        from_row,
    )
    .optional()
}

/// Returns the learner, creating it with `first_name` on first sight.
pub fn get_or_create(
    conn: &Connection,
    client_id: i64,
    learner_id: &str,
    first_name: &str,
) -> rusqlite::Result<ClientUser> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO client_users (client_id, learner_id, first_name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT (client_id, learner_id) DO NOTHING",
        params![client_id, learner_id, first_name, now],
    )?;
    find(conn, client_id, learner_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn set_cloudscorm_user_id(conn: &Connection, id: i64, cloudscorm_user_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE client_users SET cloudscorm_user_id = ?1, updated_at = ?2 WHERE id = ?3",
        params![cloudscorm_user_id, Utc::now(), id],
    )?;
    Ok(())
}

pub fn list_for_client(conn: &Connection, client_id: i64) -> rusqlite::Result<Vec<ClientUser>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM client_users WHERE client_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![client_id], from_row)?;
    rows.collect()
}

pub fn is_mapped(conn: &Connection, user_id: i64, assignment_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM user_scorm_mappings WHERE user_id = ?1 AND assignment_id = ?2)",
        params![user_id, assignment_id],
        |row| row.get(0),
    )
}

/// Gives the learner a seat of the assignment unless every seat is taken.
/// Returns whether the learner holds a seat afterwards; a learner who already
/// has one keeps it. The check and the insert run under one write lock, so
/// concurrent claims never exceed `number_of_seats`.
pub fn claim_seat(conn: &mut Connection, user_id: i64, assignment_id: i64) -> rusqlite::Result<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if is_mapped(&tx, user_id, assignment_id)? {
        return Ok(true);
    }
    let inserted = tx.execute(
        "INSERT INTO user_scorm_mappings (user_id, assignment_id)
         SELECT ?1, a.id FROM scorm_assignments a
         WHERE a.id = ?2
           AND (SELECT COUNT(*) FROM user_scorm_mappings m WHERE m.assignment_id = a.id) < a.number_of_seats",
        params![user_id, assignment_id],
    )?;
    tx.commit()?;
    Ok(inserted == 1)
}
