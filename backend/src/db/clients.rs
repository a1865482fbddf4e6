use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use scormhub_common::model::client::Client;
use scormhub_common::requests::{CreateClientRequest, UpdateClientRequest};

const COLUMNS: &str = "id, first_name, last_name, email, contact_phone, company, domains, lms_url, lms_api_key, created_at";

fn from_row(row: &Row) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        contact_phone: row.get(4)?,
        company: row.get(5)?,
        domains: row.get(6)?,
        lms_url: row.get(7)?,
        lms_api_key: row.get(8)?,
        created_at: row.get(9)?,
    })
}

pub fn insert(conn: &Connection, req: &CreateClientRequest) -> rusqlite::Result<Client> {
    conn.execute(
        "INSERT INTO clients (first_name, last_name, email, contact_phone, company, domains, lms_url, lms_api_key, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            req.first_name,
            req.last_name,
            req.email,
            req.contact_phone,
            req.company,
            req.domains,
            req.lms_url,
            req.lms_api_key,
            Utc::now(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Client>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM clients WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()
}

pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Client>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM clients ORDER BY id"))?;
    let rows = stmt.query_map([], from_row)?;
    rows.collect()
}

pub fn find_by_api_key(conn: &Connection, key: &str) -> rusqlite::Result<Option<Client>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM clients WHERE lms_api_key = ?1"),
        params![key],
        from_row,
    )
    .optional()
}

/// Applies a partial update. Returns `None` when the client does not exist.
pub fn update(
    conn: &Connection,
    id: i64,
    req: &UpdateClientRequest,
) -> rusqlite::Result<Option<Client>> {
    let Some(mut client) = get(conn, id)? else {
        return Ok(None);
    };
    if let Some(v) = &req.first_name {
        client.first_name = v.clone();
    }
    if let Some(v) = &req.last_name {
        client.last_name = v.clone();
    }
    if let Some(v) = &req.email {
        client.email = v.clone();
    }
    if let Some(v) = &req.company {
        client.company = v.clone();
    }
    if req.contact_phone.is_some() {
        client.contact_phone = req.contact_phone.clone();
    }
    if req.domains.is_some() {
        client.domains = req.domains.clone();
    }
    if req.lms_url.is_some() {
        client.lms_url = req.lms_url.clone();
    }
    if req.lms_api_key.is_some() {
        client.lms_api_key = req.lms_api_key.clone();
    }

    conn.execute(
        "UPDATE clients SET first_name = ?1, last_name = ?2, email = ?3, contact_phone = ?4,
         company = ?5, domains = ?6, lms_url = ?7, lms_api_key = ?8 WHERE id = ?9",
        params![
            client.first_name,
            client.last_name,
            client.email,
            client.contact_phone,
            client.company,
            client.domains,
            client.lms_url,
            client.lms_api_key,
            id,
        ],
    )?;
    Ok(Some(client))
}

#[cfg(test)]
pub(crate) fn sample_request(key: Option<&str>) -> CreateClientRequest {
    CreateClientRequest {
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        email: "grace@example.com".into(),
        contact_phone: None,
        company: "Navy".into(),
        domains: Some("lms.example.com, learn.example.org".into()),
        lms_url: None,
        lms_api_key: key.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::database;

    #[test]
    fn insert_get_list() {
        let (_dir, db) = database();
        let conn = db.connect().unwrap();
        let created = insert(&conn, &sample_request(Some("k1"))).unwrap();
        assert_eq!(get(&conn, created.id).unwrap().unwrap().email, "grace@example.com");
        assert_eq!(list(&conn).unwrap().len(), 1);
        assert!(get(&conn, created.id + 1).unwrap().is_none());
    }

    #[test]
    fn lookup_by_key() {
        let (_dir, db) = database();
        let conn = db.connect().unwrap();
        let created = insert(&conn, &sample_request(Some("k1"))).unwrap();
        assert_eq!(find_by_api_key(&conn, "k1").unwrap().unwrap().id, created.id);
        assert!(find_by_api_key(&conn, "k2").unwrap().is_none());
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let (_dir, db) = database();
        let conn = db.connect().unwrap();
        let created = insert(&conn, &sample_request(None)).unwrap();
        let req = UpdateClientRequest {
            domains: Some("new.example.com".into()),
            ..Default::default()
        };
        let updated = update(&conn, created.id, &req).unwrap().unwrap();
        assert_eq!(updated.domains.as_deref(), Some("new.example.com"));
        assert_eq!(updated.first_name, "Grace");
        assert!(update(&conn, 999, &req).unwrap().is_none());
    }
}
