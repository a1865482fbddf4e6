//! # SQLite persistence
//!
//! One connection is opened per operation, as every handler does; the schema is
//! created idempotently at startup. Each sub-module owns the queries of one table:
//!
//! - `clients`: client organizations and their client-admin keys.
//! - `assets`: uploaded SCORM packages and their LMS identifiers.
//! - `assignments`: asset licenses per client, including the generated package.
//! - `learners`: client users and their seat mappings.

pub mod assets;
pub mod assignments;
pub mod clients;
pub mod learners;

use rusqlite::Connection;
use std::path::{Path, PathBuf};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS clients (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    email         TEXT NOT NULL,
    contact_phone TEXT,
    company       TEXT NOT NULL,
    domains       TEXT,
    lms_url       TEXT,
    lms_api_key   TEXT UNIQUE,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scorm_assets (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    title            TEXT NOT NULL,
    description      TEXT NOT NULL DEFAULT '',
    category         TEXT NOT NULL DEFAULT '',
    duration_minutes INTEGER,
    upload_date      TEXT NOT NULL,
    is_deleted       INTEGER NOT NULL DEFAULT 0,
    scorm_id         TEXT UNIQUE,
    scorm_file       TEXT NOT NULL,
    lms_response     TEXT
);

CREATE TABLE IF NOT EXISTS scorm_assignments (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id           INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    asset_id            INTEGER NOT NULL REFERENCES scorm_assets(id) ON DELETE CASCADE,
    date_assigned       TEXT NOT NULL,
    number_of_seats     INTEGER NOT NULL DEFAULT 1,
    validity_start_date TEXT,
    validity_end_date   TEXT,
    client_scorm_file   TEXT,
    package_md5         TEXT,
    UNIQUE (client_id, asset_id)
);

CREATE TABLE IF NOT EXISTS client_users (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id          INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    learner_id         TEXT NOT NULL,
    first_name         TEXT,
    last_name          TEXT,
    email              TEXT,
    scorm_consumed     INTEGER NOT NULL DEFAULT 0,
    cloudscorm_user_id TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,
    UNIQUE (client_id, learner_id)
);

CREATE TABLE IF NOT EXISTS user_scorm_mappings (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL REFERENCES client_users(id) ON DELETE CASCADE,
    assignment_id INTEGER NOT NULL REFERENCES scorm_assignments(id) ON DELETE CASCADE,
    UNIQUE (user_id, assignment_id)
);
"#;

/// Location of the SQLite database.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    pub fn init_schema(&self) -> rusqlite::Result<()> {
        self.connect()?.execute_batch(SCHEMA)
    }
}
