//! # Persistence Handoff
//!
//! Stores a generated package and points its assignment at it. The storage name
//! is derived from the assignment identity, so two assignments never share a
//! file while regenerating one assignment replaces its previous package.

use crate::db::assignments;
use crate::error::PackagingError;
use crate::storage::MediaStorage;
use log::{info, warn};
use md5::Context;
use rusqlite::Connection;
use scormhub_common::model::assignment::ScormAssignment;

pub const PACKAGE_DIR: &str = "client_scorm_files";

/// `client_scorm_files/{title}_wrapper_{client}_{assignment}.zip`, with the title
/// reduced to ASCII letters, digits, `-` and `_`.
pub fn package_name(title: &str, client_id: i64, assignment_id: i64) -> String {
    format!(
        "{}/{}_wrapper_{}_{}.zip",
        PACKAGE_DIR,
        slug(title),
        client_id,
        assignment_id
    )
}

fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "scorm".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn md5_hex(bytes: &[u8]) -> String {
    let mut ctx = Context::new();
    ctx.consume(bytes);
    format!("{:x}", ctx.finalize())
}

/// Fills in the public URL of the assignment's package, if it has one.
pub fn with_package_url(storage: &dyn MediaStorage, mut assignment: ScormAssignment) -> ScormAssignment {
    assignment.package_url = assignment
        .client_scorm_file
        .as_deref()
        .map(|name| storage.url(name));
    assignment
}

/// Saves `bytes` under `filename` and records it on `assignment`.
/// Returns the md5 of the stored package.
///
/// The row update runs in a transaction that only commits once the file is in
/// place, so a failed save leaves both the row and the previous file untouched.
pub fn attach(
    storage: &dyn MediaStorage,
    conn: &Connection,
    assignment: &ScormAssignment,
    filename: &str,
    bytes: &[u8],
) -> Result<String, PackagingError> {
    let digest = md5_hex(bytes);
    let previous = assignment
        .client_scorm_file
        .as_deref()
        .filter(|prev| *prev != filename);

    let tx = conn.unchecked_transaction()?;
    assignments::set_package(&tx, assignment.id, filename, &digest)?;
    storage.save(filename, bytes)?;
    if let Err(e) = tx.commit() {
        if previous.is_some() || assignment.client_scorm_file.is_none() {
            if let Err(cleanup) = storage.delete(filename) {
                warn!("Could not remove unattached package {}: {}", filename, cleanup);
            }
        } else {
            warn!(
                "{} was replaced but assignment {} still records md5 {:?}",
                filename, assignment.id, assignment.package_md5
            );
        }
        return Err(e.into());
    }

    if let Some(prev) = previous {
        if let Err(e) = storage.delete(prev) {
            warn!("Could not remove superseded package {}: {}", prev, e);
        }
    }
    info!(
        "Attached {} ({} bytes, md5 {}) to assignment {}",
        filename,
        bytes.len(),
        digest,
        assignment.id
    );
    Ok(digest)
}
