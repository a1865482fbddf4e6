//! # Client Service Module
//!
//! Client organizations and their learners, under `/api/clients`.
//!
//! ## Registered Routes:
//!
//! *   **`POST /`** (`create::process`, core-admin): creates a client.
//! *   **`GET /`** (`list::process`, core-admin): lists every client.
//! *   **`GET /{client_id}`** (`get::process`): the client with its SCORM assignments.
//!     Client admins may read their own client.
//! *   **`PUT /{client_id}`** (`update::process`, core-admin): partial update.
//! *   **`GET /{client_id}/learners`** (`learners::process`): the client's learners.

mod create;
mod get;
mod learners;
mod list;
mod update;

use crate::error::AppError;
use crate::state::AppState;
use actix_web::web::{get, post, put, scope};
use actix_web::Scope;
use rusqlite::ErrorCode;

const API_PATH: &str = "/api/clients";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("", get().to(list::process))
        .route("/{client_id}", get().to(get::process))
        .route("/{client_id}", put().to(update::process))
        .route("/{client_id}/learners", get().to(learners::process))
}

/// A client key doubles as a bearer token, so it may not equal the admin token.
fn check_api_key(state: &AppState, key: Option<&str>) -> Result<(), AppError> {
    match key {
        Some(key) if key.trim() == state.admin_token => {
            Err(AppError::InvalidInput("lms_api_key is reserved".into()))
        }
        _ => Ok(()),
    }
}

/// `lms_api_key` is the only unique column of `clients`.
fn write_error(e: rusqlite::Error) -> AppError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => {
            AppError::InvalidInput("lms_api_key already in use".into())
        }
        _ => e.into(),
    }
}
