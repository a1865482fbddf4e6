//! # SCORM Service Module
//!
//! SCORM assets, their assignment to clients and the generated client packages,
//! under `/api/scorm`.
//!
//! ## Registered Routes:
//!
//! *   **`POST /upload`** (`upload::process`, core-admin): multipart upload with a
//!     `json` part (`UploadScormRequest`) followed by a `file` part (the zip). The
//!     package is stored under its md5 and registered with the LMS unless the
//!     request already names its LMS id.
//! *   **`GET /`** (`list::process`, core-admin): every non-deleted asset.
//! *   **`POST /assign/{client_id}`** (`assign::process`, core-admin): assigns the
//!     selected assets and builds one wrapper package per assignment.
//! *   **`POST /assignments/{assignment_id}/regenerate`** (`regenerate::process`,
//!     core-admin): rebuilds the package of one assignment in place.
//! *   **`GET /download/{client_id}/{asset_id}`** (`download::process`): streams the
//!     client's package. Client admins may download their own packages.

mod assign;
mod download;
mod list;
mod regenerate;
mod upload;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/scorm";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/upload", post().to(upload::process))
        .route("/assign/{client_id}", post().to(assign::process))
        .route(
            "/assignments/{assignment_id}/regenerate",
            post().to(regenerate::process),
        )
        .route("/download/{client_id}/{asset_id}", get().to(download::process))
}
