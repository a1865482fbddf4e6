//! # Launch Service Module
//!
//! Public entry point used by a client's wrapper package when a learner opens
//! it. Registered as `POST /api/validate-and-launch` (`validate::process`).

mod validate;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/validate-and-launch";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(validate::process))
}
