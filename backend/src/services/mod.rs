//! HTTP surface. Each sub-module owns one `/api/...` scope.

pub mod clients;
pub mod launch;
pub mod scorm;

use actix_web::web;

/// Largest JSON body accepted, also applied to the metadata part of uploads.
pub const JSON_LIMIT: usize = 10 * 1024 * 1024;

/// Registers every API scope on an application.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(clients::configure_routes())
        .service(scorm::configure_routes())
        .service(launch::configure_routes());
}
