//! Bearer-token role check.
//!
//! The configured admin token grants `CoreAdmin`. A client's `lms_api_key`
//! grants `ClientAdmin` for that client only.

use crate::db::clients;
use crate::error::AppError;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    CoreAdmin,
    ClientAdmin(i64),
}

impl Role {
    pub fn require_core_admin(self) -> Result<(), AppError> {
        match self {
            Role::CoreAdmin => Ok(()),
            Role::ClientAdmin(_) => Err(AppError::Forbidden(
                "This account doesn't have admin permissions.".into(),
            )),
        }
    }

    /// Core admins see every client; client admins only their own.
    pub fn require_client(self, client_id: i64) -> Result<(), AppError> {
        match self {
            Role::CoreAdmin => Ok(()),
            Role::ClientAdmin(own) if own == client_id => Ok(()),
            Role::ClientAdmin(_) => Err(AppError::Forbidden(
                "You do not have access to this client".into(),
            )),
        }
    }
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn resolve(req: &HttpRequest) -> Result<Role, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state missing".into()))?;
    let token = bearer(req).ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;
    if token == state.admin_token {
        return Ok(Role::CoreAdmin);
    }
    let conn = state.db.connect()?;
    match clients::find_by_api_key(&conn, token)? {
        Some(client) => Ok(Role::ClientAdmin(client.id)),
        None => Err(AppError::Unauthorized("Invalid bearer token".into())),
    }
}

impl FromRequest for Role {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve(req))
    }
}
