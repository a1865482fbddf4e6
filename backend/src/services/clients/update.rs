use super::{check_api_key, write_error};
use crate::auth::Role;
use crate::db::clients;
use crate::error::AppError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use scormhub_common::requests::UpdateClientRequest;

pub async fn process(
    role: Role,
    state: web::Data<AppState>,
    client_id: web::Path<i64>,
    payload: web::Json<UpdateClientRequest>,
) -> Result<HttpResponse, AppError> {
    role.require_core_admin()?;
    let client_id = client_id.into_inner();
    let req = payload.into_inner();
    if req.email.as_deref().is_some_and(|e| !e.contains('@')) {
        return Err(AppError::InvalidInput("email is not valid".into()));
    }

    check_api_key(&state, req.lms_api_key.as_deref())?;

    let conn = state.db.connect()?;
    let client = clients::update(&conn, client_id, &req)
        .map_err(write_error)?
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", client_id)))?;
    Ok(HttpResponse::Ok().json(client))
}
