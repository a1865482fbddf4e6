use super::{check_api_key, write_error};
use crate::auth::Role;
use crate::db::clients;
use crate::error::AppError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use log::info;
use scormhub_common::requests::CreateClientRequest;

pub async fn process(
    role: Role,
    state: web::Data<AppState>,
    payload: web::Json<CreateClientRequest>,
) -> Result<HttpResponse, AppError> {
    role.require_core_admin()?;
    let req = payload.into_inner();
    validate(&req)?;
    check_api_key(&state, req.lms_api_key.as_deref())?;

    let conn = state.db.connect()?;
    let client = clients::insert(&conn, &req).map_err(write_error)?;
    info!("Client {} created", client.id);
    Ok(HttpResponse::Created().json(client))
}

fn validate(req: &CreateClientRequest) -> Result<(), AppError> {
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(AppError::InvalidInput("first_name and last_name are required".into()));
    }
    if !req.email.contains('@') {
        return Err(AppError::InvalidInput("email is not valid".into()));
    }
    if req.company.trim().is_empty() {
        return Err(AppError::InvalidInput("company is required".into()));
    }
    Ok(())
}
