use crate::auth::Role;
use crate::db::{assignments, clients};
use crate::error::AppError;
use crate::packaging::handoff::with_package_url;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use scormhub_common::model::client::ClientDetails;

pub async fn process(
    role: Role,
    state: web::Data<AppState>,
    client_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let client_id = client_id.into_inner();
    role.require_client(client_id)?;

    let conn = state.db.connect()?;
    let client = clients::get(&conn, client_id)?
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", client_id)))?;
    let assignments = assignments::list_for_client(&conn, client_id)?
        .into_iter()
        .map(|a| with_package_url(state.storage.as_ref(), a))
        .collect();
    Ok(HttpResponse::Ok().json(ClientDetails {
        client,
        assignments,
    }))
}
