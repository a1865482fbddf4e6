use crate::auth::Role;
use crate::db::{clients, learners};
use crate::error::AppError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub async fn process(
    role: Role,
    state: web::Data<AppState>,
    client_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let client_id = client_id.into_inner();
    role.require_client(client_id)?;

    let conn = state.db.connect()?;
    if clients::get(&conn, client_id)?.is_none() {
        return Err(AppError::NotFound(format!("Client {} not found", client_id)));
    }
    Ok(HttpResponse::Ok().json(learners::list_for_client(&conn, client_id)?))
}
