use crate::auth::Role;
use crate::db::clients;
use crate::error::AppError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub async fn process(role: Role, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    role.require_core_admin()?;
    let conn = state.db.connect()?;
    Ok(HttpResponse::Ok().json(clients::list(&conn)?))
}
