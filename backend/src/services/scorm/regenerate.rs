use crate::auth::Role;
use crate::error::AppError;
use crate::packaging::generate_for_assignment;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub async fn process(
    role: Role,
    state: web::Data<AppState>,
    assignment_id: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    role.require_core_admin()?;
    let assignment = generate_for_assignment(&state, assignment_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(assignment))
}
