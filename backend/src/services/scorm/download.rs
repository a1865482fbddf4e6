use crate::auth::Role;
use crate::db::{assets, assignments, clients};
use crate::error::AppError;
use crate::state::AppState;
use actix_web::http::header::CONTENT_DISPOSITION;
use actix_web::{web, HttpResponse};

/// Serves the client's package of an asset as a zip attachment named
/// `{client first name}_{asset title}.zip`.
pub async fn process(
    role: Role,
    state: web::Data<AppState>,
    path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
    let (client_id, asset_id) = path.into_inner();
    role.require_client(client_id)?;

    let conn = state.db.connect()?;
    let client = clients::get(&conn, client_id)?
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", client_id)))?;
    let asset = assets::get(&conn, asset_id)?
        .ok_or_else(|| AppError::NotFound(format!("SCORM {} not found", asset_id)))?;
    let assignment = assignments::find(&conn, client_id, asset_id)?
        .ok_or_else(|| AppError::Forbidden("You do not have access to this SCORM".into()))?;
    let stored = assignment
        .client_scorm_file
        .ok_or_else(|| AppError::NotFound("File not found".into()))?;

    let bytes = state.storage.open(&stored)?;
    let filename = attachment_name(&client.first_name, &asset.title);
    Ok(HttpResponse::Ok()
        .content_type("application/zip")
        .insert_header((
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ))
        .body(bytes))
}

fn attachment_name(first_name: &str, title: &str) -> String {
    format!("{}_{}.zip", first_name, title)
        .chars()
        .filter(|c| !matches!(c, '"' | '\\' | '\r' | '\n'))
        .collect()
}
