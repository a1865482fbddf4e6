//! Assigns SCORM assets to a client and builds the client's wrapper packages.
//!
//! Each selected asset gets (or keeps) one assignment carrying the requested
//! seats and validity window, then its package is generated through the
//! pipeline. Generation failures abort the request; assignments saved before
//! the failure stay and can be rebuilt through the regenerate route.

use crate::auth::Role;
use crate::db::{assets, assignments, clients};
use crate::error::AppError;
use crate::packaging::generate_for_assignment;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use log::info;
use scormhub_common::requests::AssignScormRequest;

pub async fn process(
    role: Role,
    state: web::Data<AppState>,
    client_id: web::Path<i64>,
    payload: web::Json<AssignScormRequest>,
) -> Result<HttpResponse, AppError> {
    role.require_core_admin()?;
    let client_id = client_id.into_inner();
    let req = payload.into_inner();
    validate(&req)?;

    let assignment_ids = {
        let conn = state.db.connect()?;
        if clients::get(&conn, client_id)?.is_none() {
            return Err(AppError::NotFound(format!("Client {} not found", client_id)));
        }
        let mut ids = Vec::with_capacity(req.scorms.len());
        for asset_id in &req.scorms {
            let asset = assets::get(&conn, *asset_id)?
                .filter(|a| !a.is_deleted)
                .ok_or_else(|| AppError::NotFound(format!("SCORM {} not found", asset_id)))?;
            let assignment = assignments::upsert(
                &conn,
                client_id,
                asset.id,
                req.number_of_seats,
                req.validity_start_date,
                req.validity_end_date,
            )?;
            ids.push(assignment.id);
        }
        ids
    };

    let mut generated = Vec::with_capacity(assignment_ids.len());
    for id in assignment_ids {
        generated.push(generate_for_assignment(&state, id).await?);
    }
    info!(
        "Assigned {} SCORM package(s) to client {}",
        generated.len(),
        client_id
    );
    Ok(HttpResponse::Ok().json(generated))
}

fn validate(req: &AssignScormRequest) -> Result<(), AppError> {
    if req.scorms.is_empty() {
        return Err(AppError::InvalidInput("Select at least one SCORM".into()));
    }
    if req.number_of_seats < 1 {
        return Err(AppError::InvalidInput("number_of_seats must be at least 1".into()));
    }
    if let (Some(start), Some(end)) = (req.validity_start_date, req.validity_end_date) {
        if end < start {
            return Err(AppError::InvalidInput(
                "validity_end_date precedes validity_start_date".into(),
            ));
        }
    }
    Ok(())
}
