//! # Validate and Launch
//!
//! 1.  **Input**: the token (`id`), the referring URL, the learner id and name are
//!     all required.
//! 2.  **Token**: decoded before anything else; a token that fails to decode is
//!     rejected with `400` and nothing is looked up.
//! 3.  **Client**: must exist and list the referring host among its domains.
//! 4.  **License**: the client's assignment of the course must exist, be inside its
//!     validity window and have a free seat (learners already seated always pass).
//! 5.  **Learner**: found or created; registered with the LMS on first launch.
//! 6.  **Seat**: the seat is claimed atomically, so learners launching at the
//!     same time cannot together exceed the seat count.
//! 7.  **Response**: the LMS launch URL and the learner's LMS user id.

use crate::db::{assets, assignments, clients, learners};
use crate::error::AppError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use scormhub_common::model::launch::{LaunchRequest, LaunchResponse};

pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<LaunchRequest>,
) -> Result<HttpResponse, AppError> {
    let response = validate_and_launch(&state, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Host part of the referring URL. Plain hosts are accepted as they are.
pub(crate) fn referring_host(referring: &str) -> String {
    let rest = match referring.split_once("://") {
        Some((_, rest)) => rest,
        None => referring,
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = match host.rsplit_once(':') {
        Some((h, port)) if port.chars().all(|c| c.is_ascii_digit()) => h,
        _ => host,
    };
    host.to_ascii_lowercase()
}

pub async fn validate_and_launch(
    state: &AppState,
    req: LaunchRequest,
) -> Result<LaunchResponse, AppError> {
    let (Some(token), Some(referring), Some(learner_id), Some(name)) = (
        required(req.id),
        required(req.referringurl),
        required(req.learner_id),
        required(req.name),
    ) else {
        return Err(AppError::InvalidInput("Missing required data".into()));
    };

    let identity = state.pipeline.codec().decode(&token)?;
    let client_id = i64::try_from(identity.client_id)
        .map_err(|_| AppError::InvalidInput("Invalid client identifier".into()))?;

    let mut conn = state.db.connect()?;
    let client = clients::get(&conn, client_id)?
        .ok_or_else(|| AppError::InvalidInput("Invalid client identifier".into()))?;

    let domain = referring_host(&referring);
    if !client.allows_domain(&domain) {
        info!("Launch for client {} from unlisted domain {}", client.id, domain);
        return Err(AppError::InvalidInput("Invalid referring domain".into()));
    }

    let license_invalid = || AppError::InvalidInput("License invalid".into());
    let asset = assets::find_by_scorm_id(&conn, &identity.course_id)?
        .filter(|a| !a.is_deleted)
        .ok_or_else(license_invalid)?;
    let assignment = assignments::find(&conn, client.id, asset.id)?.ok_or_else(license_invalid)?;
    if !assignment.is_valid_at(Utc::now()) {
        info!("License of assignment {} is outside its window", assignment.id);
        return Err(license_invalid());
    }

    let existing = learners::find(&conn, client.id, &learner_id)?;
    let already_mapped = match &existing {
        Some(learner) => learners::is_mapped(&conn, learner.id, assignment.id)?,
        None => false,
    };
    let seats_taken = assignments::seats_taken(&conn, assignment.id)?;
    if !assignment.has_seat_for(seats_taken, already_mapped) {
        info!("Seats limit reached on assignment {}", assignment.id);
        return Err(AppError::InvalidInput("Seats limit exceeded".into()));
    }

    let learner = match existing {
        Some(learner) => learner,
        None => learners::get_or_create(&conn, client.id, &learner_id, &name)?,
    };
    let cloudscorm_user_id = match learner.cloudscorm_user_id.clone() {
        Some(id) => id,
        None => {
            let id = state.lms.create_user(&learner_id, &domain).await?;
            learners::set_cloudscorm_user_id(&conn, learner.id, &id)?;
            id
        }
    };
    // The check above only spares the LMS call; concurrent launches are settled here.
    if !learners::claim_seat(&mut conn, learner.id, assignment.id)? {
        info!("Seats limit reached on assignment {}", assignment.id);
        return Err(AppError::InvalidInput("Seats limit exceeded".into()));
    }

    let launch_url = state.lms.launch_url(&identity.course_id, &cloudscorm_user_id)?;
    info!(
        "Learner {} of client {} launching SCORM {}",
        learner_id, client.id, identity.course_id
    );
    Ok(LaunchResponse {
        launch_url,
        cloudscorm_user_id,
    })
}

#[cfg(test)]
mod tests {
    use super::referring_host;

    #[test]
    fn referring_hosts() {
        assert_eq!(referring_host("lms.example.com"), "lms.example.com");
        assert_eq!(referring_host("https://LMS.example.com/course?x=1"), "lms.example.com");
        assert_eq!(referring_host("http://user@lms.example.com:8443/a"), "lms.example.com");
        assert_eq!(referring_host("lms.example.com/path"), "lms.example.com");
    }
}
