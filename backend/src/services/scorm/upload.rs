use crate::auth::Role;
use crate::db::assets;
use crate::error::AppError;
use crate::services::JSON_LIMIT;
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use log::{info, warn};
use md5::Context;
use scormhub_common::model::asset::ScormAsset;
use scormhub_common::requests::UploadScormRequest;
use serde_json::from_slice;

const UPLOAD_DIR: &str = "scorm_uploads_zipped";

/// HTTP handler: `201 Created` with the stored asset.
pub async fn process(
    role: Role,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    role.require_core_admin()?;
    let asset = upload_scorm(&state, payload).await?;
    Ok(HttpResponse::Created().json(asset))
}

struct UploadedFile {
    file_name: String,
    bytes: Vec<u8>,
    md5: String,
}

fn bad(e: impl std::fmt::Display) -> AppError {
    AppError::InvalidInput(e.to_string())
}

/// Reads the `json` and `file` parts, stores the package and records the asset.
pub async fn upload_scorm(state: &AppState, mut payload: Multipart) -> Result<ScormAsset, AppError> {
    let mut meta: Option<UploadScormRequest> = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(bad)?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("json") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(bad)?;
                    if bytes.len() + chunk.len() > JSON_LIMIT {
                        return Err(AppError::InvalidInput("SCORM metadata is too large".into()));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                let parsed: UploadScormRequest = from_slice(&bytes).map_err(bad)?;
                if parsed.title.trim().is_empty() {
                    return Err(AppError::InvalidInput("title is required".into()));
                }
                meta = Some(parsed);
            }
            Some("file") => {
                if meta.is_none() {
                    return Err(AppError::InvalidInput(
                        "SCORM metadata must be sent before the file".into(),
                    ));
                }
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                if !file_name.to_ascii_lowercase().ends_with(".zip") {
                    return Err(AppError::InvalidInput("The file must end with .zip".into()));
                }

                let mut hasher = Context::new();
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(bad)?;
                    if bytes.len() + chunk.len() > state.max_upload_bytes {
                        return Err(AppError::InvalidInput("File size exceeds the limit".into()));
                    }
                    hasher.consume(&chunk);
                    bytes.extend_from_slice(&chunk);
                }
                file = Some(UploadedFile {
                    file_name,
                    bytes,
                    md5: format!("{:x}", hasher.finalize()),
                });
            }
            _ => {}
        }
    }

    let meta = meta.ok_or_else(|| AppError::InvalidInput("Missing SCORM metadata".into()))?;
    let file = file.ok_or_else(|| AppError::InvalidInput("Missing file".into()))?;
    if file.bytes.is_empty() {
        return Err(AppError::InvalidInput("The file is empty".into()));
    }

    let (scorm_id, lms_response) = match meta.scorm_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => (id.to_string(), None),
        _ => {
            let uploaded = state
                .lms
                .upload_package(&file.file_name, file.bytes.clone())
                .await?;
            info!(
                "LMS accepted {} as SCORM {}: {}",
                file.file_name,
                uploaded.scorm_id,
                uploaded.message.as_deref().unwrap_or("no message")
            );
            (uploaded.scorm_id, Some(uploaded.raw))
        }
    };

    let conn = state.db.connect()?;
    if assets::find_by_scorm_id(&conn, &scorm_id)?.is_some() {
        warn!("SCORM {} uploaded twice", scorm_id);
        return Err(AppError::InvalidInput(
            "A SCORM file with the same ID already exists".into(),
        ));
    }

    let stored_name = format!("{}/{}.zip", UPLOAD_DIR, file.md5);
    state.storage.save(&stored_name, &file.bytes)?;
    let asset = assets::insert(
        &conn,
        &meta,
        Some(&scorm_id),
        &stored_name,
        lms_response.as_deref(),
    )?;
    info!("SCORM asset {} stored as {}", asset.id, stored_name);
    Ok(asset)
}
