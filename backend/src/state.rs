//! Shared application state, injected into every handler as `web::Data<AppState>`.

use crate::config::{ConfigError, ServeArgs};
use crate::db::Database;
use crate::lms::{CloudScormClient, LmsSettings};
use crate::packaging::locks::AssignmentLocks;
use crate::packaging::materializer::Materializer;
use crate::packaging::Pipeline;
use crate::storage::{FileSystemStorage, MediaStorage};
use std::sync::Arc;

pub struct AppState {
    pub db: Database,
    pub storage: Arc<dyn MediaStorage>,
    pub pipeline: Pipeline,
    pub locks: AssignmentLocks,
    pub lms: CloudScormClient,
    pub admin_token: String,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Builds the state from `serve` arguments. Fails on an unusable token key
    /// instead of falling back to a throwaway one.
    pub fn from_args(args: &ServeArgs) -> Result<Self, ConfigError> {
        args.validate()?;
        let codec = args.codec()?;
        let lms = CloudScormClient::new(LmsSettings {
            base_url: args.lms_url.clone(),
            upload_url: args.lms_upload_url.clone(),
            token: args.lms_token.clone(),
        })
        .map_err(|e| ConfigError::Invalid(format!("LMS client: {}", e)))?;

        Ok(Self {
            db: Database::new(&args.db),
            storage: Arc::new(FileSystemStorage::new(&args.media_root, &args.media_url)),
            pipeline: Pipeline::new(
                codec,
                Materializer::new(),
                &args.wrapper_template,
                args.package_timeout(),
            ),
            locks: AssignmentLocks::new(),
            lms,
            admin_token: args.admin_token.clone(),
            max_upload_bytes: args.max_upload_bytes(),
        })
    }
}
