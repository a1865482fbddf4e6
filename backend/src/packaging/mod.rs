//! # SCORM Wrapper Customization Pipeline
//!
//! Produces the client-branded wrapper package of an assignment:
//!
//! 1.  **Codec** (`codec`): the `(client, LMS course)` pair becomes a launch token.
//! 2.  **Materializer** (`materializer`): the wrapper template is unpacked, the token
//!     and course title are written into `configuration.js` and `imsmanifest.xml`,
//!     and the files are re-zipped flat.
//! 3.  **Handoff** (`handoff`): the archive is stored and attached to the assignment.
//!
//! Materialization is blocking file work; it runs on the blocking pool behind a
//! timeout. Regeneration of one assignment is serialized through `locks`.

pub mod codec;
pub mod handoff;
pub mod locks;
pub mod materializer;

use crate::db::{assets, assignments, clients};
use crate::error::{AppError, PackagingError};
use crate::state::AppState;
use codec::{LaunchIdentity, TokenCodec};
use log::info;
use materializer::{Materializer, SubstitutionPlan};
use scormhub_common::model::assignment::ScormAssignment;
use std::path::PathBuf;
use std::time::Duration;

/// Codec + materializer bound to the configured wrapper template.
#[derive(Debug, Clone)]
pub struct Pipeline {
    codec: TokenCodec,
    materializer: Materializer,
    template: PathBuf,
    timeout: Duration,
}

impl Pipeline {
    pub fn new(
        codec: TokenCodec,
        materializer: Materializer,
        template: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            codec,
            materializer,
            template: template.into(),
            timeout,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Runs codec and materializer on the calling thread.
    pub fn build_blocking(
        &self,
        identity: &LaunchIdentity,
        title: &str,
    ) -> Result<Vec<u8>, PackagingError> {
        let token = self.codec.encode(identity)?;
        let plan = SubstitutionPlan::scorm_wrapper(&token, title);
        self.materializer.materialize(&self.template, &plan)
    }

    /// Runs `build_blocking` on the blocking pool, failing once the timeout elapses.
    pub async fn build(
        &self,
        identity: LaunchIdentity,
        title: String,
    ) -> Result<Vec<u8>, PackagingError> {
        let pipeline = self.clone();
        let task = tokio::task::spawn_blocking(move || pipeline.build_blocking(&identity, &title));
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(PackagingError::ArchiveWrite(format!(
                "materialization task failed: {}",
                join
            ))),
            Err(_) => Err(PackagingError::MaterializeTimeout(self.timeout)),
        }
    }
}

/// Generates (or regenerates) the package of one assignment and returns the
/// updated record.
pub async fn generate_for_assignment(
    state: &AppState,
    assignment_id: i64,
) -> Result<ScormAssignment, AppError> {
    let _guard = state.locks.acquire(assignment_id).await;

    let conn = state.db.connect()?;
    let assignment = assignments::get(&conn, assignment_id)?
        .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", assignment_id)))?;
    let client = clients::get(&conn, assignment.client_id)?
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", assignment.client_id)))?;
    let asset = assets::get(&conn, assignment.asset_id)?
        .ok_or_else(|| AppError::NotFound(format!("SCORM {} not found", assignment.asset_id)))?;
    let course_id = asset.scorm_id.clone().ok_or_else(|| {
        AppError::InvalidInput(format!("SCORM {} has no LMS identifier", asset.id))
    })?;
    let client_id = u64::try_from(client.id)
        .map_err(|_| AppError::Internal(format!("client id {} is negative", client.id)))?;

    info!(
        "Generating package for client {} / SCORM {} (assignment {})",
        client.id, asset.id, assignment.id
    );
    let bytes = state
        .pipeline
        .build(LaunchIdentity::new(client_id, course_id), asset.title.clone())
        .await?;

    let filename = handoff::package_name(&asset.title, client.id, assignment.id);
    handoff::attach(state.storage.as_ref(), &conn, &assignment, &filename, &bytes)?;

    let updated = assignments::get(&conn, assignment_id)?
        .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", assignment_id)))?;
    Ok(handoff::with_package_url(state.storage.as_ref(), updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packaging::codec::KEY_LEN;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn pipeline(dir: &TempDir, timeout: Duration) -> Pipeline {
        let template = dir.path().join("wrapper.zip");
        let mut zip = ZipWriter::new(File::create(&template).unwrap());
        zip.start_file("configuration.js", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"var id = 'ID';").unwrap();
        zip.finish().unwrap();
        Pipeline::new(
            TokenCodec::new([3; KEY_LEN]),
            Materializer::with_scratch_root(dir.path()),
            template,
            timeout,
        )
    }

    #[tokio::test]
    async fn build_embeds_a_decodable_token() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, Duration::from_secs(30));
        let identity = LaunchIdentity::new(4, "812");
        let bytes = pipeline.build(identity.clone(), "Intro".into()).await.unwrap();

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut contents = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("configuration.js").unwrap(), &mut contents)
            .unwrap();
        let token = contents
            .strip_prefix("var id = '")
            .and_then(|s| s.strip_suffix("';"))
            .unwrap();
        assert_eq!(pipeline.codec().decode(token).unwrap(), identity);
    }

    #[test]
    fn slow_builds_time_out_and_still_clean_up() {
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("large.zip");
        let mut zip = ZipWriter::new(File::create(&template).unwrap());
        for i in 0..2000 {
            zip.start_file(format!("assets/page_{i}.html"), SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"<html>ID</html>").unwrap();
        }
        zip.finish().unwrap();
        let scratch = dir.path().join("scratch");
        std::fs::create_dir(&scratch).unwrap();
        let pipeline = Pipeline::new(
            TokenCodec::new([3; KEY_LEN]),
            Materializer::with_scratch_root(&scratch),
            template,
            Duration::from_nanos(1),
        );

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let result = runtime.block_on(pipeline.build(LaunchIdentity::new(1, "2"), "Big".into()));
        assert!(matches!(result, Err(PackagingError::MaterializeTimeout(_))));

        // Dropping the runtime waits for the abandoned blocking build.
        drop(runtime);
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }
}
