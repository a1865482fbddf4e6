#![allow(dead_code)]

use actix_web::web;
use scormhub::db::Database;
use scormhub::lms::{CloudScormClient, LmsSettings};
use scormhub::packaging::codec::{TokenCodec, KEY_LEN};
use scormhub::packaging::locks::AssignmentLocks;
use scormhub::packaging::materializer::Materializer;
use scormhub::packaging::Pipeline;
use scormhub::storage::FileSystemStorage;
use scormhub::state::AppState;
use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const ADMIN_TOKEN: &str = "admin-token";
pub const LMS_URL: &str = "https://lms.test";

pub const CONFIGURATION_JS: &str = "window.LAUNCH_ID = 'ID'; // ID is replaced once";
pub const MANIFEST_XML: &str =
    "<manifest><title>{{SCORM_TITLE}}</title><item>{{SCORM_TITLE}}</item></manifest>";

pub struct TestEnv {
    pub dir: TempDir,
    pub state: web::Data<AppState>,
}

impl TestEnv {
    pub fn media(&self) -> PathBuf {
        self.dir.path().join("media")
    }

    pub fn scratch(&self) -> PathBuf {
        self.dir.path().join("scratch")
    }

    pub fn template(&self) -> PathBuf {
        self.dir.path().join("scorm-wrapper.zip")
    }

    pub fn scratch_is_empty(&self) -> bool {
        fs::read_dir(self.scratch()).unwrap().next().is_none()
    }
}

pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, contents) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

pub fn zip_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut contents = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    contents
}

/// The launch token baked into a package's `configuration.js`.
pub fn token_in(package: &[u8]) -> String {
    zip_entry(package, "configuration.js")
        .strip_prefix("window.LAUNCH_ID = '")
        .and_then(|rest| rest.split_once('\''))
        .map(|(token, _)| token.to_string())
        .unwrap()
}

pub fn env() -> TestEnv {
    env_with_lms(LMS_URL)
}

/// Like `env`, with the LMS client pointed at `lms_url`.
pub fn env_with_lms(lms_url: &str) -> TestEnv {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("media")).unwrap();
    fs::create_dir_all(dir.path().join("scratch")).unwrap();

    let template = dir.path().join("scorm-wrapper.zip");
    write_zip(
        &template,
        &[
            ("configuration.js", CONFIGURATION_JS),
            ("meta/imsmanifest.xml", MANIFEST_XML),
            ("index.html", "<html></html>"),
        ],
    );

    let db = Database::new(dir.path().join("scormhub.sqlite"));
    db.init_schema().unwrap();

    let state = AppState {
        db,
        storage: Arc::new(FileSystemStorage::new(dir.path().join("media"), "/media")),
        pipeline: Pipeline::new(
            TokenCodec::new([11; KEY_LEN]),
            Materializer::with_scratch_root(dir.path().join("scratch")),
            template,
            Duration::from_secs(30),
        ),
        locks: AssignmentLocks::new(),
        lms: CloudScormClient::new(LmsSettings {
            base_url: Some(lms_url.to_string()),
            upload_url: None,
            token: Some("lms-token".to_string()),
        })
        .unwrap(),
        admin_token: ADMIN_TOKEN.to_string(),
        max_upload_bytes: 1024 * 1024,
    };

    TestEnv {
        dir,
        state: web::Data::new(state),
    }
}
