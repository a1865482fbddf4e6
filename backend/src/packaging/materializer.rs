//! # Archive Materializer
//!
//! Turns the generic SCORM wrapper template into a client-specific package:
//!
//! 1.  The template zip is extracted into a fresh scratch directory.
//! 2.  The extracted tree is walked; every file whose name matches a target of the
//!     `SubstitutionPlan` gets its placeholders replaced and is rewritten in place.
//! 3.  All extracted files are re-archived flattened into the archive root.
//! 4.  The scratch directory is removed, on success and on every failure path.
//!
//! A target that does not appear in the template is skipped silently.

use crate::error::PackagingError;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const CONFIGURATION_FILE: &str = "configuration.js";
pub const MANIFEST_FILE: &str = "imsmanifest.xml";
pub const ID_PLACEHOLDER: &str = "ID";
pub const TITLE_PLACEHOLDER: &str = "{{SCORM_TITLE}}";

const SCRATCH_PREFIX: &str = "scorm-wrapper-";

/// How many occurrences of a placeholder are replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacePolicy {
    /// Only the first occurrence; later literal matches are left intact.
    FirstOnly,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub placeholder: String,
    pub value: String,
    pub policy: ReplacePolicy,
}

impl Substitution {
    pub fn new(placeholder: impl Into<String>, value: impl Into<String>, policy: ReplacePolicy) -> Self {
        Self {
            placeholder: placeholder.into(),
            value: value.into(),
            policy,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        if self.placeholder.is_empty() {
            return text.to_string();
        }
        match self.policy {
            ReplacePolicy::FirstOnly => text.replacen(&self.placeholder, &self.value, 1),
            ReplacePolicy::All => text.replace(&self.placeholder, &self.value),
        }
    }
}

/// Substitutions for one member file, matched by file name at any depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFile {
    pub file_name: String,
    pub substitutions: Vec<Substitution>,
}

impl TargetFile {
    pub fn apply(&self, text: &str) -> String {
        self.substitutions
            .iter()
            .fold(text.to_string(), |acc, s| s.apply(&acc))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionPlan {
    targets: Vec<TargetFile>,
}

impl SubstitutionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, file_name: impl Into<String>, substitutions: Vec<Substitution>) -> Self {
        self.targets.push(TargetFile {
            file_name: file_name.into(),
            substitutions,
        });
        self
    }

    /// The plan every client wrapper is built with: the launch token goes into
    /// `configuration.js` (first `ID` only) and the course title into every
    /// `{{SCORM_TITLE}}` of `imsmanifest.xml`.
    pub fn scorm_wrapper(token: &str, title: &str) -> Self {
        Self::new()
            .target(
                CONFIGURATION_FILE,
                vec![Substitution::new(ID_PLACEHOLDER, token, ReplacePolicy::FirstOnly)],
            )
            .target(
                MANIFEST_FILE,
                vec![Substitution::new(TITLE_PLACEHOLDER, title, ReplacePolicy::All)],
            )
    }

    pub fn targets(&self) -> &[TargetFile] {
        &self.targets
    }

    fn for_file(&self, file_name: &str) -> Option<&TargetFile> {
        self.targets.iter().find(|t| t.file_name == file_name)
    }
}

/// Builds packages inside scratch directories created under `scratch_root`
/// (the system temp directory by default).
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    scratch_root: Option<PathBuf>,
}

impl Materializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scratch_root(root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: Some(root.into()),
        }
    }

    /// Produces the bytes of the customized, flattened archive.
    pub fn materialize(
        &self,
        template: &Path,
        plan: &SubstitutionPlan,
    ) -> Result<Vec<u8>, PackagingError> {
        let scratch = self.scratch_dir()?;
        info!(
            "Materializing {} in {}",
            template.display(),
            scratch.path().display()
        );

        let result = build_package(template, scratch.path(), plan);

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!(
                "Could not remove scratch directory {}: {}",
                scratch_path.display(),
                e
            );
        }
        result
    }

    fn scratch_dir(&self) -> Result<TempDir, PackagingError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let dir = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| PackagingError::ArchiveWrite(format!("scratch directory: {}", e)))
    }
}

fn build_package(
    template: &Path,
    scratch: &Path,
    plan: &SubstitutionPlan,
) -> Result<Vec<u8>, PackagingError> {
    let wrapper_dir = scratch.join("scorm_wrapper");
    extract_template(template, &wrapper_dir)?;

    let mut files = Vec::new();
    collect_files(&wrapper_dir, &mut files)
        .map_err(|e| PackagingError::ArchiveWrite(format!("walking extracted files: {}", e)))?;
    files.sort();

    for file in &files {
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(target) = plan.for_file(name) {
            rewrite_target(template, file, target)?;
        }
    }

    write_flat_archive(&files)
}

fn extract_template(template: &Path, into: &Path) -> Result<(), PackagingError> {
    let unavailable = |reason: String| PackagingError::TemplateUnavailable {
        path: template.to_path_buf(),
        reason,
    };
    let file = File::open(template).map_err(|e| unavailable(e.to_string()))?;
    let mut archive = ZipArchive::new(file).map_err(|e| unavailable(e.to_string()))?;
    archive
        .extract(into)
        .map_err(|e| unavailable(format!("extraction failed: {}", e)))?;
    debug!("Extracted {} entries", archive.len());
    Ok(())
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(&entry.path(), out)?;
        } else if file_type.is_file() {
            out.push(entry.path());
        }
    }
    Ok(())
}

fn rewrite_target(template: &Path, file: &Path, target: &TargetFile) -> Result<(), PackagingError> {
    debug!("Replacing placeholders in {}", file.display());
    let bytes = fs::read(file)
        .map_err(|e| PackagingError::ArchiveWrite(format!("{}: {}", file.display(), e)))?;
    let contents = String::from_utf8(bytes).map_err(|_| PackagingError::TemplateUnavailable {
        path: template.to_path_buf(),
        reason: format!("{} is not UTF-8 text", target.file_name),
    })?;
    fs::write(file, target.apply(&contents))
        .map_err(|e| PackagingError::ArchiveWrite(format!("{}: {}", file.display(), e)))
}

fn archive_err(e: impl std::fmt::Display) -> PackagingError {
    PackagingError::ArchiveWrite(e.to_string())
}

fn write_flat_archive(files: &[PathBuf]) -> Result<Vec<u8>, PackagingError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut seen = HashSet::new();

    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PackagingError::ArchiveWrite(format!("non UTF-8 name {:?}", path)))?;
        if !seen.insert(name.to_string()) {
            return Err(PackagingError::ArchiveWrite(format!(
                "{} appears more than once after flattening",
                name
            )));
        }
        writer.start_file(name, options).map_err(archive_err)?;
        let mut source = File::open(path).map_err(archive_err)?;
        io::copy(&mut source, &mut writer).map_err(archive_err)?;
    }

    let cursor = writer.finish().map_err(archive_err)?;
    info!("Packaged {} files", seen.len());
    Ok(cursor.into_inner())
}
