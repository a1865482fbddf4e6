//! Media storage for uploaded and generated packages.
//!
//! Names are relative, `/` separated paths such as
//! `client_scorm_files/intro_wrapper_3_7.zip`. Writes land in a uniquely named
//! sibling first and are renamed into place, so readers never observe a
//! partially written file and a failed write leaves the previous file intact.

use crate::error::StorageError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

pub trait MediaStorage: Send + Sync {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    fn open(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Removing a file that does not exist is not an error.
    fn delete(&self, name: &str) -> Result<(), StorageError>;

    fn exists(&self, name: &str) -> bool;

    fn url(&self, name: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
    base_url: String,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// Resolves a storage name to a path below the root.
    pub fn path(&self, name: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(name);
        let valid = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl MediaStorage for FileSystemStorage {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.path(name)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let mut partial = target.clone().into_os_string();
        partial.push(format!(".{}.part", Uuid::new_v4()));
        let partial = PathBuf::from(partial);

        if let Err(e) = fs::write(&partial, bytes) {
            let _ = fs::remove_file(&partial);
            return Err(StorageError::io(&partial, e));
        }
        if let Err(e) = fs::rename(&partial, &target) {
            let _ = fs::remove_file(&partial);
            return Err(StorageError::io(&target, e));
        }
        log::debug!("Stored {} ({} bytes)", name, bytes.len());
        Ok(())
    }

    fn open(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path(name)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::io(path, e),
        })
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).map(|p| p.is_file()).unwrap_or(false)
    }

    fn url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }
}
