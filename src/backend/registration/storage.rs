/**
 * Document Storage
 *
 * Uploaded files are written under `<upload_dir>/<user_id>/` with generated
 * names before anything is recorded in the database. A request collects the
 * files it wrote in a `StagedUploads`; unless the request commits them, they
 * are deleted again, either explicitly with `discard` or, if the request
 * future is dropped midway, when the staging set itself is dropped.
 */

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{self, File};
use uuid::Uuid;

use crate::shared::profile::documents::extension_for;
use crate::shared::DocumentKind;

/// Root directory and limits for uploaded documents
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: Arc<PathBuf>,
    max_file_bytes: usize,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_file_bytes: usize) -> Self {
        Self {
            root: Arc::new(root.into()),
            max_file_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_file_bytes(&self) -> usize {
        self.max_file_bytes
    }

    pub fn user_dir(&self, user_id: Uuid) -> PathBuf {
        self.root.join(user_id.to_string())
    }

    /// Start collecting the files written by one request
    pub fn stage(&self) -> StagedUploads {
        StagedUploads {
            store: self.clone(),
            paths: Vec::new(),
            committed: false,
        }
    }

    /// Delete a stored file; a file that is already gone is not an error
    pub async fn remove(&self, stored_path: &str) {
        let path = Path::new(stored_path);
        if !path.starts_with(self.root()) {
            tracing::error!("Refusing to delete {} outside the upload directory", stored_path);
            return;
        }
        match fs::remove_file(path).await {
            Ok(()) => tracing::debug!("Deleted document file {}", stored_path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to delete document file {}: {}", stored_path, e),
        }
    }
}

/// Files written by a request that are not yet referenced by the database
#[derive(Debug)]
pub struct StagedUploads {
    store: UploadStore,
    paths: Vec<PathBuf>,
    committed: bool,
}

impl StagedUploads {
    /// Create a new file for a document; the path is tracked before any byte
    /// is written
    pub async fn create_file(
        &mut self,
        user_id: Uuid,
        kind: DocumentKind,
        content_type: &str,
    ) -> io::Result<(File, PathBuf)> {
        let dir = self.store.user_dir(user_id);
        fs::create_dir_all(&dir).await?;

        let path = dir.join(format!(
            "{}-{}.{}",
            kind.as_str(),
            Uuid::new_v4(),
            extension_for(content_type)
        ));
        self.paths.push(path.clone());
        let file = File::create(&path).await?;
        Ok((file, path))
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Keep the files; the database now references them
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// Delete every staged file
    pub async fn discard(mut self) {
        for path in self.paths.drain(..) {
            if let Err(e) = fs::remove_file(&path).await {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove staged upload {}: {}", path.display(), e);
                }
            }
        }
    }
}

impl Drop for StagedUploads {
    fn drop(&mut self) {
        if self.committed || self.paths.is_empty() {
            return;
        }
        for path in self.paths.drain(..) {
            tracing::warn!("Removing abandoned upload {}", path.display());
            let _ = std::fs::remove_file(&path);
        }
    }
}
