//! Temporary files handed to the transport.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::Result;

const FALLBACK_FILE_NAME: &str = "upload.txt";

/// Root directory under which staged files are created.
///
/// Every staged file gets its own fresh sub-directory, so two turns staging
/// `result.txt` at the same time never share a path.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reserves a path named `file_name` without writing anything to it.
    pub async fn reserve(&self, file_name: &str) -> Result<StagedFile> {
        let dir = self.root.join(Uuid::now_v7().to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let name = Path::new(file_name)
            .file_name()
            .map_or_else(|| FALLBACK_FILE_NAME.into(), ToOwned::to_owned);
        let path = dir.join(name);
        debug!("Staging {}", path.display());

        Ok(StagedFile {
            dir,
            path,
            removed: false,
        })
    }

    /// Writes `contents` to a newly reserved `file_name`.
    pub async fn stage(&self, file_name: &str, contents: &str) -> Result<StagedFile> {
        let staged = self.reserve(file_name).await?;
        tokio::fs::write(staged.path(), contents).await?;
        Ok(staged)
    }
}

/// A staged file, removed together with its directory when dropped.
#[derive(Debug)]
pub struct StagedFile {
    dir: PathBuf,
    path: PathBuf,
    removed: bool,
}

impl StagedFile {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the file and its directory without blocking the runtime.
    pub async fn remove(mut self) {
        self.removed = true;
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {e}", self.dir.display()),
        }
    }
}

// Fallback for early returns and errors; the blocking call is brief since the
// directory holds a single file.
impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {e}", self.dir.display()),
        }
    }
}
