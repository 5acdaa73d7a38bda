//! Per-run scratch directory.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary directory holding every intermediate of one run.
///
/// Removed on drop, whether the run succeeded or not, unless it was
/// created with `retain`.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
    retain: bool,
}

impl Workspace {
    /// Create a workspace under the system temp directory.
    pub fn create(retain: bool) -> io::Result<Self> {
        Self::from_temp_dir(builder().tempdir()?, retain)
    }

    /// Create a workspace under `parent`.
    pub fn create_in(parent: &Path, retain: bool) -> io::Result<Self> {
        std::fs::create_dir_all(parent)?;
        Self::from_temp_dir(builder().tempdir_in(parent)?, retain)
    }

    fn from_temp_dir(dir: TempDir, retain: bool) -> io::Result<Self> {
        let path = dir.path().to_path_buf();
        tracing::debug!("Created workspace {}", path.display());
        Ok(Self {
            dir: Some(dir),
            path,
            retain,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_retained(&self) -> bool {
        self.retain
    }
}

fn builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("vmerge-");
    builder
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        if self.retain {
            let path = dir.keep();
            tracing::info!("Workspace kept at {}", path.display());
        } else if let Err(e) = dir.close() {
            tracing::warn!("Failed to remove workspace {}: {}", self.path.display(), e);
        }
    }
}
