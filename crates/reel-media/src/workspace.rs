//! Job-scoped working directories and filesystem utilities.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Scoped working directory for one render job.
///
/// Every job allocates its own directory (named by job id) at start and must
/// remove it when the job ends, success or failure. `cleanup()` is the
/// explicit release; if the guard is dropped without it, only a warning can
/// be emitted since removal is async.
#[derive(Debug)]
pub struct JobWorkspace {
    root: PathBuf,
    released: bool,
}

impl JobWorkspace {
    /// Create the workspace directory under `work_dir`, named by job id.
    pub async fn create(work_dir: impl AsRef<Path>, job_id: &str) -> MediaResult<Self> {
        let root = work_dir.as_ref().join(job_id);
        fs::create_dir_all(&root).await?;
        debug!("Created job workspace {}", root.display());
        Ok(Self {
            root,
            released: false,
        })
    }

    /// Workspace root directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of a file inside the workspace.
    pub fn file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    /// Remove the workspace directory and everything in it.
    ///
    /// Removal failures are logged, not propagated: cleanup must never mask
    /// the job's primary success/failure outcome.
    pub async fn cleanup(mut self) {
        self.released = true;
        if let Err(e) = fs::remove_dir_all(&self.root).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "Failed to remove job workspace {}: {}",
                    self.root.display(),
                    e
                );
            }
        } else {
            debug!("Removed job workspace {}", self.root.display());
        }
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                "JobWorkspace {} dropped without cleanup()",
                self.root.display()
            );
        }
    }
}

/// Move a file from `src` to `dst`, handling cross-device moves.
///
/// Attempts a fast rename first; on EXDEV falls back to copy-and-delete via
/// a temp file on the destination filesystem.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            debug!(
                "Cross-device rename detected, falling back to copy+delete: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_and_delete(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Check if an IO error is EXDEV (cross-device link).
fn is_cross_device_error(e: &std::io::Error) -> bool {
    // EXDEV is error code 18 on Linux/macOS
    e.raw_os_error() == Some(18)
}

/// Copy file to destination (via temp file) then delete source.
async fn copy_and_delete(src: &Path, dst: &Path) -> MediaResult<()> {
    let tmp_dst = dst.with_extension("tmp");

    fs::copy(src, &tmp_dst).await?;

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = std::fs::remove_file(&tmp_dst);
        return Err(MediaError::from(e));
    }

    // Delete source (best effort)
    if let Err(e) = fs::remove_file(src).await {
        warn!(
            "Failed to remove source file after cross-device move: {}: {}",
            src.display(),
            e
        );
    }

    Ok(())
}
