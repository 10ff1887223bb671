//! Workspace management for pipeline runs.
//!
//! A [`Workspace`] provides a temporary directory for the downloaded source
//! and the transcoded rendition, and publishes the finished rendition into
//! the cache with an atomic rename. Intermediate files never touch the cache
//! directory, so readers only ever see complete renditions.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// File name of the downloaded source inside a workspace.
const SOURCE_NAME: &str = "source.webm";

/// File name of the transcoded rendition inside a workspace.
const RENDITION_NAME: &str = "rendition.mp4";

/// Scratch directory for a single pipeline run.
///
/// # Example
///
/// ```no_run
/// use tubecast_av::Workspace;
///
/// # fn example() -> tubecast_core::Result<()> {
/// let workspace = Workspace::new()?;
/// // ... download to workspace.source(), transcode to workspace.rendition() ...
/// workspace.publish(std::path::Path::new("/var/cache/tubecast/news.mp4"))?;
/// # Ok(())
/// # }
/// ```
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a new workspace backed by a fresh temporary directory.
    pub fn new() -> tubecast_core::Result<Self> {
        let temp_dir = TempDir::new().map_err(|e| tubecast_core::Error::Tool {
            tool: "workspace".to_string(),
            message: format!("failed to create temp dir: {e}"),
        })?;
        Ok(Self { temp_dir })
    }

    /// Path to the temporary directory.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Where the downloaded source file goes.
    pub fn source(&self) -> PathBuf {
        self.temp_dir.path().join(SOURCE_NAME)
    }

    /// Where the transcoded rendition goes.
    pub fn rendition(&self) -> PathBuf {
        self.temp_dir.path().join(RENDITION_NAME)
    }

    /// Publish the finished rendition to `dest`, consuming the workspace.
    ///
    /// Tries a rename first (atomic on the same filesystem) and falls back to
    /// copy+remove when the cache lives on a different filesystem. The
    /// destination's parent directory is created if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the rendition was never written or if the move
    /// fails.
    pub fn publish(self, dest: &Path) -> tubecast_core::Result<PathBuf> {
        let rendition = self.rendition();

        if !rendition.exists() {
            return Err(tubecast_core::Error::Tool {
                tool: "workspace".to_string(),
                message: format!("rendition file does not exist: {}", rendition.display()),
            });
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| tubecast_core::Error::Tool {
                tool: "workspace".to_string(),
                message: format!("failed to create cache dir {}: {e}", parent.display()),
            })?;
        }

        if let Err(_rename_err) = std::fs::rename(&rendition, dest) {
            std::fs::copy(&rendition, dest).map_err(|e| tubecast_core::Error::Tool {
                tool: "workspace".to_string(),
                message: format!("failed to copy rendition to destination: {e}"),
            })?;
            let _ = std::fs::remove_file(&rendition);
        }

        Ok(dest.to_path_buf())
    }
}
