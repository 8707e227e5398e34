//! Atomic persistence of rendered artifacts.
//!
//! Downstream processes read artifact files at arbitrary times, including
//! while a new version is being produced. The writer therefore never touches
//! the target file directly: content goes to a temporary sibling in the same
//! directory (same filesystem, so the final rename is atomic) and a single
//! rename swaps it into place. A reader sees the complete old content or the
//! complete new content, never a mixture and never a truncated file.

use crate::error::{MirrorError, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Writes artifact files such that concurrent readers never observe a
/// partial write.
///
/// One writer instance serves one artifact directory. Each target file is
/// owned by exactly one watched path, so writers never contend on a file.
///
/// # Examples
///
/// ```rust,no_run
/// use confmirror::artifact::AtomicFileWriter;
///
/// # async fn example() -> confmirror::error::Result<()> {
/// let writer = AtomicFileWriter::new("/var/lib/myapp/conf");
/// writer.write("allow_list.json", "{\"allow_list\": {}}").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    /// Create a writer rooted at the given artifact directory.
    ///
    /// The directory is created on first write if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The artifact directory this writer targets.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the artifact file for `file_name`.
    pub fn target_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Atomically replace `file_name` with `content`.
    ///
    /// Write flow: create parent directory if absent, write `content` to a
    /// `.tmp` sibling, flush and sync it, then rename over the target.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Write`] if the temporary file cannot be
    /// created, written, or renamed. In every failure case the target file
    /// is left exactly as it was — if it existed before, it still exists
    /// with its prior content. A temporary file orphaned by a failed rename
    /// is removed best-effort.
    pub async fn write(&self, file_name: &str, content: &str) -> Result<()> {
        let target = self.target_path(file_name);
        let tmp = self.dir.join(format!("{}.tmp", file_name));

        let write_err = |source: std::io::Error| MirrorError::Write {
            target: target.display().to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(write_err)?;

        let mut file = tokio::fs::File::create(&tmp).await.map_err(write_err)?;
        file.write_all(content.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;
        // Sync before the rename so a crash cannot promote an empty file.
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }

        Ok(())
    }
}
