//! Atomic archive file creation.
//!
//! Bytes are written to a hidden temporary file in the target directory,
//! flushed to disk, then renamed onto the final name. A reader therefore
//! sees either no file or the complete file. The temporary name never
//! matches a snapshot name, so retention ignores leftovers.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::TabularSerializer;
use crate::domain::{ArchiveFile, TabularRecord};
use crate::error::BackupError;

/// Serializes records and persists them atomically.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveWriter {
    serializer: TabularSerializer,
}

impl ArchiveWriter {
    /// Creates a writer using the given serializer.
    #[must_use]
    pub const fn new(serializer: TabularSerializer) -> Self {
        Self { serializer }
    }

    /// Serializes `records` and writes them to `dir/file_name`.
    ///
    /// `dir` is created if absent. An existing file with the same name is
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Serialization`] if encoding fails and
    /// [`BackupError::Write`] if the directory, temporary file or rename is
    /// rejected. No file is left under `file_name` on error.
    pub async fn write<I>(
        &self,
        dir: &Path,
        file_name: &str,
        created_at: DateTime<Utc>,
        records: I,
    ) -> Result<ArchiveFile, BackupError>
    where
        I: IntoIterator,
        I::Item: TabularRecord,
    {
        let (bytes, rows) = self.serializer.to_bytes(records)?;
        let path = dir.join(file_name);
        write_atomic(dir, &path, &bytes).await?;

        tracing::debug!(path = %path.display(), rows, bytes = bytes.len(), "archive written");

        Ok(ArchiveFile {
            path,
            file_name: file_name.to_string(),
            rows,
            bytes: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            created_at,
        })
    }
}

/// Writes `bytes` to `path` through a temporary sibling and a rename.
///
/// # Errors
///
/// Returns [`BackupError::Write`] on any filesystem failure.
pub async fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), BackupError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| BackupError::write(dir, e))?;

    let tmp_path = temp_path_for(path);
    if let Err(err) = write_and_sync(&tmp_path, bytes).await {
        discard(&tmp_path).await;
        return Err(err);
    }

    if let Err(e) = fs::rename(&tmp_path, path).await {
        discard(&tmp_path).await;
        return Err(BackupError::write(path, e));
    }
    Ok(())
}

async fn write_and_sync(tmp_path: &Path, bytes: &[u8]) -> Result<(), BackupError> {
    let mut file = fs::File::create(tmp_path)
        .await
        .map_err(|e| BackupError::write(tmp_path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| BackupError::write(tmp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| BackupError::write(tmp_path, e))?;
    Ok(())
}

async fn discard(tmp_path: &Path) {
    if let Err(e) = fs::remove_file(tmp_path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %tmp_path.display(), error = %e, "failed to remove temporary file");
    }
}

/// `dir/.name.tmp` for `dir/name`.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}
