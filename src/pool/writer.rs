//! All-or-nothing file writes.
//!
//! Bytes are streamed into a hidden sibling file which is renamed onto the
//! destination only after everything was written and synced. A destination
//! path therefore either keeps its previous state or holds the full output.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::error::{Error, Result};

/// Copy buffer size.
const BUFFER_SIZE: usize = 64 * 1024;

/// Suffix of in-progress temporary files.
pub const TEMP_SUFFIX: &str = ".part";

/// Stream `reader` into `path` atomically, returning the number of bytes written.
///
/// Read failures surface as [`Error::Stream`], filesystem failures as
/// [`Error::Write`]. The temporary file is removed on every failure path,
/// including when the returned future is dropped mid-write.
pub async fn write_atomic<R>(path: &Path, reader: &mut R) -> Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let temp_path = temp_path_for(path)?;
    let mut guard = TempFileGuard::new(temp_path.clone());

    let mut file = File::create(&temp_path)
        .await
        .map_err(|e| write_error(path, e))?;

    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut written: u64 = 0;

    loop {
        let n = reader.read(&mut buf).await.map_err(Error::Stream)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .await
            .map_err(|e| write_error(path, e))?;
        written += n as u64;
    }

    file.flush().await.map_err(|e| write_error(path, e))?;
    file.sync_all().await.map_err(|e| write_error(path, e))?;
    drop(file);

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| write_error(path, e))?;
    guard.disarm();

    tracing::debug!("Wrote {} bytes to {}", written, path.display());
    Ok(written)
}

/// Write an in-memory payload atomically.
pub async fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<u64> {
    let mut reader = bytes;
    write_atomic(path, &mut reader).await
}

/// Build the hidden temporary sibling used while writing `path`.
///
/// The name is unique per call so an artifact left by a crashed process
/// never collides with a fresh write.
pub fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::InvalidFilename(format!("No UTF-8 file name in '{}'", path.display()))
        })?;

    let temp_name = format!(".{}.{}{}", file_name, uuid::Uuid::new_v4(), TEMP_SUFFIX);
    Ok(path.with_file_name(temp_name))
}

/// Check whether a file name belongs to an in-progress or abandoned write.
pub fn is_temp_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
}

fn write_error(path: &Path, source: std::io::Error) -> Error {
    Error::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Removes the temporary file unless the write completed.
struct TempFileGuard {
    path: Option<PathBuf>,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn disarm(&mut self) {
        self.path = None;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove temp file {}: {}", path.display(), e);
                }
            }
        }
    }
}
