//! Persisting uploads into the managed upload directory.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

use ctfserver_core::DEFAULT_MAX_UPLOAD_SIZE;

use crate::validate::SanitizedFilename;

/// Prefix of in-flight upload files. The leading dot keeps them out of
/// upload listings.
const TEMP_PREFIX: &str = ".upload-";

/// Mode requested for stored files; the process umask still applies.
#[cfg(unix)]
const UPLOAD_FILE_MODE: u32 = 0o666;

/// Metadata about a stored upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    /// Stored file name.
    pub filename: String,
    /// Bytes written.
    pub size: u64,
    /// Destination path.
    pub path: PathBuf,
}

/// Errors that can occur while storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The stream carried more bytes than allowed.
    #[error("File size exceeds maximum allowed size of {max} bytes")]
    TooLarge { max: u64 },

    /// The upload directory or destination file could not be written.
    #[error("Failed to save file: {context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: io::Error,
    },
}

impl UploadError {
    fn storage(context: &'static str, source: io::Error) -> Self {
        Self::Storage { context, source }
    }

    /// Whether the client caused this error.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::TooLarge { .. })
    }
}

/// Writes upload streams into a directory.
///
/// Each upload is streamed into a hidden temporary file next to its
/// destination and renamed into place once complete. Two uploads with the
/// same name therefore never interleave: whichever finishes last wins.
#[derive(Debug, Clone)]
pub struct UploadStore {
    upload_dir: PathBuf,
    max_upload_size: u64,
}

impl UploadStore {
    pub fn new(upload_dir: impl Into<PathBuf>, max_upload_size: u64) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_upload_size,
        }
    }

    /// Store with the default 200 MiB ceiling.
    pub fn with_default_limit(upload_dir: impl Into<PathBuf>) -> Self {
        Self::new(upload_dir, DEFAULT_MAX_UPLOAD_SIZE)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Stream `reader` into `<upload_dir>/<filename>`.
    ///
    /// At most `max_upload_size + 1` bytes are read; if the stream turns out
    /// to be larger the partial file is discarded and
    /// [`UploadError::TooLarge`] is returned.
    pub async fn store<R>(
        &self,
        filename: &SanitizedFilename,
        reader: R,
    ) -> Result<UploadResult, UploadError>
    where
        R: AsyncRead + Unpin,
    {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| UploadError::storage("failed to create upload directory", e))?;

        let dir = self.upload_dir.clone();
        let temp = blocking(move || temp_builder().tempfile_in(dir))
        .await
        .map_err(|e| UploadError::storage("failed to create destination file", e))?;

        let handle = temp
            .reopen()
            .map_err(|e| UploadError::storage("failed to open destination file", e))?;
        let mut file = tokio::fs::File::from_std(handle);

        let mut limited = reader.take(self.max_upload_size.saturating_add(1));
        let written = tokio::io::copy(&mut limited, &mut file)
            .await
            .map_err(|e| UploadError::storage("failed to write file", e))?;
        file.flush()
            .await
            .map_err(|e| UploadError::storage("failed to write file", e))?;
        drop(file);

        if written > self.max_upload_size {
            debug!(
                path = %temp.path().display(),
                limit = self.max_upload_size,
                "discarding oversized upload"
            );
            // Dropping the temp file removes it.
            return Err(UploadError::TooLarge {
                max: self.max_upload_size,
            });
        }

        let dest = self.upload_dir.join(filename.as_str());
        let target = dest.clone();
        blocking(move || persist(temp, &target))
            .await
            .map_err(|e| UploadError::storage("failed to move file into place", e))?;

        info!(
            filename = %filename,
            size = written,
            path = %dest.display(),
            "file uploaded"
        );

        Ok(UploadResult {
            filename: filename.as_str().to_string(),
            size: written,
            path: dest,
        })
    }
}

fn temp_builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_PREFIX);
    // tempfile defaults to 0600; stored uploads should be as readable as any
    // other file the process creates.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(UPLOAD_FILE_MODE));
    }
    builder
}

fn persist(temp: NamedTempFile, dest: &Path) -> io::Result<()> {
    temp.persist(dest).map(|_| ()).map_err(|e| e.error)
}

/// Run a blocking filesystem call off the async worker.
async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| io::Error::other(format!("Task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::UploadValidator;
    use tempfile::TempDir;

    fn name(raw: &str) -> SanitizedFilename {
        UploadValidator::default().validate(0, raw).unwrap()
    }

    fn visible_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_store_creates_directory_and_file() {
        let temp = TempDir::new().unwrap();
        let upload_dir = temp.path().join("nested/uploads");
        let store = UploadStore::new(&upload_dir, 1024);

        let result = store.store(&name("flag.txt"), &b"CTF{x}"[..]).await.unwrap();

        assert_eq!(result.filename, "flag.txt");
        assert_eq!(result.size, 6);
        assert_eq!(result.path, upload_dir.join("flag.txt"));
        assert_eq!(std::fs::read(&result.path).unwrap(), b"CTF{x}");
        assert_eq!(visible_entries(&upload_dir), vec!["flag.txt"]);
    }

    #[tokio::test]
    async fn test_store_empty_stream() {
        let temp = TempDir::new().unwrap();
        let store = UploadStore::new(temp.path(), 1024);

        let result = store.store(&name("empty"), &b""[..]).await.unwrap();
        assert_eq!(result.size, 0);
        assert!(result.path.exists());
    }

    #[tokio::test]
    async fn test_store_exactly_at_limit() {
        let temp = TempDir::new().unwrap();
        let store = UploadStore::new(temp.path(), 16);

        let result = store.store(&name("edge"), &[7u8; 16][..]).await.unwrap();
        assert_eq!(result.size, 16);
    }

    #[tokio::test]
    async fn test_store_rejects_oversized_stream() {
        let temp = TempDir::new().unwrap();
        let store = UploadStore::new(temp.path(), 16);

        let err = store.store(&name("big"), &[0u8; 17][..]).await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { max: 16 }));
        assert!(err.is_user_error());

        // Neither the destination nor the temp file is left behind.
        assert!(visible_entries(temp.path()).is_empty());
    }

    #[tokio::test]
    async fn test_store_overwrites_existing() {
        let temp = TempDir::new().unwrap();
        let store = UploadStore::new(temp.path(), 1024);

        store.store(&name("notes"), &b"first version"[..]).await.unwrap();
        let result = store.store(&name("notes"), &b"second"[..]).await.unwrap();

        assert_eq!(result.size, 6);
        assert_eq!(std::fs::read(temp.path().join("notes")).unwrap(), b"second");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stored_file_mode_follows_umask() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = UploadStore::new(temp.path(), 1024);
        let result = store.store(&name("loot.txt"), &b"data"[..]).await.unwrap();

        let reference = temp.path().join("reference");
        std::fs::File::create(&reference).unwrap();

        let mode = |path: &Path| std::fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&result.path), mode(&reference));
    }

    #[tokio::test]
    async fn test_store_into_unwritable_location() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let store = UploadStore::new(blocker.join("uploads"), 1024);

        let err = store.store(&name("a.txt"), &b"data"[..]).await.unwrap_err();
        assert!(matches!(err, UploadError::Storage { .. }));
        assert!(!err.is_user_error());
    }
}
