//! Listing of the upload directory.

use std::fmt::Write;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use ctfserver_core::{BRANCH, LAST_BRANCH, format_size};

/// Text returned when the upload directory holds nothing to show.
pub const NO_UPLOADS_MESSAGE: &str = "No uploaded files found.";

/// One file in the upload directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileRecord {
    pub name: String,
    pub size: u64,
    #[serde(rename = "mod_time")]
    pub modified_at: DateTime<Utc>,
    /// `size` run through [`format_size`].
    pub size_human: String,
}

impl UploadedFileRecord {
    pub fn new(name: impl Into<String>, size: u64, modified: SystemTime) -> Self {
        Self {
            name: name.into(),
            size,
            modified_at: modified.into(),
            size_human: format_size(size),
        }
    }
}

/// Result of listing the upload directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadsListing {
    /// Records in directory enumeration order.
    pub files: Vec<UploadedFileRecord>,
    /// Numbered box-drawing list of `files`.
    pub pretty: String,
}

impl UploadsListing {
    /// Build a listing, rendering the text form from `files`.
    pub fn new(files: Vec<UploadedFileRecord>) -> Self {
        let pretty = render_uploads(&files);
        Self { files, pretty }
    }

    pub fn count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Reorder `files` by modification time, newest first.
    ///
    /// `pretty` keeps the enumeration order it was rendered with.
    pub fn sort_newest_first(&mut self) {
        self.files
            .sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
    }
}

/// Errors that can occur while listing uploads.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("failed to create upload directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read upload directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Enumerates the top-level files of an upload directory.
#[derive(Debug, Clone)]
pub struct UploadsLister {
    upload_dir: PathBuf,
}

impl UploadsLister {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// List the upload directory, creating it first if needed.
    ///
    /// Directories and hidden entries are skipped, as is anything that
    /// vanishes or cannot be stat'd mid-listing.
    pub fn list(&self) -> Result<UploadsListing, ListError> {
        let dir = &self.upload_dir;
        fs::create_dir_all(dir).map_err(|source| ListError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let entries = fs::read_dir(dir).map_err(|source| ListError::ReadDir {
            path: dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(path = %dir.display(), error = %err, "cannot read upload entry");
                    continue;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    debug!(path = %entry.path().display(), error = %err, "skipping unreadable upload");
                    continue;
                }
            };
            if metadata.is_dir() {
                continue;
            }

            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push(UploadedFileRecord::new(name, metadata.len(), modified));
        }

        Ok(UploadsListing::new(files))
    }
}

/// Render records as a numbered list.
fn render_uploads(files: &[UploadedFileRecord]) -> String {
    if files.is_empty() {
        return format!("{NO_UPLOADS_MESSAGE}\n");
    }

    let mut out = format!("Uploaded files ({}):\n", files.len());
    let last = files.len() - 1;
    for (i, file) in files.iter().enumerate() {
        let connector = if i == last { LAST_BRANCH } else { BRANCH };
        let _ = writeln!(
            out,
            "{connector}{}. {} ({})",
            i + 1,
            file.name,
            file.size_human
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn record(name: &str, size: u64, secs: u64) -> UploadedFileRecord {
        UploadedFileRecord::new(name, size, SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    #[test]
    fn test_record_size_human() {
        let r = record("nc", 1536, 0);
        assert_eq!(r.size_human, "1.5 KB");
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_value(record("a.txt", 3, 1_700_000_000)).unwrap();
        assert_eq!(json["name"], "a.txt");
        assert_eq!(json["size"], 3);
        assert_eq!(json["mod_time"], "2023-11-14T22:13:20Z");
        assert_eq!(json["size_human"], "3 B");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(UploadsListing::new(vec![]).pretty, "No uploaded files found.\n");
    }

    #[test]
    fn test_render_numbered() {
        let listing = UploadsListing::new(vec![
            record("shell.php", 120, 0),
            record("dump.sql", 2048, 0),
            record("keys.tar", 1_048_576, 0),
        ]);

        let expected = "\
Uploaded files (3):
├── 1. shell.php (120 B)
├── 2. dump.sql (2.0 KB)
└── 3. keys.tar (1.0 MB)
";
        assert_eq!(listing.pretty, expected);
    }

    #[test]
    fn test_sort_newest_first_keeps_pretty() {
        let mut listing = UploadsListing::new(vec![
            record("old", 1, 10),
            record("new", 1, 30),
            record("mid", 1, 20),
        ]);
        let pretty = listing.pretty.clone();

        listing.sort_newest_first();
        let names: Vec<_> = listing.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["new", "mid", "old"]);
        assert_eq!(listing.pretty, pretty);
    }

    #[test]
    fn test_list_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("uploads");
        let listing = UploadsLister::new(&dir).list().unwrap();

        assert!(dir.is_dir());
        assert_eq!(listing.count(), 0);
        assert!(listing.pretty.starts_with(NO_UPLOADS_MESSAGE));
    }

    #[test]
    fn test_list_skips_hidden_and_directories() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("loot.txt"), "12345").unwrap();
        fs::write(temp.path().join(".hidden"), "x").unwrap();
        fs::create_dir(temp.path().join("subdir")).unwrap();
        fs::write(temp.path().join("subdir/inner.txt"), "x").unwrap();

        let listing = UploadsLister::new(temp.path()).list().unwrap();
        assert_eq!(listing.count(), 1);
        assert_eq!(listing.files[0].name, "loot.txt");
        assert_eq!(listing.files[0].size, 5);
        assert_eq!(listing.files[0].size_human, "5 B");
    }

    #[test]
    fn test_list_error_when_path_is_a_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("uploads");
        fs::write(&file, "x").unwrap();

        let err = UploadsLister::new(&file).list().unwrap_err();
        assert!(matches!(err, ListError::CreateDir { .. } | ListError::ReadDir { .. }));
    }
}
