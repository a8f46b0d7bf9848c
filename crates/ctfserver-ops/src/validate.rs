//! Upload filename and size validation.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path};

use thiserror::Error;

use ctfserver_core::DEFAULT_MAX_UPLOAD_SIZE;

/// Longest accepted file name, in bytes.
const MAX_NAME_LEN: usize = 255;

/// Separators stripped from client-supplied names, whatever the host OS.
const SEPARATORS: [char; 2] = ['/', '\\'];

/// Why an upload was refused before anything was written.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    /// The declared size is above the configured ceiling.
    #[error("File size exceeds maximum allowed size of {max} bytes")]
    TooLarge { declared: u64, max: u64 },

    /// The client-supplied name is unsafe or empty.
    #[error("Invalid filename")]
    InvalidFilename { reason: &'static str },
}

/// A base file name that passed validation.
///
/// The only way to build one is [`UploadValidator::validate`], so a value of
/// this type is always safe to join onto the upload directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanitizedFilename(String);

impl SanitizedFilename {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for SanitizedFilename {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for SanitizedFilename {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for SanitizedFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks uploads against the size ceiling and the filename rules.
#[derive(Debug, Clone, Copy)]
pub struct UploadValidator {
    max_upload_size: u64,
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_SIZE)
    }
}

impl UploadValidator {
    pub fn new(max_upload_size: u64) -> Self {
        Self { max_upload_size }
    }

    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Validate an upload before touching disk.
    ///
    /// The size is checked first, then the name. Directory prefixes are
    /// stripped (`docs/report.pdf` becomes `report.pdf`), but any `..`
    /// component in the raw name rejects the upload outright.
    pub fn validate(
        &self,
        declared_size: u64,
        raw_filename: &str,
    ) -> Result<SanitizedFilename, Rejection> {
        if declared_size > self.max_upload_size {
            return Err(Rejection::TooLarge {
                declared: declared_size,
                max: self.max_upload_size,
            });
        }

        sanitize_filename(raw_filename)
            .map(SanitizedFilename)
            .map_err(|reason| Rejection::InvalidFilename { reason })
    }
}

/// Reduce a client-supplied name to a safe base name.
fn sanitize_filename(raw: &str) -> Result<String, &'static str> {
    if raw.is_empty() {
        return Err("name is empty");
    }

    if raw.contains('\0') {
        return Err("name contains NUL");
    }

    if raw.split(SEPARATORS).any(|part| part == "..") {
        return Err("name contains a parent directory component");
    }

    let base = raw.rsplit(SEPARATORS).next().unwrap_or(raw);
    if base.is_empty() || base == "." {
        return Err("name has no file component");
    }

    if base.len() > MAX_NAME_LEN {
        return Err("name is too long");
    }

    // What is left must be exactly one plain path component.
    let mut components = Path::new(base).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == OsStr::new(base) => Ok(base.to_string()),
        _ => Err("name is not a plain file name"),
    }
}
