//! JSON bodies returned by the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ctfserver_core::FileNode;
use ctfserver_ops::{UploadResult, UploadedFileRecord, UploadsListing};

/// Version reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `GET /filetree`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTreeResponse {
    pub success: bool,
    pub root: FileNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileTreeResponse {
    pub fn new(root: FileNode) -> Self {
        Self {
            success: true,
            root,
            error: None,
        }
    }
}

/// `GET /filetree/pretty` with JSON negotiated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrettyFileTreeResponse {
    pub success: bool,
    pub root: FileNode,
    pub tree_string: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PrettyFileTreeResponse {
    pub fn new(root: FileNode, tree_string: String) -> Self {
        Self {
            success: true,
            root,
            tree_string,
            error: None,
        }
    }
}

/// `POST /upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub size: u64,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<UploadResult> for UploadResponse {
    fn from(result: UploadResult) -> Self {
        Self {
            success: true,
            filename: result.filename,
            size: result.size,
            path: result.path.to_string_lossy().into_owned(),
            error: None,
        }
    }
}

/// `GET /uploads` with JSON negotiated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsListResponse {
    pub success: bool,
    pub files: Vec<UploadedFileRecord>,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<UploadsListing> for UploadsListResponse {
    fn from(listing: UploadsListing) -> Self {
        Self {
            success: true,
            count: listing.count(),
            files: listing.files,
            error: None,
        }
    }
}

/// Body of every 4xx/5xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            version: VERSION.to_string(),
        }
    }
}
