//! Tree traversal and server configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default served directory.
pub const DEFAULT_ROOT_DIR: &str = ".";

/// Default upload directory.
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";

/// Default upload ceiling (200 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 200 * 1024 * 1024;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Valid log level values for tracing configuration.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Configuration for a tree traversal.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct TreeConfig {
    /// Root path to traverse.
    pub root: PathBuf,

    /// Maximum depth to descend into (None = unlimited). The root is depth 0.
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Include hidden entries (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Stat through symbolic links instead of reporting the link itself.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub follow_symlinks: bool,
}

fn default_true() -> bool {
    true
}

impl TreeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl TreeConfig {
    /// Create a new tree config builder.
    pub fn builder() -> TreeConfigBuilder {
        TreeConfigBuilder::default()
    }

    /// Create a config that walks everything below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: None,
            include_hidden: true,
            follow_symlinks: true,
        }
    }

    /// Check if hidden entries should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }

    /// Check whether a directory at `depth` may have its entries read.
    pub fn can_descend(&self, depth: u32) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Configuration for the HTTP server process.
///
/// Builder fields left unset take their value from [`ServerConfig::default`].
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Directory served by the tree endpoints and `/files/`.
    pub root_dir: PathBuf,

    /// Directory uploads are written to.
    pub upload_dir: PathBuf,

    /// Maximum accepted upload size in bytes.
    pub max_upload_size: u64,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a new server config builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tree traversal settings for the served root.
    pub fn tree_config(&self) -> TreeConfig {
        TreeConfig::new(&self.root_dir)
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.root_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath { field: "root_dir" });
        }
        if self.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath { field: "upload_dir" });
        }
        if self.max_upload_size == 0 {
            return Err(ConfigError::InvalidMaxUploadSize);
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }
        Ok(())
    }
}
