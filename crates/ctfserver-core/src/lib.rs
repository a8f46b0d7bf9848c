//! Core types for ctfserver.
//!
//! This crate provides the data structures shared by the rest of the
//! workspace: file tree nodes, configuration, error types, and the two
//! pure presentation helpers (byte-size formatting and box-drawing tree
//! rendering). Nothing in here touches the network.

mod config;
mod error;
mod format;
mod node;
mod render;

pub use config::{
    DEFAULT_HOST, DEFAULT_LOG_LEVEL, DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_PORT, DEFAULT_ROOT_DIR,
    DEFAULT_UPLOAD_DIR, ServerConfig, ServerConfigBuilder, TreeConfig, TreeConfigBuilder,
    VALID_LOG_LEVELS,
};
pub use error::{ConfigError, TreeError};
pub use format::format_size;
pub use node::{FileNode, InodeInfo};
pub use render::{BRANCH, LAST_BRANCH, render_pretty};
