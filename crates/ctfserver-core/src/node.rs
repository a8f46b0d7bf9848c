//! File and directory node types.

use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Device and inode pair identifying a directory on disk.
///
/// Used by the tree builder to recognise a directory that is its own
/// ancestor (a symlink cycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InodeInfo {
    /// Inode number.
    pub inode: u64,
    /// Device ID.
    pub device: u64,
}

impl InodeInfo {
    /// Create new inode info.
    pub fn new(inode: u64, device: u64) -> Self {
        Self { inode, device }
    }
}

/// A single file or directory in the tree.
///
/// Nodes are produced fresh for every traversal and never mutated
/// afterwards. `children` is only ever populated for directories and
/// keeps the order in which the filesystem enumerated the entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    /// File/directory name (not full path).
    pub name: CompactString,

    /// Full path as seen during traversal.
    pub path: String,

    /// Whether this node is a directory.
    pub is_dir: bool,

    /// Size in bytes. Always 0 for directories.
    pub size: u64,

    /// Last modification time.
    #[serde(rename = "mod_time")]
    pub modified_at: DateTime<Utc>,

    /// Children nodes (directories only), in enumeration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileNode>,
}

impl FileNode {
    /// Create a new file node.
    pub fn new_file(
        name: impl Into<CompactString>,
        path: impl AsRef<Path>,
        size: u64,
        modified: SystemTime,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.as_ref().to_string_lossy().into_owned(),
            is_dir: false,
            size,
            modified_at: DateTime::<Utc>::from(modified),
            children: Vec::new(),
        }
    }

    /// Create a new, empty directory node.
    pub fn new_directory(
        name: impl Into<CompactString>,
        path: impl AsRef<Path>,
        modified: SystemTime,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.as_ref().to_string_lossy().into_owned(),
            is_dir: true,
            size: 0,
            modified_at: DateTime::<Utc>::from(modified),
            children: Vec::new(),
        }
    }

    /// Check if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&FileNode> {
        self.children.iter().find(|c| c.name.as_str() == name)
    }
}
