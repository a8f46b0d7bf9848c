//! Sequential directory tree builder.
//!
//! Walks a directory with an explicit work stack instead of recursion, so
//! memory used for bookkeeping grows with the number of entries rather
//! than with call depth. Nodes are parked in an arena while the walk is in
//! progress and stitched together bottom-up once every directory has been
//! read.

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

use tracing::debug;

use ctfserver_core::{FileNode, InodeInfo, TreeConfig, TreeError};

/// Builds [`FileNode`] trees from the filesystem.
///
/// Entries that cannot be stat'd are left out of their parent, and a
/// directory whose entries cannot be listed is returned with no children.
/// Only a failure to stat the root itself is reported as an error.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    config: TreeConfig,
}

impl TreeBuilder {
    /// Create a builder for the given configuration.
    pub fn new(config: TreeConfig) -> Self {
        Self { config }
    }

    /// Configuration used by this builder.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Build the tree rooted at the configured path.
    pub fn build(&self) -> Result<FileNode, TreeError> {
        let root = self.config.root.as_path();
        let metadata = self.stat(root).map_err(|e| TreeError::io(root, e))?;

        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.to_string_lossy().into_owned());

        let mut slots = vec![Slot::new(root.to_path_buf(), name, &metadata, None, 0)];
        if !metadata.is_dir() {
            return Ok(assemble(slots));
        }

        let mut pending = vec![0usize];
        while let Some(dir) = pending.pop() {
            if !self.config.can_descend(slots[dir].depth) {
                continue;
            }
            if is_own_ancestor(&slots, dir) {
                debug!(path = %slots[dir].path.display(), "not descending into directory cycle");
                continue;
            }

            let entries = match fs::read_dir(&slots[dir].path) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(path = %slots[dir].path.display(), error = %err, "cannot list directory");
                    continue;
                }
            };

            let depth = slots[dir].depth + 1;
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        debug!(path = %slots[dir].path.display(), error = %err, "cannot read directory entry");
                        continue;
                    }
                };

                let name = entry.file_name().to_string_lossy().into_owned();
                if self.config.should_skip_hidden(&name) {
                    continue;
                }

                let path = entry.path();
                let metadata = match self.stat(&path) {
                    Ok(metadata) => metadata,
                    Err(err) => {
                        debug!(path = %path.display(), error = %err, "skipping unreadable entry");
                        continue;
                    }
                };

                let child = slots.len();
                let is_dir = metadata.is_dir();
                slots.push(Slot::new(path, name, &metadata, Some(dir), depth));
                slots[dir].children.push(child);
                if is_dir {
                    pending.push(child);
                }
            }
        }

        Ok(assemble(slots))
    }

    fn stat(&self, path: &Path) -> std::io::Result<Metadata> {
        if self.config.follow_symlinks {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        }
    }
}

/// Build the tree under `root` with default settings.
pub fn build_tree(root: impl AsRef<Path>) -> Result<FileNode, TreeError> {
    TreeBuilder::new(TreeConfig::new(root.as_ref())).build()
}

/// A node parked in the arena while its directory is being walked.
struct Slot {
    node: FileNode,
    path: PathBuf,
    parent: Option<usize>,
    identity: Option<InodeInfo>,
    depth: u32,
    /// Arena indices of children, in enumeration order.
    children: Vec<usize>,
}

impl Slot {
    fn new(
        path: PathBuf,
        name: String,
        metadata: &Metadata,
        parent: Option<usize>,
        depth: u32,
    ) -> Self {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let (node, identity) = if metadata.is_dir() {
            (
                FileNode::new_directory(name, &path, modified),
                get_identity(metadata),
            )
        } else {
            (FileNode::new_file(name, &path, metadata.len(), modified), None)
        };

        Self {
            node,
            path,
            parent,
            identity,
            depth,
            children: Vec::new(),
        }
    }
}

/// Whether the directory in `slots[idx]` is the same on-disk directory as
/// one of its ancestors.
fn is_own_ancestor(slots: &[Slot], idx: usize) -> bool {
    let Some(identity) = slots[idx].identity else {
        return false;
    };

    let mut current = slots[idx].parent;
    while let Some(parent) = current {
        if slots[parent].identity == Some(identity) {
            return true;
        }
        current = slots[parent].parent;
    }
    false
}

/// Stitch the arena into a tree.
///
/// Children always sit at higher indices than their parent, so walking
/// the arena backwards finishes every subtree before its parent needs it.
fn assemble(mut slots: Vec<Slot>) -> FileNode {
    let mut finished: Vec<Option<FileNode>> = vec![None; slots.len()];

    for (offset, mut slot) in slots.drain(1..).enumerate().rev() {
        slot.node.children = take_children(&slot.children, &mut finished);
        finished[offset + 1] = Some(slot.node);
    }

    let mut root = slots.swap_remove(0);
    root.node.children = take_children(&root.children, &mut finished);
    root.node
}

fn take_children(ids: &[usize], finished: &mut [Option<FileNode>]) -> Vec<FileNode> {
    ids.iter().filter_map(|&id| finished[id].take()).collect()
}

/// Get the (inode, device) identity of a directory.
#[cfg(unix)]
fn get_identity(metadata: &Metadata) -> Option<InodeInfo> {
    Some(InodeInfo::new(metadata.ino(), metadata.dev()))
}

#[cfg(not(unix))]
fn get_identity(_metadata: &Metadata) -> Option<InodeInfo> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir2/file4.txt"), "another file here").unwrap();

        temp
    }

    #[test]
    fn test_basic_build() {
        let temp = create_test_tree();
        let tree = build_tree(temp.path()).unwrap();

        assert!(tree.is_dir());
        assert_eq!(tree.child_count(), 3);
        // root + 3 dirs + 4 files
        assert_eq!(tree.node_count(), 8);

        let file1 = tree.child("file1.txt").unwrap();
        assert!(file1.is_file());
        assert_eq!(file1.size, 5);
        assert!(file1.children.is_empty());

        let subdir = tree.child("dir1").and_then(|d| d.child("subdir")).unwrap();
        assert_eq!(subdir.size, 0);
        assert_eq!(subdir.child("file3.txt").map(|f| f.size), Some(4));
    }

    #[test]
    fn test_child_order_matches_read_dir() {
        let temp = create_test_tree();
        let tree = build_tree(temp.path()).unwrap();

        let expected: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        let actual: Vec<String> = tree.children.iter().map(|c| c.name.to_string()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_paths_are_full_paths() {
        let temp = create_test_tree();
        let tree = build_tree(temp.path()).unwrap();

        let file2 = tree.child("dir1").and_then(|d| d.child("file2.txt")).unwrap();
        assert_eq!(
            PathBuf::from(&file2.path),
            temp.path().join("dir1").join("file2.txt")
        );
    }

    #[test]
    fn test_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        let err = build_tree(temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, TreeError::NotFound { .. }));
    }

    #[test]
    fn test_file_root() {
        let temp = create_test_tree();
        let tree = build_tree(temp.path().join("file1.txt")).unwrap();
        assert!(tree.is_file());
        assert_eq!(tree.name.as_str(), "file1.txt");
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_max_depth() {
        let temp = create_test_tree();
        let config = TreeConfig::builder()
            .root(temp.path())
            .max_depth(Some(1u32))
            .build()
            .unwrap();
        let tree = TreeBuilder::new(config).build().unwrap();

        let dir1 = tree.child("dir1").unwrap();
        assert!(dir1.is_dir());
        assert!(dir1.children.is_empty());
        assert_eq!(tree.child_count(), 3);
    }

    #[test]
    fn test_skip_hidden() {
        let temp = create_test_tree();
        fs::write(temp.path().join(".secret"), "x").unwrap();

        let tree = build_tree(temp.path()).unwrap();
        assert!(tree.child(".secret").is_some());

        let config = TreeConfig::builder()
            .root(temp.path())
            .include_hidden(false)
            .build()
            .unwrap();
        let tree = TreeBuilder::new(config).build().unwrap();
        assert!(tree.child(".secret").is_none());
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let temp = TempDir::new().unwrap();
        let mut path = temp.path().to_path_buf();
        for _ in 0..200 {
            path.push("d");
        }
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("leaf"), "x").unwrap();

        let tree = build_tree(temp.path()).unwrap();
        assert_eq!(tree.node_count(), 202);
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_is_omitted() {
        let temp = create_test_tree();
        std::os::unix::fs::symlink(temp.path().join("missing"), temp.path().join("dangling"))
            .unwrap();

        let tree = build_tree(temp.path()).unwrap();
        assert!(tree.child("dangling").is_none());
        assert_eq!(tree.child_count(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let temp = create_test_tree();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("dir1/loop")).unwrap();

        let tree = build_tree(temp.path()).unwrap();
        let looped = tree.child("dir1").and_then(|d| d.child("loop")).unwrap();
        assert!(looped.is_dir());
        assert!(looped.children.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_not_followed() {
        let temp = create_test_tree();
        std::os::unix::fs::symlink(temp.path().join("dir2"), temp.path().join("link")).unwrap();

        let config = TreeConfig::builder()
            .root(temp.path())
            .follow_symlinks(false)
            .build()
            .unwrap();
        let tree = TreeBuilder::new(config).build().unwrap();
        let link = tree.child("link").unwrap();
        assert!(link.is_file());
        assert!(link.children.is_empty());
    }
}
