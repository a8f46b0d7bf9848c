//! Directory tree building for ctfserver.
//!
//! This crate turns a directory on disk into a [`FileNode`] tree. The walk
//! is sequential and driven by an explicit work stack, so very deep
//! directory hierarchies cannot exhaust the call stack.
//!
//! # Example
//!
//! ```rust,no_run
//! use ctfserver_scan::{TreeBuilder, TreeConfig, render_pretty};
//!
//! let builder = TreeBuilder::new(TreeConfig::new("/srv/ctf"));
//! let tree = builder.build().unwrap();
//!
//! println!("{} entries", tree.node_count());
//! print!("{}", render_pretty(&tree));
//! ```
//!
//! Entries that disappear or cannot be stat'd while the walk is running are
//! dropped from the result rather than failing the whole request.

mod builder;

pub use builder::{TreeBuilder, build_tree};

// Re-export core types for convenience
pub use ctfserver_core::{FileNode, TreeConfig, TreeError, format_size, render_pretty};
