//! Box-drawing text rendering of file trees.

use std::fmt::Write;

use crate::format::format_size;
use crate::node::FileNode;

/// Connector for an entry followed by more siblings.
pub const BRANCH: &str = "├── ";
/// Connector for the last entry of a sibling group.
pub const LAST_BRANCH: &str = "└── ";
/// Indent carried below a non-last entry.
const PIPE_INDENT: &str = "│   ";
/// Indent carried below the last entry.
const SPACE_INDENT: &str = "    ";

/// Render a tree the way `tree(1)` does.
///
/// The root is printed bare on the first line; every descendant gets one
/// line with its connector, directories marked with a trailing `/` and
/// files with their size in parentheses. Siblings keep their order in
/// `children`.
pub fn render_pretty(root: &FileNode) -> String {
    let mut out = String::new();
    out.push_str(&root.name);
    if root.is_dir() {
        out.push('/');
    }
    out.push('\n');

    // (node, prefix inherited from ancestors, is last sibling)
    let mut stack: Vec<(&FileNode, String, bool)> = Vec::new();
    push_children(&mut stack, root, "");

    while let Some((node, prefix, is_last)) = stack.pop() {
        let connector = if is_last { LAST_BRANCH } else { BRANCH };
        out.push_str(&prefix);
        out.push_str(connector);
        out.push_str(&node.name);
        if node.is_dir() {
            out.push('/');
        } else {
            let _ = write!(out, " ({})", format_size(node.size));
        }
        out.push('\n');

        if !node.children.is_empty() {
            let indent = if is_last { SPACE_INDENT } else { PIPE_INDENT };
            push_children(&mut stack, node, &format!("{prefix}{indent}"));
        }
    }

    out
}

/// Queue children so that popping yields them first to last.
fn push_children<'a>(stack: &mut Vec<(&'a FileNode, String, bool)>, node: &'a FileNode, prefix: &str) {
    let last = node.children.len().saturating_sub(1);
    for (i, child) in node.children.iter().enumerate().rev() {
        stack.push((child, prefix.to_string(), i == last));
    }
}
