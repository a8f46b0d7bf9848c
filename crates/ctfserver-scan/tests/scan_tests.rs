use std::fs;

use ctfserver_scan::{TreeBuilder, TreeConfig, build_tree, format_size, render_pretty};
use tempfile::TempDir;

fn ctf_root() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir_all(root.join("privesc/linux")).unwrap();
    fs::create_dir(root.join("wordlists")).unwrap();
    fs::write(root.join("privesc/linux/linpeas.sh"), vec![b'#'; 2048]).unwrap();
    fs::write(root.join("wordlists/rockyou-small.txt"), "password\n123456\n").unwrap();
    fs::write(root.join("notes.md"), "# box notes\n").unwrap();

    temp
}

#[test]
fn test_rendered_tree_matches_built_tree() {
    let temp = ctf_root();
    let tree = build_tree(temp.path()).unwrap();
    let text = render_pretty(&tree);

    let root_name = temp.path().file_name().unwrap().to_string_lossy();
    assert!(text.starts_with(&format!("{root_name}/\n")));
    assert_eq!(text.lines().count(), tree.node_count());
    assert!(text.contains("linux/\n"));
    assert!(text.contains(&format!("linpeas.sh ({})", format_size(2048))));
    assert!(text.contains("notes.md (12 B)"));
}

#[test]
fn test_tree_json_has_no_children_on_files() {
    let temp = ctf_root();
    let tree = build_tree(temp.path()).unwrap();
    let json = serde_json::to_value(&tree).unwrap();

    let children = json["children"].as_array().unwrap();
    let notes = children.iter().find(|c| c["name"] == "notes.md").unwrap();
    assert_eq!(notes["is_dir"], false);
    assert_eq!(notes["size"], 12);
    assert!(notes.get("children").is_none());
    assert!(notes["mod_time"].is_string());
}

#[test]
fn test_depth_limited_render() {
    let temp = ctf_root();
    let config = TreeConfig::builder()
        .root(temp.path())
        .max_depth(Some(1u32))
        .build()
        .unwrap();
    let tree = TreeBuilder::new(config).build().unwrap();

    // root + privesc/ + wordlists/ + notes.md
    assert_eq!(render_pretty(&tree).lines().count(), 4);
}

#[cfg(unix)]
#[test]
fn test_unreadable_entries_are_omitted() {
    use std::os::unix::fs::PermissionsExt;

    let temp = ctf_root();
    let locked = temp.path().join("locked");
    let listable = temp.path().join("listable");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("secret"), "x").unwrap();
    fs::create_dir(&listable).unwrap();
    fs::write(listable.join("hidden-by-perms"), "x").unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    // Readable but not searchable: names can be listed, entries cannot be stat'd.
    fs::set_permissions(&listable, fs::Permissions::from_mode(0o444)).unwrap();

    // Permission bits do not bind a privileged user.
    let enforced = fs::read_dir(&locked).is_err();

    let result = build_tree(temp.path());

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    fs::set_permissions(&listable, fs::Permissions::from_mode(0o755)).unwrap();

    let tree = result.unwrap();
    if !enforced {
        return;
    }

    let locked_node = tree.child("locked").unwrap();
    assert!(locked_node.is_dir());
    assert!(locked_node.children.is_empty());

    let listable_node = tree.child("listable").unwrap();
    assert!(listable_node.children.is_empty());

    assert!(tree.child("notes.md").is_some());
}
