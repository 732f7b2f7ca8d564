use std::fs;
use std::path::{Path, PathBuf};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|path| path.parent())
        .expect("crates/tpconfirm-app should have a workspace root parent")
        .to_path_buf()
}

fn crate_dirs(root: &Path) -> Vec<PathBuf> {
    let entries = fs::read_dir(root.join("crates")).expect("read crates directory");
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry.expect("read crate entry").path();
        if path.is_dir() && path.join("Cargo.toml").exists() {
            dirs.push(path);
        }
    }
    dirs.sort();
    dirs
}

#[test]
fn workspace_manifest_lists_every_crate() {
    let root = repo_root();
    let workspace_manifest =
        fs::read_to_string(root.join("Cargo.toml")).expect("read workspace Cargo.toml");

    for path in crate_dirs(&root) {
        let crate_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .expect("crate directory name must be valid UTF-8");
        let expected_member = format!("\"crates/{crate_name}\"");
        assert!(
            workspace_manifest.contains(&expected_member),
            "workspace manifest is missing member {expected_member}",
        );
    }
}

#[test]
fn crate_manifests_inherit_workspace_package_settings() {
    let root = repo_root();
    for path in crate_dirs(&root) {
        let manifest_path = path.join("Cargo.toml");
        let manifest = fs::read_to_string(&manifest_path)
            .unwrap_or_else(|_| panic!("read {}", manifest_path.display()));
        for key in ["version.workspace = true", "edition.workspace = true"] {
            assert!(
                manifest.contains(key),
                "{} must set {key}",
                manifest_path.display(),
            );
        }
        assert!(
            !manifest.contains("{ path = "),
            "{} must depend on sibling crates through workspace dependencies",
            manifest_path.display(),
        );
    }
}
