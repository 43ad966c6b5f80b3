//! Cleanup (spec §4.8, C9).
//!
//! After every node in the final graph has been extracted, recursively
//! delete any top-level entry under the module root that the graph no
//! longer accounts for — this is what drops a transitive dependency's
//! directory when an upgrade stops requiring it (spec §8, S3: upgrading
//! `semver@7.5.2` to `7.6.2` removes the now-orphaned `yallist`).

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{IoResultExt, Result};
use crate::graph::DependencyGraph;
use crate::identifier;

/// The set of top-level directory entries a graph entails: for a bare
/// name, the name itself; for a scoped name, both the scope directory
/// and the full `@scope/name` path (spec §4.8 — cleanup must not delete
/// a scope directory that still holds other packages).
pub fn expected_entries(graph: &DependencyGraph) -> BTreeSet<String> {
    let mut expected = BTreeSet::new();
    for id in graph.keys() {
        let Some((name, _)) = identifier::parse(id) else {
            continue;
        };
        if let Some(scope) = identifier::scope_of(name) {
            expected.insert(scope.to_string());
            expected.insert(name.to_string());
        } else {
            expected.insert(name.to_string());
        }
    }
    expected
}

/// Remove any top-level entry under `module_root` not in `graph`'s
/// expected set. `.bin` is never removed — it's the installer's own
/// symlink directory, not a package. A surviving scope directory is then
/// recursed into one level so an orphaned scoped package (e.g. `@scope/y`
/// dropped from the graph while `@scope/x` survives) is dropped too,
/// mirroring the bare-name case (spec §8, S3) instead of leaving it behind
/// just because its scope sibling still exists.
pub fn run(module_root: &Path, graph: &DependencyGraph) -> Result<Vec<String>> {
    let expected = expected_entries(graph);
    let mut removed = Vec::new();

    let entries = match std::fs::read_dir(module_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(removed),
        Err(e) => return Err(e).fs_err(module_root.display().to_string()),
    };

    for entry in entries {
        let entry = entry.fs_err(module_root.display().to_string())?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };

        if name == ".bin" || expected.contains(&name) {
            if name.starts_with('@') {
                removed.extend(clean_scope_dir(&entry.path(), &name, &expected)?);
            }
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type().fs_err(path.display().to_string())?;
        if file_type.is_dir() {
            std::fs::remove_dir_all(&path).fs_err(path.display().to_string())?;
        } else {
            std::fs::remove_file(&path).fs_err(path.display().to_string())?;
        }
        removed.push(name);
    }

    Ok(removed)
}

/// Remove any entry under a surviving scope directory whose full
/// `@scope/name` path isn't in `expected` (it was inserted by
/// [`expected_entries`] for exactly this comparison).
fn clean_scope_dir(scope_dir: &Path, scope_name: &str, expected: &BTreeSet<String>) -> Result<Vec<String>> {
    let mut removed = Vec::new();

    let entries = match std::fs::read_dir(scope_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(removed),
        Err(e) => return Err(e).fs_err(scope_dir.display().to_string()),
    };

    for entry in entries {
        let entry = entry.fs_err(scope_dir.display().to_string())?;
        let Some(pkg_name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let full_name = format!("{scope_name}/{pkg_name}");

        if expected.contains(&full_name) {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type().fs_err(path.display().to_string())?;
        if file_type.is_dir() {
            std::fs::remove_dir_all(&path).fs_err(path.display().to_string())?;
        } else {
            std::fs::remove_file(&path).fs_err(path.display().to_string())?;
        }
        removed.push(full_name);
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PackageNode;
    use std::fs;

    fn node() -> PackageNode {
        PackageNode {
            version: "1.0.0".to_string(),
            tarball_url: String::new(),
            integrity: None,
            is_direct_dependency: true,
            dependencies: vec![],
        }
    }

    #[test]
    fn expected_entries_covers_scope_and_full_name() {
        let mut graph = DependencyGraph::new();
        graph.insert("@scope/x@1.0.0".to_string(), node());
        graph.insert("lodash@4.0.0".to_string(), node());

        let expected = expected_entries(&graph);
        assert!(expected.contains("@scope"));
        assert!(expected.contains("@scope/x"));
        assert!(expected.contains("lodash"));
        assert_eq!(expected.len(), 3);
    }

    #[test]
    fn removes_stray_top_level_directory() {
        let dir = tempfile::tempdir().unwrap();
        let module_root = dir.path().join("node_modules");
        fs::create_dir_all(module_root.join("yallist")).unwrap();
        fs::create_dir_all(module_root.join("semver")).unwrap();

        let mut graph = DependencyGraph::new();
        graph.insert("semver@7.6.2".to_string(), node());

        let removed = run(&module_root, &graph).unwrap();
        assert_eq!(removed, vec!["yallist".to_string()]);
        assert!(!module_root.join("yallist").exists());
        assert!(module_root.join("semver").exists());
    }

    #[test]
    fn keeps_bin_directory() {
        let dir = tempfile::tempdir().unwrap();
        let module_root = dir.path().join("node_modules");
        fs::create_dir_all(module_root.join(".bin")).unwrap();

        let graph = DependencyGraph::new();
        let removed = run(&module_root, &graph).unwrap();

        assert!(removed.is_empty());
        assert!(module_root.join(".bin").exists());
    }

    #[test]
    fn missing_module_root_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let module_root = dir.path().join("node_modules");
        let graph = DependencyGraph::new();
        assert_eq!(run(&module_root, &graph).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn scoped_sibling_survives_when_package_kept() {
        let dir = tempfile::tempdir().unwrap();
        let module_root = dir.path().join("node_modules");
        fs::create_dir_all(module_root.join("@scope").join("x")).unwrap();
        fs::create_dir_all(module_root.join("@scope").join("y")).unwrap();

        let mut graph = DependencyGraph::new();
        graph.insert("@scope/x@1.0.0".to_string(), node());

        let removed = run(&module_root, &graph).unwrap();
        assert_eq!(removed, vec!["@scope/y".to_string()]);
        assert!(module_root.join("@scope").exists());
        assert!(module_root.join("@scope").join("x").exists());
        assert!(!module_root.join("@scope").join("y").exists());
    }

    #[test]
    fn entire_scope_removed_when_graph_has_no_packages_left_in_it() {
        let dir = tempfile::tempdir().unwrap();
        let module_root = dir.path().join("node_modules");
        fs::create_dir_all(module_root.join("@scope").join("x")).unwrap();

        let graph = DependencyGraph::new();

        let removed = run(&module_root, &graph).unwrap();
        assert_eq!(removed, vec!["@scope".to_string()]);
        assert!(!module_root.join("@scope").exists());
    }
}
