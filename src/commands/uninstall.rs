//! `uninstall <packages>` (SPEC_FULL.md §4): drop manifest entries, then
//! recompute the graph's closure from the surviving direct dependencies and
//! re-run cleanup (C9) against it, so packages that were only transitively
//! required drop too — unlike the teacher, which leaves orphaned
//! transitives behind after an uninstall.

use std::collections::BTreeSet;

use crate::cleanup;
use crate::config::Roots;
use crate::error::Result;
use crate::graph::restrict_to_reachable;
use crate::identifier;
use crate::lockstore;
use crate::manifest;
use crate::reporter::Reporter;

pub fn run(roots: &Roots, packages: &[String], reporter: &Reporter) -> Result<()> {
    let to_remove: BTreeSet<&str> = packages.iter().map(String::as_str).collect();

    let mut manifest_doc = manifest::read(&roots.manifest_path())?;
    let removed_from_manifest = to_remove
        .iter()
        .filter(|name| manifest_doc.dependencies.remove(**name).is_some())
        .count();

    manifest::write_dependencies(&roots.manifest_path(), &manifest_doc.dependencies)?;

    let Some(graph) = lockstore::read(&roots.lockfile_path())? else {
        reporter.info(&format!("removed {removed_from_manifest} package(s) from the manifest"));
        return Ok(());
    };

    // Roots are the still-locked identifiers for names the manifest still
    // declares (no re-resolution needed — the version is already pinned);
    // the graph is then pruned to exactly what those roots still reach, so
    // a transitive-only dependency of a removed package is dropped even if
    // its name never appears in `to_remove`, while a node another surviving
    // root still depends on is kept even if its name does (spec §3
    // invariant 1: closure).
    let surviving_roots: BTreeSet<String> = graph
        .iter()
        .filter(|(_, node)| node.is_direct_dependency)
        .filter_map(|(id, _)| {
            identifier::parse(id)
                .and_then(|(name, _)| manifest_doc.dependencies.contains_key(name).then(|| id.clone()))
        })
        .collect();

    let graph = restrict_to_reachable(&graph, &surviving_roots);

    let removed_paths = cleanup::run(&roots.module, &graph)?;
    lockstore::write(&roots.lockfile_path(), &graph)?;

    reporter.success(&format!(
        "removed {removed_from_manifest} manifest entr{ies} and {dirs} director{dir_ies} from {module}",
        ies = if removed_from_manifest == 1 { "y" } else { "ies" },
        dirs = removed_paths.len(),
        dir_ies = if removed_paths.len() == 1 { "y" } else { "ies" },
        module = roots.module.display(),
    ));

    Ok(())
}
