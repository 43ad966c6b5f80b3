//! Orchestrator (spec §4.9, C10): the five-step `install` sequence that
//! ties every other component together.

use crate::cleanup;
use crate::content_cache::ContentCache;
use crate::error::Result;
use crate::graph::{DependencyGraph, GraphBuilder};
use crate::installer::{InstallOptions, Installer};
use crate::lockstore;
use crate::manifest;
use crate::reconciler::{self, Verdict};
use crate::registry::RegistryClient;
use crate::reporter::Reporter;
use crate::config::{self, Roots};

pub struct InstallReport {
    pub installed: usize,
    pub removed: Vec<String>,
    pub reused_lock: bool,
}

/// Run a full install against `roots` (spec §4.9):
///
/// 1. Ensure the output/module/cache roots exist.
/// 2. Read the manifest.
/// 3. Read the lock file, if present; if it reconciles against the
///    manifest, skip graph building and install directly from it.
/// 4. Otherwise build a fresh graph from the manifest's direct
///    dependencies.
/// 5. Install the (possibly reused) graph, run cleanup, and — only on a
///    freshly built graph — write the new lock file.
pub async fn install(
    roots: &Roots,
    options: InstallOptions,
    reporter: &Reporter,
) -> Result<InstallReport> {
    roots.ensure_exist()?;

    let manifest = manifest::read(&roots.manifest_path())?;
    let locked = lockstore::read(&roots.lockfile_path())?;

    let (graph, reused_lock): (DependencyGraph, bool) = match locked {
        Some(locked) if reconciler::verdict(&manifest.dependencies, &locked) == Verdict::Unchanged => {
            reporter.info("lock file satisfies manifest, skipping resolution");
            (locked, true)
        }
        _ => {
            reporter.info("resolving dependency graph");
            let client = RegistryClient::new(config::REGISTRY_BASE_URL);
            let mut builder = GraphBuilder::new(client, config::METADATA_CACHE_CAPACITY);
            let mut graph = DependencyGraph::new();
            for (name, range) in &manifest.dependencies {
                builder.build_direct(name, range, &mut graph).await?;
            }
            (graph, false)
        }
    };

    let client = RegistryClient::new(config::REGISTRY_BASE_URL);
    let content_cache = ContentCache::new(&roots.cache);
    let mut installer = Installer::new(&client, &content_cache, &roots.module, reporter, options);
    if !reporter.quiet {
        installer = installer.with_progress(graph.len() as u64);
    }
    let installed = installer.install_graph(&graph).await?;

    let removed = cleanup::run(&roots.module, &graph)?;

    if !reused_lock {
        lockstore::write(&roots.lockfile_path(), &graph)?;
    }

    Ok(InstallReport { installed, removed, reused_lock })
}
