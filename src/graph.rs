//! Graph builder (spec §4.4, C4).
//!
//! `build` is a DFS closure over the manifest's direct dependencies: fetch
//! metadata, resolve each child range to an exact version, insert the
//! node, recurse into each child with `direct = false`. Step 1's
//! memoization check (an identifier already present in the graph is
//! returned immediately, never re-fetched or re-recursed-into) is what
//! makes a cycle `A -> B -> A` terminate — it also means two paths
//! reaching the same `name@version` coexist as one node whose
//! `is_direct_dependency` flag is a monotonic OR (spec §9: "Direct" flag
//! as a sticky merge).

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;

use crate::cache::LruCache;
use crate::error::Result;
use crate::identifier;
use crate::registry::{PackageMetadata, RegistryClient};
use crate::resolver::resolve_cached;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNode {
    pub version: String,
    pub tarball_url: String,
    pub integrity: Option<String>,
    pub is_direct_dependency: bool,
    pub dependencies: Vec<String>,
}

pub type DependencyGraph = BTreeMap<String, PackageNode>;

pub struct GraphBuilder {
    client: RegistryClient,
    version_cache: LruCache<(String, String), String>,
    metadata_cache: LruCache<(String, String), PackageMetadata>,
}

impl GraphBuilder {
    pub fn new(client: RegistryClient, cache_capacity: usize) -> Self {
        Self {
            client,
            version_cache: LruCache::new(cache_capacity),
            metadata_cache: LruCache::new(cache_capacity),
        }
    }

    /// Resolve `(name, rangeOrTag)` to an exact version, then build the
    /// closure rooted at it as a direct dependency. This is the
    /// orchestrator's top-level entry point (spec §4.4, last paragraph).
    pub async fn build_direct(
        &mut self,
        name: &str,
        range_or_tag: &str,
        graph: &mut DependencyGraph,
    ) -> Result<String> {
        let exact = resolve_cached(&self.client, &mut self.version_cache, name, range_or_tag).await?;
        self.build(name, &exact, true, graph).await?;
        Ok(exact)
    }

    pub async fn build(
        &mut self,
        name: &str,
        exact_version: &str,
        direct: bool,
        graph: &mut DependencyGraph,
    ) -> Result<()> {
        self.build_inner(name.to_string(), exact_version.to_string(), direct, graph)
            .await
    }

    fn build_inner<'a>(
        &'a mut self,
        name: String,
        version: String,
        direct: bool,
        graph: &'a mut DependencyGraph,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + 'a>> {
        Box::pin(async move {
            let id = identifier::make(&name, &version);

            if let Some(existing) = graph.get_mut(&id) {
                existing.is_direct_dependency = existing.is_direct_dependency || direct;
                return Ok(());
            }

            let metadata = self.fetch_metadata(&name, &version).await?;

            let mut child_ids = Vec::with_capacity(metadata.dependencies.len());
            for (child_name, child_range) in &metadata.dependencies {
                let child_version =
                    resolve_cached(&self.client, &mut self.version_cache, child_name, child_range)
                        .await?;
                child_ids.push((child_name.clone(), child_version));
            }

            let dependencies = child_ids
                .iter()
                .map(|(n, v)| identifier::make(n, v))
                .collect();

            graph.insert(
                id,
                PackageNode {
                    version: metadata.version.clone(),
                    tarball_url: metadata.tarball_url().to_string(),
                    integrity: metadata.integrity().map(String::from),
                    is_direct_dependency: direct,
                    dependencies,
                },
            );

            for (child_name, child_version) in child_ids {
                self.build_inner(child_name, child_version, false, graph)
                    .await?;
            }

            Ok(())
        })
    }

    async fn fetch_metadata(&mut self, name: &str, version: &str) -> Result<PackageMetadata> {
        let key = (name.to_string(), version.to_string());
        if let Some(cached) = self.metadata_cache.get(&key) {
            return Ok(cached);
        }

        let metadata = self.client.fetch_version(name, version).await?;
        self.metadata_cache.insert(key, metadata.clone());
        Ok(metadata)
    }
}

/// Recompute a graph's closure from a given set of root identifiers,
/// purely by walking `dependencies` edges already present in `graph` — no
/// registry access, no re-resolution. Used after editing the manifest
/// (`uninstall`) to drop everything the surviving direct roots no longer
/// reach, while keeping any node a surviving root still depends on even if
/// its own name was among the ones removed (spec §3 invariant 1: closure).
/// `is_direct_dependency` on the returned graph is recomputed from
/// membership in `roots`, not copied from the input.
pub fn restrict_to_reachable(graph: &DependencyGraph, roots: &BTreeSet<String>) -> DependencyGraph {
    let mut reachable = BTreeSet::new();
    let mut stack: Vec<String> = roots.iter().cloned().collect();

    while let Some(id) = stack.pop() {
        if !reachable.insert(id.clone()) {
            continue;
        }
        if let Some(node) = graph.get(&id) {
            for child in &node.dependencies {
                if !reachable.contains(child) {
                    stack.push(child.clone());
                }
            }
        }
    }

    graph
        .iter()
        .filter(|(id, _)| reachable.contains(*id))
        .map(|(id, node)| {
            let mut node = node.clone();
            node.is_direct_dependency = roots.contains(id);
            (id.clone(), node)
        })
        .collect()
}
