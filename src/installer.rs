//! Installer (spec §4.7, C8).
//!
//! Walks a closed [`DependencyGraph`] in post-order — every dependency
//! extracted before its dependent, so a lifecycle script never runs before
//! the packages it might `require` exist on disk — prepares each package's
//! directory, fetches-or-reads its tarball, verifies it against
//! `integrity`, extracts it stripping the tarball's leading `package/`
//! path component, and records the identifier in an `installed` memo set.
//! The recursion mirrors [`crate::graph::GraphBuilder`]'s `Box::pin`
//! pattern for the same reason: post-order walk needs to recurse from
//! inside an `async fn`.
//!
//! Platform constraints, `.bin` symlinks, and lifecycle scripts are read
//! from a second round-trip to the registry metadata (memoized in their
//! own LRU, independent of the graph builder's) rather than carried on
//! [`crate::graph::PackageNode`] — `PackageNode` stays exactly the shape
//! spec §3 names, and these extras are supplemented, install-time-only
//! concerns (SPEC_FULL.md §4), mirroring how the teacher's `PackageInfo`
//! keeps this data around for its own install step.

use std::collections::HashSet;
use std::fs;
use std::future::Future;
use std::io::Cursor;
use std::path::Path;
use std::pin::Pin;
use std::process::{Command, Stdio};

use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cache::LruCache;
use crate::config;
use crate::content_cache::ContentCache;
use crate::error::{Error, IoResultExt, Result};
use crate::graph::DependencyGraph;
use crate::identifier;
use crate::integrity::{self, Verdict};
use crate::registry::{PackageMetadata, RegistryClient};
use crate::reporter::Reporter;

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    pub ignore_scripts: bool,
}

pub struct Installer<'a> {
    client: &'a RegistryClient,
    content_cache: &'a ContentCache,
    module_root: &'a Path,
    reporter: &'a Reporter,
    options: InstallOptions,
    metadata_cache: LruCache<(String, String), PackageMetadata>,
    progress: Option<ProgressBar>,
}

impl<'a> Installer<'a> {
    pub fn new(
        client: &'a RegistryClient,
        content_cache: &'a ContentCache,
        module_root: &'a Path,
        reporter: &'a Reporter,
        options: InstallOptions,
    ) -> Self {
        Self {
            client,
            content_cache,
            module_root,
            reporter,
            options,
            metadata_cache: LruCache::new(config::METADATA_CACHE_CAPACITY),
            progress: None,
        }
    }

    /// Show a progress bar while installing, same UX as the teacher's
    /// parallel-install bar — suppressed in `--quiet` mode.
    pub fn with_progress(mut self, total: u64) -> Self {
        if total == 0 {
            return self;
        }
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        self.progress = Some(bar);
        self
    }

    /// Install every node in `graph`, post-order. Returns the number of
    /// packages actually extracted this run.
    pub async fn install_graph(&mut self, graph: &DependencyGraph) -> Result<usize> {
        let mut installed = HashSet::new();
        for id in graph.keys() {
            self.install_node(id, graph, &mut installed).await?;
        }
        if let Some(bar) = &self.progress {
            bar.finish_with_message("done");
        }
        Ok(installed.len())
    }

    fn install_node<'b>(
        &'b mut self,
        id: &'b str,
        graph: &'b DependencyGraph,
        installed: &'b mut HashSet<String>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + 'b>> {
        Box::pin(async move {
            if installed.contains(id) {
                return Ok(());
            }

            let node = graph
                .get(id)
                .expect("closure invariant: every dependency id resolves to a node");

            for child in &node.dependencies {
                self.install_node(child, graph, installed).await?;
            }

            let (name, version) = identifier::parse(id)
                .unwrap_or_else(|| panic!("malformed identifier in graph: {id}"));

            let package_dir = self.module_root.join(name);
            fs::create_dir_all(&package_dir).fs_err(package_dir.display().to_string())?;

            let cached = self.content_cache.read(name, version)?;
            let (bytes, from_cache) = match cached {
                Some(data) => (data, true),
                None => {
                    self.reporter.debug(&format!("downloading {id}"));
                    let data = self.client.download_tarball(&node.tarball_url).await?;
                    (data, false)
                }
            };

            let Some(expected) = node.integrity.as_deref() else {
                return Err(Error::Integrity { id: id.to_string() });
            };

            match integrity::verify_integrity(&bytes, expected) {
                Verdict::Verified => {}
                Verdict::Mismatch | Verdict::UnknownAlgorithm => {
                    if from_cache {
                        self.content_cache.invalidate(name, version)?;
                    }
                    return Err(Error::Integrity { id: id.to_string() });
                }
            }

            if !from_cache {
                self.content_cache.write(name, version, &bytes)?;
            }

            extract_tarball(&bytes, &package_dir)
                .map_err(|e| Error::Extraction { id: id.to_string(), reason: e.to_string() })?;

            // bin links, lifecycle scripts, and platform constraints are
            // install-time extras (SPEC_FULL.md §4) derived from a second
            // metadata round-trip, only worth paying for on a tarball that
            // was actually just downloaded. A cache hit means this node was
            // already fully installed — extras included — by whichever run
            // first wrote it to the content cache; re-fetching metadata for
            // it here would cost one registry GET per package on every
            // reconciled reinstall, which breaks the "zero HTTP requests"
            // idempotence guarantee (spec §8, S2).
            if !from_cache {
                match self.fetch_metadata(name, version).await {
                    Ok(metadata) => {
                        validate_platform_constraints(name, &metadata, self.reporter);
                        create_bin_links(name, &metadata, &package_dir, self.module_root)?;
                        run_lifecycle_scripts(name, &metadata, &package_dir, self.options, self.reporter)?;
                    }
                    Err(e) => {
                        self.reporter.warn(&format!("could not refresh metadata for {id}: {e}"));
                    }
                }
            }

            installed.insert(id.to_string());
            if let Some(bar) = &self.progress {
                bar.inc(1);
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

/// Unpack a `.tar.gz` into `dest`, stripping the tarball's leading
/// `package/` (or whatever single top-level directory it uses) path
/// component, same as the teacher's extraction loop.
fn extract_tarball(bytes: &[u8], dest: &Path) -> std::io::Result<()> {
    let tar = GzDecoder::new(Cursor::new(bytes));
    let mut archive = tar::Archive::new(tar);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        let mut components = path.components();
        components.next();
        let relative_path = components.as_path();
        if relative_path.as_os_str().is_empty() {
            continue;
        }

        let dest_path = dest.join(relative_path);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(dest_path)?;
    }

    Ok(())
}

fn current_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

fn current_cpu() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x64",
        "x86" => "ia32",
        "aarch64" => "arm64",
        other => other,
    }
}

fn constraint_allows_current(constraints: &[String], current: &str) -> bool {
    if constraints.is_empty() {
        return true;
    }

    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for rule in constraints {
        match rule.strip_prefix('!') {
            Some(excluded) => negative.push(excluded),
            None => positive.push(rule.as_str()),
        }
    }

    if negative.iter().any(|item| *item == current) {
        return false;
    }

    positive.is_empty() || positive.iter().any(|item| *item == current)
}

/// Platform constraints are reported as warnings, never resolution
/// failures (SPEC_FULL.md §4) — there is no sandboxed install target to
/// fail against, only the host the tool happens to run on.
fn validate_platform_constraints(name: &str, metadata: &PackageMetadata, reporter: &Reporter) {
    let os = current_os();
    if !constraint_allows_current(&metadata.os, os) {
        reporter.warn(&format!(
            "{name} is not declared to support os '{os}': {:?}",
            metadata.os
        ));
    }

    let cpu = current_cpu();
    if !constraint_allows_current(&metadata.cpu, cpu) {
        reporter.warn(&format!(
            "{name} is not declared to support cpu '{cpu}': {:?}",
            metadata.cpu
        ));
    }

    if let Some(engines) = &metadata.engines
        && let Some(node_req) = &engines.node
        && let Ok(req) = crate::resolver::VersionRange::parse(node_req)
        && let Ok(current) = std::env::var("REGPM_NODE_VERSION")
        && let Ok(version) = semver::Version::parse(&current)
        && !req.matches(&version)
    {
        reporter.warn(&format!("{name} requires node '{node_req}', current is {version}"));
    }
}

/// Materialize `bin` entries from `metadata` as symlinks under
/// `module_root/.bin`, mirroring the teacher's `create_bin_links`.
fn create_bin_links(
    name: &str,
    metadata: &PackageMetadata,
    package_dir: &Path,
    module_root: &Path,
) -> Result<()> {
    let entries = bin_entries(name, metadata);
    if entries.is_empty() {
        return Ok(());
    }

    let bin_dir = module_root.join(".bin");
    fs::create_dir_all(&bin_dir).fs_err(bin_dir.display().to_string())?;

    for (bin_name, rel_path) in entries {
        let src = package_dir.join(&rel_path);
        let dst = bin_dir.join(&bin_name);

        if dst.exists() || dst.symlink_metadata().is_ok() {
            fs::remove_file(&dst).fs_err(dst.display().to_string())?;
        }

        link_bin(&src, &dst).fs_err(dst.display().to_string())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(meta) = fs::metadata(&src) {
                let mut perms = meta.permissions();
                perms.set_mode(0o755);
                let _ = fs::set_permissions(&src, perms);
            }
        }
    }

    Ok(())
}

#[cfg(unix)]
fn link_bin(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn link_bin(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

fn bin_entries(name: &str, metadata: &PackageMetadata) -> Vec<(String, String)> {
    match &metadata.bin {
        Some(serde_json::Value::String(path)) => {
            let bin_name = identifier::scope_of(name).map_or(name, |scope| {
                name.strip_prefix(scope).and_then(|s| s.strip_prefix('/')).unwrap_or(name)
            });
            vec![(bin_name.to_string(), path.clone())]
        }
        Some(serde_json::Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        _ => Vec::new(),
    }
}

/// Run `preinstall`/`install`/`postinstall` in order via a shell
/// subprocess, same as the teacher's `run_lifecycle_scripts`. No
/// sandboxing: an install script is an opaque external collaborator
/// exactly like the untar step (spec.md's explicit non-goal).
fn run_lifecycle_scripts(
    name: &str,
    metadata: &PackageMetadata,
    package_dir: &Path,
    options: InstallOptions,
    reporter: &Reporter,
) -> Result<()> {
    if options.ignore_scripts || metadata.scripts.is_empty() {
        return Ok(());
    }

    for script_name in ["preinstall", "install", "postinstall"] {
        let Some(command) = metadata.scripts.get(script_name) else {
            continue;
        };

        reporter.debug(&format!("running {script_name} for {name}"));

        #[cfg(unix)]
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(package_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .fs_err(package_dir.display().to_string())?;

        #[cfg(windows)]
        let status = Command::new("cmd")
            .arg("/C")
            .arg(command)
            .current_dir(package_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .fs_err(package_dir.display().to_string())?;

        if !status.success() {
            return Err(Error::Script(format!("{name} {script_name}"), status));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_entries_bare_string_defaults_to_package_name() {
        let mut metadata = sample_metadata();
        metadata.bin = Some(serde_json::Value::String("./cli.js".to_string()));
        let entries = bin_entries("left-pad", &metadata);
        assert_eq!(entries, vec![("left-pad".to_string(), "./cli.js".to_string())]);
    }

    #[test]
    fn bin_entries_scoped_string_strips_scope() {
        let mut metadata = sample_metadata();
        metadata.bin = Some(serde_json::Value::String("./cli.js".to_string()));
        let entries = bin_entries("@scope/tool", &metadata);
        assert_eq!(entries, vec![("tool".to_string(), "./cli.js".to_string())]);
    }

    #[test]
    fn bin_entries_object_form_lists_every_command() {
        let mut metadata = sample_metadata();
        metadata.bin = Some(serde_json::json!({"a": "./a.js", "b": "./b.js"}));
        let mut entries = bin_entries("multi", &metadata);
        entries.sort();
        assert_eq!(
            entries,
            vec![("a".to_string(), "./a.js".to_string()), ("b".to_string(), "./b.js".to_string())]
        );
    }

    #[test]
    fn constraint_allows_empty_list() {
        assert!(constraint_allows_current(&[], "linux"));
    }

    #[test]
    fn constraint_rejects_negated_current() {
        let constraints = vec!["!win32".to_string()];
        assert!(!constraint_allows_current(&constraints, "win32"));
        assert!(constraint_allows_current(&constraints, "linux"));
    }

    #[test]
    fn constraint_allows_listed_positive() {
        let constraints = vec!["linux".to_string(), "darwin".to_string()];
        assert!(constraint_allows_current(&constraints, "linux"));
        assert!(!constraint_allows_current(&constraints, "win32"));
    }

    fn sample_metadata() -> PackageMetadata {
        serde_json::from_value(serde_json::json!({
            "version": "1.0.0",
            "dist": {"tarball": "https://example.test/p-1.0.0.tgz", "integrity": "sha512-aaaa"},
        }))
        .unwrap()
    }
}
