//! Lock store (spec §4.5 / §6, C6).
//!
//! Serializes/deserializes the full [`DependencyGraph`] as pretty-printed
//! (2-space indent), UTF-8 JSON. Shape: `{"<id>": {"version","tarballUrl",
//! "hash","isDirectDependency","dependencies":[...]}}` — field name
//! `hash` carries the `<algo>-<b64>` integrity string per spec §6's note
//! that implementations may alias `integrity` as long as the round-trip
//! is faithful. [`DependencyGraph`] being a `BTreeMap` keyed by identifier
//! gives deterministic (lexicographic) key order for free, which is what
//! makes the idempotence property in spec §8 ("no new lock bytes") hold
//! without any extra canonicalization step.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result};
use crate::graph::{DependencyGraph, PackageNode};

#[derive(Debug, Serialize, Deserialize)]
struct LockEntry {
    version: String,
    #[serde(rename = "tarballUrl")]
    tarball_url: String,
    #[serde(rename = "hash", skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
    #[serde(rename = "isDirectDependency")]
    is_direct_dependency: bool,
    dependencies: Vec<String>,
}

impl From<&PackageNode> for LockEntry {
    fn from(node: &PackageNode) -> Self {
        Self {
            version: node.version.clone(),
            tarball_url: node.tarball_url.clone(),
            hash: node.integrity.clone(),
            is_direct_dependency: node.is_direct_dependency,
            dependencies: node.dependencies.clone(),
        }
    }
}

impl From<LockEntry> for PackageNode {
    fn from(entry: LockEntry) -> Self {
        Self {
            version: entry.version,
            tarball_url: entry.tarball_url,
            integrity: entry.hash,
            is_direct_dependency: entry.is_direct_dependency,
            dependencies: entry.dependencies,
        }
    }
}

pub fn serialize(graph: &DependencyGraph) -> Result<String> {
    let entries: BTreeMap<&String, LockEntry> =
        graph.iter().map(|(id, node)| (id, node.into())).collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

pub fn deserialize(data: &str) -> Result<DependencyGraph> {
    let entries: BTreeMap<String, LockEntry> = serde_json::from_str(data)?;
    Ok(entries
        .into_iter()
        .map(|(id, entry)| (id, entry.into()))
        .collect())
}

/// Write the graph to `path`. Called only after every node in the graph
/// has been successfully installed (spec §4.9 step 5 / §5 ordering
/// guarantee iii) — a failed run never produces a misleading lock file.
pub fn write(path: &Path, graph: &DependencyGraph) -> Result<()> {
    let serialized = serialize(graph)?;
    std::fs::write(path, serialized).fs_err(path.display().to_string())
}

/// Read the lock file at `path`, or `None` if it doesn't exist.
pub fn read(path: &Path) -> Result<Option<DependencyGraph>> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(Some(deserialize(&data)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).fs_err(path.display().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.insert(
            "is-thirteen@2.0.0".to_string(),
            PackageNode {
                version: "2.0.0".to_string(),
                tarball_url: "https://registry.npmjs.org/is-thirteen/-/is-thirteen-2.0.0.tgz"
                    .to_string(),
                integrity: Some("sha512-abcd==".to_string()),
                is_direct_dependency: true,
                dependencies: vec![],
            },
        );
        graph
    }

    #[test]
    fn serialize_uses_hash_field_name() {
        let graph = sample_graph();
        let json = serialize(&graph).unwrap();
        assert!(json.contains("\"hash\""));
        assert!(json.contains("\"tarballUrl\""));
        assert!(json.contains("\"isDirectDependency\": true"));
        assert!(!json.contains("\"integrity\""));
    }

    #[test]
    fn round_trips_through_serialize_and_deserialize() {
        let graph = sample_graph();
        let json = serialize(&graph).unwrap();
        let parsed = deserialize(&json).unwrap();
        assert_eq!(parsed, graph);
    }

    #[test]
    fn pretty_printed_with_two_space_indent() {
        let graph = sample_graph();
        let json = serialize(&graph).unwrap();
        assert!(json.lines().any(|l| l.starts_with("  \"")));
    }

    #[test]
    fn read_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package-lock.json");
        assert!(read(&path).unwrap().is_none());
    }

    #[test]
    fn write_then_read_roundtrips_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package-lock.json");
        let graph = sample_graph();
        write(&path, &graph).unwrap();
        assert_eq!(read(&path).unwrap().unwrap(), graph);
    }
}
