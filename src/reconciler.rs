//! Lock reconciler (spec §4.6, C7).
//!
//! Decides whether the manifest's direct dependencies are still satisfied
//! by the locked graph, without revalidating anything transitive against
//! the registry — transitive nodes are trusted because they came from a
//! prior successful build (spec §9, "direct-only reconciliation" open
//! question, accepted as-is).

use std::collections::BTreeMap;

use semver::Version;

use crate::graph::DependencyGraph;
use crate::resolver::VersionRange;

/// The manifest's direct dependencies still match `locked` iff every
/// manifest name has a corresponding direct node whose version satisfies
/// the requested range, and no direct node names a package the manifest
/// no longer declares.
pub fn reconcile(manifest: &BTreeMap<String, String>, locked: &DependencyGraph) -> bool {
    let direct: BTreeMap<&str, &str> = locked
        .iter()
        .filter(|(_, node)| node.is_direct_dependency)
        .filter_map(|(id, node)| {
            crate::identifier::parse(id).map(|(name, _)| (name, node.version.as_str()))
        })
        .collect();

    for (name, range) in manifest {
        let Some(locked_version) = direct.get(name.as_str()) else {
            return false;
        };

        let Ok(version) = Version::parse(locked_version) else {
            return false;
        };

        let Ok(req) = VersionRange::parse(range) else {
            return false;
        };

        if !req.matches(&version) {
            return false;
        }
    }

    for name in direct.keys() {
        if !manifest.contains_key(*name) {
            return false;
        }
    }

    true
}

/// `Unchanged` means the installer can run directly against `locked`
/// without rebuilding the graph (spec §4.9 step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Unchanged,
    Changed,
}

pub fn verdict(manifest: &BTreeMap<String, String>, locked: &DependencyGraph) -> Verdict {
    if reconcile(manifest, locked) {
        Verdict::Unchanged
    } else {
        Verdict::Changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PackageNode;

    fn direct_node(version: &str) -> PackageNode {
        PackageNode {
            version: version.to_string(),
            tarball_url: String::new(),
            integrity: None,
            is_direct_dependency: true,
            dependencies: vec![],
        }
    }

    fn transitive_node(version: &str) -> PackageNode {
        let mut n = direct_node(version);
        n.is_direct_dependency = false;
        n
    }

    #[test]
    fn unchanged_when_direct_set_and_ranges_match() {
        let mut graph = DependencyGraph::new();
        graph.insert("lodash@4.17.21".to_string(), direct_node("4.17.21"));
        let manifest = BTreeMap::from([("lodash".to_string(), "^4.17.0".to_string())]);

        assert_eq!(verdict(&manifest, &graph), Verdict::Unchanged);
    }

    #[test]
    fn changed_when_manifest_adds_a_name() {
        let graph = DependencyGraph::new();
        let manifest = BTreeMap::from([("lodash".to_string(), "^4.17.0".to_string())]);
        assert_eq!(verdict(&manifest, &graph), Verdict::Changed);
    }

    #[test]
    fn changed_when_manifest_drops_a_direct_name() {
        let mut graph = DependencyGraph::new();
        graph.insert("lodash@4.17.21".to_string(), direct_node("4.17.21"));
        let manifest = BTreeMap::new();
        assert_eq!(verdict(&manifest, &graph), Verdict::Changed);
    }

    #[test]
    fn changed_when_range_no_longer_satisfied() {
        let mut graph = DependencyGraph::new();
        graph.insert("lodash@4.17.21".to_string(), direct_node("4.17.21"));
        let manifest = BTreeMap::from([("lodash".to_string(), "^5.0.0".to_string())]);
        assert_eq!(verdict(&manifest, &graph), Verdict::Changed);
    }

    #[test]
    fn transitive_nodes_are_not_revalidated() {
        let mut graph = DependencyGraph::new();
        graph.insert("lodash@4.17.21".to_string(), direct_node("4.17.21"));
        graph.insert("yallist@4.0.0".to_string(), transitive_node("4.0.0"));
        let manifest = BTreeMap::from([("lodash".to_string(), "^4.17.0".to_string())]);

        assert_eq!(verdict(&manifest, &graph), Verdict::Unchanged);
    }
}
