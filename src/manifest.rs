//! Manifest (`package.json`) reading, and the `add` operation (spec §6).
//!
//! `install` only ever consumes the `dependencies` field (spec §3); `add`
//! is a trivial mutation of the same field that preserves every other key
//! in the document, mirroring the teacher's `update_package_json`.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, IoResultExt, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub dependencies: BTreeMap<String, String>,
}

pub fn read(path: &Path) -> Result<Manifest> {
    let data = std::fs::read_to_string(path)
        .map_err(|_| Error::ManifestMissing(path.display().to_string()))?;
    let json: Value =
        serde_json::from_str(&data).map_err(|_| Error::ManifestMissing(path.display().to_string()))?;

    let dependencies = json
        .get("dependencies")
        .and_then(|v| v.as_object())
        .map(|deps| {
            deps.iter()
                .filter_map(|(name, val)| val.as_str().map(|s| (name.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(Manifest { dependencies })
}

pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// Add (or overwrite) one `dependencies` entry, preserving every other
/// field in the manifest document and pretty-printing the result.
pub fn add_dependency(path: &Path, name: &str, range: &str) -> Result<()> {
    let data = std::fs::read_to_string(path).fs_err(path.display().to_string())?;
    let mut json: Value = serde_json::from_str(&data)?;

    let obj = json
        .as_object_mut()
        .ok_or_else(|| Error::ManifestMissing(path.display().to_string()))?;

    let deps = obj
        .entry("dependencies")
        .or_insert_with(|| Value::Object(serde_json::Map::new()));

    if let Value::Object(map) = deps {
        map.insert(name.to_string(), Value::String(range.to_string()));
    }

    let formatted = serde_json::to_string_pretty(&json)?;
    std::fs::write(path, formatted).fs_err(path.display().to_string())
}

/// Overwrite the whole `dependencies` object, preserving every other field
/// — used by `uninstall` after removing one or more entries.
pub fn write_dependencies(path: &Path, dependencies: &BTreeMap<String, String>) -> Result<()> {
    let data = std::fs::read_to_string(path).fs_err(path.display().to_string())?;
    let mut json: Value = serde_json::from_str(&data)?;

    let obj = json
        .as_object_mut()
        .ok_or_else(|| Error::ManifestMissing(path.display().to_string()))?;

    let map: serde_json::Map<String, Value> = dependencies
        .iter()
        .map(|(name, range)| (name.clone(), Value::String(range.clone())))
        .collect();
    obj.insert("dependencies".to_string(), Value::Object(map));

    let formatted = serde_json::to_string_pretty(&json)?;
    std::fs::write(path, formatted).fs_err(path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_dependencies_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(
            &path,
            r#"{"name":"x","version":"1.0.0","dependencies":{"lodash":"^4.0.0"}}"#,
        )
        .unwrap();

        let manifest = read(&path).unwrap();
        assert_eq!(manifest.dependencies.get("lodash"), Some(&"^4.0.0".to_string()));
    }

    #[test]
    fn missing_manifest_is_manifest_missing_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        let err = read(&path).unwrap_err();
        assert!(matches!(err, Error::ManifestMissing(_)));
    }

    #[test]
    fn add_dependency_preserves_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, r#"{"name":"x","version":"1.0.0"}"#).unwrap();

        add_dependency(&path, "lodash", "^4.17.0").unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["name"], "x");
        assert_eq!(written["dependencies"]["lodash"], "^4.17.0");
    }

    #[test]
    fn add_dependency_overwrites_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, r#"{"dependencies":{"lodash":"^3.0.0"}}"#).unwrap();

        add_dependency(&path, "lodash", "^4.0.0").unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["dependencies"]["lodash"], "^4.0.0");
    }

    #[test]
    fn write_dependencies_drops_removed_names_and_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(
            &path,
            r#"{"name":"x","dependencies":{"lodash":"^4.0.0","left-pad":"^1.0.0"}}"#,
        )
        .unwrap();

        let remaining = BTreeMap::from([("lodash".to_string(), "^4.0.0".to_string())]);
        write_dependencies(&path, &remaining).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["name"], "x");
        assert_eq!(written["dependencies"]["lodash"], "^4.0.0");
        assert!(written["dependencies"].get("left-pad").is_none());
    }
}
