//! Registry client (spec §4.1, C1).
//!
//! Two endpoints, both returning parsed JSON:
//! `GET {base}/{name}` (the package index: dist-tags + every published
//! version) and `GET {base}/{name}/{exactVersion}` (one version's full
//! metadata). No caching and no retry live here — that's delegated to
//! [`crate::cache`] and the install pipeline aborts on the first
//! unrecoverable error (spec §4.1).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub struct RegistryClient {
    base_url: String,
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn fetch_index(&self, name: &str) -> Result<IndexDocument> {
        let url = format!("{}/{}", self.base_url, encode_name(name));
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::transport(&url, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let reason = response
                .status()
                .canonical_reason()
                .unwrap_or("unknown")
                .to_string();
            return Err(Error::transport_status(url, status, reason));
        }

        response
            .json::<IndexDocument>()
            .await
            .map_err(|e| Error::transport(&url, e))
    }

    pub async fn fetch_version(&self, name: &str, version: &str) -> Result<PackageMetadata> {
        let url = format!("{}/{}/{}", self.base_url, encode_name(name), version);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::transport(&url, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let reason = response
                .status()
                .canonical_reason()
                .unwrap_or("unknown")
                .to_string();
            return Err(Error::transport_status(url, status, reason));
        }

        response
            .json::<PackageMetadata>()
            .await
            .map_err(|e| Error::transport(&url, e))
    }

    pub async fn download_tarball(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(url, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let reason = response
                .status()
                .canonical_reason()
                .unwrap_or("unknown")
                .to_string();
            return Err(Error::transport_status(url, status, reason));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| Error::transport(url, e))
    }
}

fn encode_name(name: &str) -> String {
    name.replacen('/', "%2f", 1)
}

/// `GET {base}/{name}` response: dist-tags plus every published version.
#[derive(Debug, Deserialize)]
pub struct IndexDocument {
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: HashMap<String, String>,
    #[serde(default)]
    pub versions: HashMap<String, serde_json::Value>,
}

/// `GET {base}/{name}/{exactVersion}` response, trimmed to what the graph
/// builder needs (spec §3) plus the install-time extras the teacher and
/// `otter-pm` both already read off the same document (bin entries,
/// lifecycle scripts, platform constraints — see SPEC_FULL.md §4).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PackageMetadata {
    pub version: String,
    #[serde(rename = "dist")]
    pub dist: Dist,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(rename = "peerDependencies", default)]
    pub peer_dependencies: BTreeMap<String, String>,
    #[serde(rename = "optionalDependencies", default)]
    pub optional_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub engines: Option<Engines>,
    #[serde(default)]
    pub os: Vec<String>,
    #[serde(default)]
    pub cpu: Vec<String>,
    #[serde(default)]
    pub bin: Option<serde_json::Value>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl PackageMetadata {
    pub fn tarball_url(&self) -> &str {
        &self.dist.tarball
    }

    pub fn integrity(&self) -> Option<&str> {
        self.dist.integrity.as_deref()
    }

    pub fn shasum(&self) -> Option<&str> {
        self.dist.shasum.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Dist {
    pub tarball: String,
    #[serde(default)]
    pub integrity: Option<String>,
    #[serde(default)]
    pub shasum: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Engines {
    #[serde(default)]
    pub node: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_scoped_name_for_url() {
        assert_eq!(encode_name("lodash"), "lodash");
        assert_eq!(encode_name("@scope/x"), "@scope%2fx");
        assert_eq!(encode_name("@types/node"), "@types%2fnode");
    }

    #[test]
    fn parses_index_document() {
        let json = r#"{
            "dist-tags": {"latest": "2.0.0"},
            "versions": {"1.0.0": {}, "2.0.0": {}}
        }"#;
        let doc: IndexDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.dist_tags.get("latest"), Some(&"2.0.0".to_string()));
        assert_eq!(doc.versions.len(), 2);
    }

    #[test]
    fn parses_version_metadata() {
        let json = r#"{
            "version": "2.0.0",
            "dist": {"tarball": "https://registry.npmjs.org/p/-/p-2.0.0.tgz", "integrity": "sha512-abc=="},
            "dependencies": {"left-pad": "^1.0.0"}
        }"#;
        let meta: PackageMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.version, "2.0.0");
        assert_eq!(meta.tarball_url(), "https://registry.npmjs.org/p/-/p-2.0.0.tgz");
        assert_eq!(meta.integrity(), Some("sha512-abc=="));
        assert_eq!(meta.dependencies.get("left-pad"), Some(&"^1.0.0".to_string()));
    }
}
