//! Version resolver (spec §4.3, C3).
//!
//! Turns `(name, rangeOrTag)` into an exact registry version. `"latest"`
//! is handled as a dist-tag lookup, never as a range. Everything else goes
//! through [`VersionRange`], a thin wrapper over one or more
//! `semver::VersionReq` clauses that first normalizes npm's range grammar
//! (hyphen ranges, `x`/`*` wildcards, `||` unions, bare comparator lists)
//! into something `semver` understands — carried over from the teacher's
//! `NpmVersionReq`, which already implements exactly this grammar.

use semver::{Version, VersionReq};

use crate::cache::LruCache;
use crate::error::{Error, Result};
use crate::registry::{IndexDocument, RegistryClient};

#[derive(Debug, Clone)]
pub struct VersionRange {
    raw: String,
    clauses: Vec<VersionReq>,
}

impl VersionRange {
    pub fn parse(input: &str) -> Result<Self> {
        let raw = if input.trim().is_empty() {
            "*"
        } else {
            input.trim()
        }
        .to_string();

        let mut clauses = Vec::new();
        for clause in raw.split("||") {
            let normalized = normalize_clause(clause.trim());
            clauses.push(
                VersionReq::parse(&normalized)
                    .map_err(|e| Error::Resolution {
                        name: String::new(),
                        range: format!("{raw} ({e})"),
                    })?,
            );
        }

        if clauses.is_empty() {
            clauses.push(VersionReq::parse("*").unwrap());
        }

        Ok(Self { raw, clauses })
    }

    pub fn any() -> Self {
        Self {
            raw: "*".to_string(),
            clauses: vec![VersionReq::parse("*").unwrap()],
        }
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.clauses.iter().any(|req| req.matches(version))
    }

    pub fn display(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for VersionRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

fn normalize_clause(clause: &str) -> String {
    if clause.is_empty() || clause == "*" {
        return "*".to_string();
    }

    if let Some((start, end)) = clause.split_once(" - ") {
        return format!(">={}, <={}", start.trim(), end.trim());
    }

    if clause.contains('x') || clause.contains('X') || clause.contains('*') {
        return normalize_wildcard(clause);
    }

    let mut result = String::new();
    let mut last_was_operator = false;
    for token in clause.split_whitespace() {
        if token.starts_with('<') || token.starts_with('>') {
            if !result.is_empty() {
                result.push_str(", ");
            }
            result.push_str(token);
            last_was_operator = true;
        } else {
            if last_was_operator {
                result.push_str(token);
            } else {
                if !result.is_empty() {
                    result.push_str(", ");
                }
                result.push_str(token);
            }
            last_was_operator = false;
        }
    }

    if result.is_empty() { clause.to_string() } else { result }
}

fn normalize_wildcard(clause: &str) -> String {
    let trimmed = clause.trim();
    if trimmed == "*" || trimmed.eq_ignore_ascii_case("x") {
        return "*".to_string();
    }

    let parts: Vec<&str> = trimmed.split('.').collect();
    let major = parts.first().copied().unwrap_or("0");
    let minor = parts.get(1).copied().unwrap_or("x");
    let patch = parts.get(2).copied().unwrap_or("x");

    let is_wild = |v: &str| v == "*" || v.eq_ignore_ascii_case("x");

    if is_wild(major) {
        return "*".to_string();
    }

    if is_wild(minor) {
        let major_num = major.parse::<u64>().unwrap_or(0);
        return format!(">={}.0.0, <{}.0.0", major_num, major_num + 1);
    }

    let major_num = major.parse::<u64>().unwrap_or(0);
    let minor_num = minor.parse::<u64>().unwrap_or(0);

    if is_wild(patch) {
        return format!(
            ">={}.{}.0, <{}.{}.0",
            major_num,
            minor_num,
            major_num,
            minor_num + 1
        );
    }

    clause.to_string()
}

/// Resolve `(name, rangeOrTag)` against a freshly fetched index document.
/// The *input* `(name, rangeOrTag)` pair is the caller's memoization key
/// (spec §4.3), applied one layer up in [`resolve_cached`].
pub fn resolve_from_index(name: &str, range_or_tag: &str, index: &IndexDocument) -> Result<String> {
    if range_or_tag == "latest" {
        return index
            .dist_tags
            .get("latest")
            .cloned()
            .ok_or_else(|| Error::Resolution {
                name: name.to_string(),
                range: range_or_tag.to_string(),
            });
    }

    let range = VersionRange::parse(range_or_tag)?;
    let mut matching: Vec<Version> = index
        .versions
        .keys()
        .filter_map(|v| Version::parse(v).ok())
        .filter(|v| range.matches(v))
        .collect();

    matching.sort();
    matching
        .pop()
        .map(|v| v.to_string())
        .ok_or_else(|| Error::Resolution {
            name: name.to_string(),
            range: range_or_tag.to_string(),
        })
}

/// Resolve `(name, rangeOrTag)` to an exact version, memoizing on the
/// input pair (spec §4.3) and only hitting the registry on a cache miss.
pub async fn resolve_cached(
    client: &RegistryClient,
    cache: &mut LruCache<(String, String), String>,
    name: &str,
    range_or_tag: &str,
) -> Result<String> {
    let key = (name.to_string(), range_or_tag.to_string());
    if let Some(cached) = cache.get(&key) {
        return Ok(cached);
    }

    let index = client.fetch_index(name).await?;
    let resolved = resolve_from_index(name, range_or_tag, &index)?;
    cache.insert(key, resolved.clone());
    Ok(resolved)
}
