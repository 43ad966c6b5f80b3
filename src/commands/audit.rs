//! `audit` (SPEC_FULL.md §4): query the registry's bulk advisory endpoint
//! for every locked package and print a severity-bucketed summary,
//! unchanged in spirit from the teacher's `handle_audit_command_async`.

use std::collections::HashMap;

use crate::config::{self, Roots};
use crate::error::{Error, Result};
use crate::identifier;
use crate::lockstore;

pub async fn run(roots: &Roots) -> Result<()> {
    let installed = load_installed_versions(roots)?;
    if installed.is_empty() {
        println!("no installed dependencies found to audit");
        return Ok(());
    }

    let payload: HashMap<String, Vec<String>> = installed
        .into_iter()
        .map(|(name, version)| (name, vec![version]))
        .collect();

    let url = format!("{}/-/npm/v1/security/advisories/bulk", config::REGISTRY_BASE_URL);
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .json(&payload)
        .send()
        .await
        .map_err(|e| Error::transport(&url, e))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        return Err(Error::transport_status(url, status, "advisory request failed"));
    }

    let advisories: serde_json::Value =
        response.json().await.map_err(|e| Error::transport(&url, e))?;
    let Some(map) = advisories.as_object() else {
        println!("no advisories found");
        return Ok(());
    };

    if map.is_empty() {
        println!("no known vulnerabilities found");
        return Ok(());
    }

    let mut counts = HashMap::<&str, usize>::new();
    println!("security advisories detected:\n");
    for (package, entries) in map {
        let Some(list) = entries.as_array() else { continue };
        for advisory in list {
            let title = advisory.get("title").and_then(|v| v.as_str()).unwrap_or("unknown advisory");
            let severity = advisory.get("severity").and_then(|v| v.as_str()).unwrap_or("unknown");
            let url = advisory.get("url").and_then(|v| v.as_str()).unwrap_or("n/a");
            *counts.entry(severity).or_insert(0) += 1;

            println!("- {package} [{severity}]");
            println!("  {title}");
            println!("  {url}");
        }
    }

    let total: usize = counts.values().sum();
    println!("\nsummary:");
    println!("- total: {total}");
    for severity in ["critical", "high", "moderate", "low"] {
        println!("- {severity}: {}", counts.get(severity).copied().unwrap_or(0));
    }

    Ok(())
}

fn load_installed_versions(roots: &Roots) -> Result<HashMap<String, String>> {
    if let Some(graph) = lockstore::read(&roots.lockfile_path())? {
        return Ok(graph
            .keys()
            .filter_map(|id| identifier::parse(id))
            .map(|(name, version)| (name.to_string(), version.to_string()))
            .collect());
    }

    Ok(HashMap::new())
}
