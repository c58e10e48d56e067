//! Remote registry manifests: discoverable server packages.

use anyhow::{Context, Result};
use mcpd_core::normalize_name;
use serde::{Deserialize, Serialize};

use crate::entry::ServerEntry;

/// One installable server as advertised by a registry manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub package: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl RegistryEntry {
    /// Seed a static config entry from this manifest record.
    pub fn to_server_entry(&self) -> ServerEntry {
        ServerEntry {
            name: normalize_name(&self.name),
            package: self.package.clone(),
            tools: self.tools.clone(),
            ..ServerEntry::default()
        }
    }
}

/// A parsed registry manifest (JSON body, typically cache-served).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryManifest {
    #[serde(default)]
    pub servers: Vec<RegistryEntry>,
}

impl RegistryManifest {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).context("failed to parse registry manifest")
    }

    /// Case-insensitive substring match over names and descriptions.
    pub fn search(&self, query: &str) -> Vec<&RegistryEntry> {
        let needle = normalize_name(query);
        self.servers
            .iter()
            .filter(|entry| {
                normalize_name(&entry.name).contains(&needle)
                    || entry
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_ascii_lowercase().contains(&needle))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::RegistryManifest;

    const MANIFEST: &str = r#"{
        "servers": [
            {"name": "time", "package": "uvx::mcp-server-time@latest",
             "description": "Clock and timezone tools", "tools": ["get_current_time"]},
            {"name": "fetch", "package": "npx::@mcp/fetch@1.2.0",
             "description": "HTTP fetching", "tools": ["fetch"]}
        ]
    }"#;

    #[test]
    fn parse_and_search_by_name() {
        let manifest = RegistryManifest::parse(MANIFEST).unwrap();
        let hits = manifest.search("TIME");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "time");
    }

    #[test]
    fn search_matches_description() {
        let manifest = RegistryManifest::parse(MANIFEST).unwrap();
        let hits = manifest.search("http");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "fetch");
    }

    #[test]
    fn manifest_entry_seeds_a_server_entry() {
        let manifest = RegistryManifest::parse(MANIFEST).unwrap();
        let entry = manifest.servers[0].to_server_entry();
        assert_eq!(entry.name, "time");
        assert_eq!(entry.package, "uvx::mcp-server-time@latest");
        assert_eq!(entry.tools, vec!["get_current_time"]);
    }

    #[test]
    fn malformed_manifest_fails() {
        assert!(RegistryManifest::parse("not json").is_err());
    }
}
