//! TOML document loaders and the entry ∪ context composition.

use anyhow::{Context, Result};
use mcpd_core::normalize_name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::ExecutionContext;
use crate::entry::ServerEntry;
use crate::runtime::RuntimeServer;

/// Static server catalogue (`config.toml`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticConfig {
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

impl StaticConfig {
    /// Load from an explicit path. A missing file is an empty catalogue.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse config: {}", path.display()))
    }

    pub fn list_servers(&self) -> Vec<String> {
        self.servers.iter().map(|s| normalize_name(&s.name)).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ServerEntry> {
        let wanted = normalize_name(name);
        self.servers.iter().find(|s| normalize_name(&s.name) == wanted)
    }

    /// Replace the entry with the same normalized name, or append.
    pub fn upsert(&mut self, entry: ServerEntry) {
        let wanted = normalize_name(&entry.name);
        match self
            .servers
            .iter_mut()
            .find(|s| normalize_name(&s.name) == wanted)
        {
            Some(existing) => *existing = entry,
            None => self.servers.push(entry),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_toml(path, self)
    }
}

/// Execution contexts keyed by server name (`secrets.toml`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretsConfig {
    #[serde(default)]
    pub servers: HashMap<String, ExecutionContext>,
}

impl SecretsConfig {
    /// Load from an explicit path. A missing file means no contexts.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read secrets: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse secrets: {}", path.display()))
    }

    pub fn get(&self, name: &str) -> Option<&ExecutionContext> {
        let wanted = normalize_name(name);
        self.servers
            .iter()
            .find(|(key, _)| normalize_name(key) == wanted)
            .map(|(_, context)| context)
    }

    pub fn upsert(&mut self, name: &str, context: ExecutionContext) {
        let wanted = normalize_name(name);
        self.servers.retain(|key, _| normalize_name(key) != wanted);
        self.servers.insert(wanted, context);
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_toml(path, self)
    }
}

/// Merge the static catalogue with its secrets: one [`RuntimeServer`] per
/// entry, using an empty execution context when the secrets file has none.
pub fn compose(config: &StaticConfig, secrets: &SecretsConfig) -> Vec<RuntimeServer> {
    config
        .servers
        .iter()
        .map(|entry| {
            let context = secrets.get(&entry.name).cloned().unwrap_or_default();
            RuntimeServer::new(entry.clone(), context)
        })
        .collect()
}

/// `~/.config/mcpd/config.toml` (platform-dependent via `directories`).
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// `~/.config/mcpd/secrets.toml`.
pub fn default_secrets_path() -> PathBuf {
    config_dir().join("secrets.toml")
}

/// Platform cache directory for downloaded registry manifests.
pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "mcpd")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".mcpd-cache"))
}

fn config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "mcpd")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".mcpd"))
}

fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory: {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(value).context("failed to serialize config document")?;

    // Atomic write: write to temp file then rename.
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, content.as_bytes())
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{SecretsConfig, StaticConfig, compose};
    use crate::context::ExecutionContext;
    use crate::entry::ServerEntry;

    fn entry(name: &str) -> ServerEntry {
        ServerEntry {
            name: name.to_string(),
            package: "uvx::pkg@latest".to_string(),
            tools: vec!["tool".to_string()],
            ..ServerEntry::default()
        }
    }

    #[test]
    fn load_missing_config_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = StaticConfig::load(&dir.path().join("config.toml")).unwrap();
        assert!(config.servers.is_empty());
    }

    #[test]
    fn config_round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = StaticConfig::default();
        config.upsert(entry("time"));
        config.save(&path).unwrap();

        let loaded = StaticConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn upsert_replaces_by_normalized_name() {
        let mut config = StaticConfig::default();
        config.upsert(entry("Time"));
        let mut replacement = entry("time");
        replacement.tools = vec!["other".to_string()];
        config.upsert(replacement);

        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.get(" TIME ").unwrap().tools, vec!["other"]);
    }

    #[test]
    fn secrets_lookup_is_case_insensitive() {
        let mut secrets = SecretsConfig::default();
        secrets.upsert(
            "Time",
            ExecutionContext {
                args: vec!["--utc".to_string()],
                ..ExecutionContext::default()
            },
        );
        assert_eq!(secrets.get("TIME").unwrap().args, vec!["--utc"]);
    }

    #[test]
    fn compose_pairs_entries_with_contexts() {
        let mut config = StaticConfig::default();
        config.upsert(entry("time"));
        config.upsert(entry("fs"));

        let mut secrets = SecretsConfig::default();
        secrets.upsert(
            "time",
            ExecutionContext {
                args: vec!["--utc".to_string()],
                ..ExecutionContext::default()
            },
        );

        let servers = compose(&config, &secrets);
        assert_eq!(servers.len(), 2);
        let time = servers.iter().find(|s| s.name() == "time").unwrap();
        assert_eq!(time.context.args, vec!["--utc"]);
        let fs = servers.iter().find(|s| s.name() == "fs").unwrap();
        assert!(fs.context.args.is_empty());
    }

    #[test]
    fn parse_invalid_toml_fails_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[[servers]").unwrap();
        let err = StaticConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }
}
