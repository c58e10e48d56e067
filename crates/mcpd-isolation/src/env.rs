//! Environment, argument, and volume-source filtering for one server.

use std::collections::{BTreeMap, HashMap};

use mcpd_core::env_segment;

use crate::expand::expand_once;
use crate::reference::contains_illegal_reference;
use crate::{APP_PREFIX, SERVER_PREFIX};

/// Filter bound to one server's namespace.
///
/// Produces the environment a child process may see, in two flavors: the
/// default parent-inheriting surface, and an isolated surface carrying only
/// the server's own configured variables (used for containerized runners
/// that must not see the host environment).
#[derive(Debug, Clone)]
pub struct EnvFilter {
    own_prefix: String,
}

impl EnvFilter {
    pub fn for_server(server_name: &str) -> Self {
        Self {
            own_prefix: format!("{SERVER_PREFIX}{}__", env_segment(server_name)),
        }
    }

    /// Merged `parent ∪ own` environment (own wins), filtered, expanded
    /// once, and sorted lexicographically by key.
    pub fn inherited_env(
        &self,
        parent: impl IntoIterator<Item = (String, String)>,
        own: &HashMap<String, String>,
    ) -> Vec<(String, String)> {
        let mut merged: BTreeMap<String, String> = parent.into_iter().collect();
        merged.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.finish(merged)
    }

    /// Only the server's own configured variables, filtered, expanded once,
    /// and sorted. The parent environment never enters.
    pub fn isolated_env(&self, own: &HashMap<String, String>) -> Vec<(String, String)> {
        let merged: BTreeMap<String, String> =
            own.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        self.finish(merged)
    }

    /// Filter a server's argument list. Arguments carrying a foreign
    /// reference are dropped with a warning; survivors are expanded once
    /// against the already-filtered environment.
    pub fn safe_args(&self, args: &[String], env: &[(String, String)]) -> Vec<String> {
        let lookup: BTreeMap<String, String> = env.iter().cloned().collect();
        args.iter()
            .filter(|arg| {
                let allowed = !contains_illegal_reference(arg, &self.own_prefix);
                if !allowed {
                    tracing::warn!(argument = %arg, "dropping argument referencing a foreign namespace");
                }
                allowed
            })
            .map(|arg| expand_once(arg, &lookup))
            .collect()
    }

    /// Filter a single volume source string the same way as an argument.
    /// Returns `None` when the source references a foreign namespace.
    pub fn safe_volume_source(&self, source: &str, env: &[(String, String)]) -> Option<String> {
        if contains_illegal_reference(source, &self.own_prefix) {
            tracing::warn!(source = %source, "dropping volume source referencing a foreign namespace");
            return None;
        }
        let lookup: BTreeMap<String, String> = env.iter().cloned().collect();
        Some(expand_once(source, &lookup))
    }

    /// Key filter, value filter, one-shot expansion, deterministic order.
    fn finish(&self, merged: BTreeMap<String, String>) -> Vec<(String, String)> {
        let mut raw = BTreeMap::new();
        for (key, value) in merged {
            if !self.key_allowed(&key) {
                continue;
            }
            if contains_illegal_reference(&value, &self.own_prefix) {
                tracing::warn!(key = %key, "dropping environment entry referencing a foreign namespace");
                continue;
            }
            raw.insert(key, value);
        }

        // BTreeMap iteration is already lexicographic by key.
        raw.iter()
            .map(|(key, value)| (key.clone(), expand_once(value, &raw)))
            .collect()
    }

    /// A key survives unless it belongs to another server's namespace or is
    /// an application-level variable.
    fn key_allowed(&self, key: &str) -> bool {
        if key.starts_with(SERVER_PREFIX) {
            return key.starts_with(&self.own_prefix);
        }
        !key.starts_with(APP_PREFIX)
    }
}
