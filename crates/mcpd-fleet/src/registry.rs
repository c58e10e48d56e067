//! Thread-safe map of server name → (client handle, tool allow-list).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use mcpd_core::{DaemonError, normalize_name, normalize_tools};

use crate::client::McpClient;

struct Entry {
    /// Name as configured (trimmed), kept for display surfaces.
    display_name: String,
    client: Arc<dyn McpClient>,
    tools: Vec<String>,
}

/// Shared by the supervisor (writes) and the gateway (reads). Keys and
/// tool lists are normalized on the way in, so lookups are insensitive to
/// case and surrounding whitespace; the configured spelling is kept
/// alongside for listings. Lock scope never spans an await.
#[derive(Default)]
pub struct ClientRegistry {
    inner: RwLock<HashMap<String, Entry>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a server. Replacing drops the previous handle.
    pub fn add(&self, name: &str, client: Arc<dyn McpClient>, tools: &[String]) {
        let mut inner = self.inner.write().expect("client registry lock poisoned");
        inner.insert(
            normalize_name(name),
            Entry {
                display_name: name.trim().to_string(),
                client,
                tools: normalize_tools(tools),
            },
        );
    }

    pub fn client(&self, name: &str) -> Option<Arc<dyn McpClient>> {
        let inner = self.inner.read().expect("client registry lock poisoned");
        inner.get(&normalize_name(name)).map(|e| e.client.clone())
    }

    pub fn tools(&self, name: &str) -> Option<Vec<String>> {
        let inner = self.inner.read().expect("client registry lock poisoned");
        inner.get(&normalize_name(name)).map(|e| e.tools.clone())
    }

    /// Registered names in their configured spelling, sorted.
    pub fn list(&self) -> Vec<String> {
        let inner = self.inner.read().expect("client registry lock poisoned");
        let mut names: Vec<String> = inner.values().map(|e| e.display_name.clone()).collect();
        names.sort();
        names
    }

    /// Swap the allow-list in place. Calls authorized against the previous
    /// list may still complete; the swap itself is atomic.
    pub fn update_tools(&self, name: &str, tools: &[String]) -> Result<(), DaemonError> {
        let mut inner = self.inner.write().expect("client registry lock poisoned");
        match inner.get_mut(&normalize_name(name)) {
            Some(entry) => {
                entry.tools = normalize_tools(tools);
                Ok(())
            }
            None => Err(DaemonError::ServerNotFound(normalize_name(name))),
        }
    }

    /// Remove and return the handle so the caller can close it.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn McpClient>> {
        let mut inner = self.inner.write().expect("client registry lock poisoned");
        inner.remove(&normalize_name(name)).map(|e| e.client)
    }
}
