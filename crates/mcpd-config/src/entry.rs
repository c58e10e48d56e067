//! Static server entries as declared in `config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Volume declared by a server entry: where it mounts inside the child,
/// and whether launch must fail when the execution context provides no
/// host source for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSpec {
    pub container_path: String,
    #[serde(default)]
    pub required: bool,
}

/// One `[[servers]]` table in `config.toml`.
///
/// `package` has the form `<runtime>::<package@version>`, e.g.
/// `uvx::mcp-server-time@latest`. `tools` is the allow-list: any tool the
/// child advertises that is not named here is invisible over the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub name: String,
    pub package: String,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_env_vars: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_positional_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_value_args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_bool_args: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub volumes: HashMap<String, VolumeSpec>,
}
