//! Per-server execution context as declared in `secrets.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Runtime-only launch material for one server: ordered arguments, an
/// environment map, and host sources for declared volumes.
///
/// `env` is carried pre-expansion: `${VAR}` references stay literal here so
/// the isolation engine can analyze them before anything reaches a child.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub volumes: HashMap<String, String>,
}
