//! Server and tool name normalization.
//!
//! Every map key, allow-list entry, and environment-variable segment passes
//! through these helpers so that `" Time "` and `"time"` refer to the same
//! server everywhere in the daemon.

/// Canonical form of a server or tool name: trimmed, ASCII-lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Normalize a tool allow-list: each entry trimmed and lowercased, empty
/// entries dropped, duplicates removed while preserving first-seen order.
pub fn normalize_tools(tools: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tools
        .iter()
        .map(|t| normalize_name(t))
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Environment-variable segment for a server or argument name: normalized,
/// then ASCII-uppercased with `-` mapped to `_`.
///
/// `"mcp-everything"` becomes `"MCP_EVERYTHING"`, so its variables live
/// under `MCPD__MCP_EVERYTHING__*`.
pub fn env_segment(name: &str) -> String {
    normalize_name(name).to_ascii_uppercase().replace('-', "_")
}
