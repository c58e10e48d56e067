//! Reload planning: diff a proposed fleet against the running one.

use std::collections::HashMap;

use mcpd_config::RuntimeServer;

/// What to do with each server to move the fleet to the proposed set.
///
/// Application order is removes → tools-updates → restarts → adds; the
/// buckets are sorted by name so plans are deterministic.
#[derive(Debug, Clone, Default)]
pub struct ReloadPlan {
    pub remove: Vec<String>,
    pub add: Vec<RuntimeServer>,
    pub restart: Vec<RuntimeServer>,
    pub update_tools: Vec<RuntimeServer>,
    pub unchanged: Vec<String>,
}

/// Categorize every server on either side of the diff.
///
/// A server present in both sets is unchanged when every field matches,
/// a tools-update when only the allow-list differs, and a restart when
/// anything else differs.
pub fn plan_reload(current: &[RuntimeServer], proposed: &[RuntimeServer]) -> ReloadPlan {
    let current_by_name: HashMap<String, &RuntimeServer> =
        current.iter().map(|s| (s.name(), s)).collect();
    let proposed_by_name: HashMap<String, &RuntimeServer> =
        proposed.iter().map(|s| (s.name(), s)).collect();

    let mut plan = ReloadPlan::default();

    for server in current {
        if !proposed_by_name.contains_key(&server.name()) {
            plan.remove.push(server.name());
        }
    }

    for server in proposed {
        match current_by_name.get(&server.name()) {
            None => plan.add.push(server.clone()),
            Some(existing) => {
                if existing.same_definition(server) {
                    plan.unchanged.push(server.name());
                } else if existing.same_except_tools(server) {
                    plan.update_tools.push(server.clone());
                } else {
                    plan.restart.push(server.clone());
                }
            }
        }
    }

    plan.remove.sort();
    plan.unchanged.sort();
    plan.add.sort_by_key(|s| s.name());
    plan.restart.sort_by_key(|s| s.name());
    plan.update_tools.sort_by_key(|s| s.name());
    plan
}
