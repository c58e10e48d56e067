//! Runtime-server composition and launch-time validation.

use anyhow::{Result, bail};
use mcpd_core::{env_segment, normalize_name, normalize_tools};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::context::ExecutionContext;
use crate::entry::ServerEntry;

/// Package runners the supervisor knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    Npx,
    Uvx,
    Python,
    Docker,
}

impl Runtime {
    /// The binary resolved from `PATH` for this runner.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Npx => "npx",
            Self::Uvx => "uvx",
            Self::Python => "python",
            Self::Docker => "docker",
        }
    }
}

impl std::fmt::Display for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// Split `<runtime>::<package@version>` into its runner and package halves.
pub fn parse_package(package: &str) -> Result<(Runtime, String)> {
    let Some((runtime, package_ref)) = package.split_once("::") else {
        bail!("package '{package}' is missing the '<runtime>::' prefix");
    };
    let runtime = match normalize_name(runtime).as_str() {
        "npx" => Runtime::Npx,
        "uvx" => Runtime::Uvx,
        "python" => Runtime::Python,
        "docker" => Runtime::Docker,
        other => bail!("unsupported runtime '{other}' (expected: npx, uvx, python, docker)"),
    };
    let package_ref = package_ref.trim();
    if package_ref.is_empty() {
        bail!("package '{package}' names no package after the runtime prefix");
    }
    Ok((runtime, package_ref.to_string()))
}

/// A volume ready to mount: logical name, host source, container path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub name: String,
    pub source: String,
    pub container_path: String,
}

/// Static entry ∪ execution context: everything needed to launch one child.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeServer {
    pub entry: ServerEntry,
    pub context: ExecutionContext,
}

impl RuntimeServer {
    pub fn new(entry: ServerEntry, context: ExecutionContext) -> Self {
        Self { entry, context }
    }

    /// Normalized name used as the map key everywhere.
    pub fn name(&self) -> String {
        normalize_name(&self.entry.name)
    }

    /// Normalized allow-list.
    pub fn allowed_tools(&self) -> Vec<String> {
        normalize_tools(&self.entry.tools)
    }

    /// Runner and bare package reference parsed from `entry.package`.
    pub fn runtime(&self) -> Result<(Runtime, String)> {
        parse_package(&self.entry.package)
    }

    /// Launch-time validation. Collects every problem instead of stopping
    /// at the first, so an operator sees the full list at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if let Err(error) = self.runtime() {
            problems.push(error.to_string());
        }
        if self.allowed_tools().is_empty() {
            problems.push("no tools configured".to_string());
        }
        for var in &self.entry.required_env_vars {
            if !self.context.env.contains_key(var) {
                problems.push(format!("missing required env var '{var}'"));
            }
        }
        for arg in &self.entry.required_positional_args {
            if !self.context.args.iter().any(|a| a == arg) {
                problems.push(format!("missing required positional arg '{arg}'"));
            }
        }
        for flag in &self.entry.required_value_args {
            if !self.has_value_arg(flag) && self.arg_env_fallback(flag).is_none() {
                problems.push(format!("missing required value arg '{flag}'"));
            }
        }
        for flag in &self.entry.required_bool_args {
            if !self.context.args.iter().any(|a| a == flag)
                && self.arg_env_fallback(flag).is_none()
            {
                problems.push(format!("missing required bool arg '{flag}'"));
            }
        }
        for (volume, spec) in &self.entry.volumes {
            if spec.required && !self.context.volumes.contains_key(volume) {
                problems.push(format!("missing source for required volume '{volume}'"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            bail!("server '{}' invalid: {}", self.name(), problems.join("; "))
        }
    }

    /// Context args plus flags satisfied through the per-arg environment
    /// convention (`MCPD__<SERVER>__<ARG_NAME_UPPER>`).
    pub fn resolved_args(&self) -> Vec<String> {
        let mut args = self.context.args.clone();
        for flag in &self.entry.required_value_args {
            if !self.has_value_arg(flag) {
                if let Some(value) = self.arg_env_fallback(flag) {
                    args.push(format!("{flag}={value}"));
                }
            }
        }
        for flag in &self.entry.required_bool_args {
            if !args.iter().any(|a| a == flag) && self.arg_env_fallback(flag).is_some() {
                args.push(flag.clone());
            }
        }
        args
    }

    /// Volumes with a host source. A required volume without a source is a
    /// validation failure; an optional one is silently dropped here.
    pub fn resolved_volumes(&self) -> Vec<VolumeMount> {
        let mut mounts: Vec<VolumeMount> = self
            .entry
            .volumes
            .iter()
            .filter_map(|(name, spec)| {
                self.context.volumes.get(name).map(|source| VolumeMount {
                    name: name.clone(),
                    source: source.clone(),
                    container_path: spec.container_path.clone(),
                })
            })
            .collect();
        mounts.sort_by(|a, b| a.name.cmp(&b.name));
        mounts
    }

    /// Full equality used by the reload planner: everything including the
    /// execution context, with tools compared as normalized sets.
    pub fn same_definition(&self, other: &RuntimeServer) -> bool {
        self.tools_equal(other) && self.same_except_tools(other)
    }

    /// Allow-lists equal as sets, ignoring order, case, and whitespace.
    pub fn tools_equal(&self, other: &RuntimeServer) -> bool {
        let ours: BTreeSet<String> = self.allowed_tools().into_iter().collect();
        let theirs: BTreeSet<String> = other.allowed_tools().into_iter().collect();
        ours == theirs
    }

    /// Everything but the allow-list matches. Combined with a tool-set
    /// difference this means the child can keep running.
    pub fn same_except_tools(&self, other: &RuntimeServer) -> bool {
        self.name() == other.name()
            && self.entry.package == other.entry.package
            && self.entry.required_env_vars == other.entry.required_env_vars
            && self.entry.required_positional_args == other.entry.required_positional_args
            && self.entry.required_value_args == other.entry.required_value_args
            && self.entry.required_bool_args == other.entry.required_bool_args
            && self.entry.volumes == other.entry.volumes
            && self.context == other.context
    }

    /// `MCPD__<SERVER>__<ARG_NAME_UPPER>` lookup in the context env.
    fn arg_env_fallback(&self, flag: &str) -> Option<String> {
        let key = format!(
            "MCPD__{}__{}",
            env_segment(&self.entry.name),
            env_segment(flag.trim_start_matches('-'))
        );
        self.context.env.get(&key).cloned()
    }

    fn has_value_arg(&self, flag: &str) -> bool {
        let prefix = format!("{flag}=");
        self.context
            .args
            .iter()
            .any(|a| a == flag || a.starts_with(&prefix))
    }
}
