//! Alias configuration
//!
//! The configuration is loaded once per invocation and is read-only
//! afterwards. Every map is optional in the file; missing maps are empty.

mod expandable;
pub mod loader;

pub use expandable::{
    ExpandableValue, Position, ResolvedTemplate, ShellTemplates, TemplateEntry,
    TemplateExpansion, TemplateSource,
};
pub use loader::ConfigLoader;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::shell::ShellType;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AliasConfig {
    /// Package aliases: alias -> project definition
    #[serde(rename = "nxPackages")]
    pub nx_packages: BTreeMap<String, PackageDefinition>,

    /// Target shortcuts: shortcut -> target name
    #[serde(rename = "nxTargets")]
    pub nx_targets: BTreeMap<String, String>,

    /// Aliases that expand to a full command line
    #[serde(rename = "expandable-commands")]
    pub expandable_commands: BTreeMap<String, String>,

    #[serde(rename = "expandable-flags")]
    pub expandable_flags: BTreeMap<String, ExpandableValue>,

    /// Like `expandable-flags`, rendered with `project` and `target` variables
    #[serde(rename = "context-aware-flags")]
    pub context_aware_flags: BTreeMap<String, ExpandableValue>,

    /// Flags consumed by pae itself; each names an internal option
    #[serde(rename = "internal-flags")]
    pub internal_flags: BTreeMap<String, ExpandableValue>,

    /// Flags rendering to `KEY=VALUE` pairs for the child environment
    #[serde(rename = "env-setting-flags")]
    pub env_setting_flags: BTreeMap<String, ExpandableValue>,

    pub settings: Settings,
}

/// Program used for package targets when `settings.runner` is unset
pub const DEFAULT_RUNNER: &str = "nx";

/// Pool size when `settings.max-concurrency` is unset
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Every field is optional so nested files can override one setting at a time
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Program used for package targets
    pub runner: Option<String>,
    /// Kill the child after this many milliseconds
    pub timeout_ms: Option<u64>,
    /// Upper bound on concurrently running children for multi-package aliases
    pub max_concurrency: Option<usize>,
    pub install_dir: Option<PathBuf>,
    /// Skip detection and render templates for this shell
    pub shell: Option<ShellType>,
}

impl Settings {
    pub fn runner(&self) -> &str {
        self.runner.as_deref().unwrap_or(DEFAULT_RUNNER)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY)
    }

    fn merge(&mut self, other: Settings) {
        if other.runner.is_some() {
            self.runner = other.runner;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.max_concurrency.is_some() {
            self.max_concurrency = other.max_concurrency;
        }
        if other.install_dir.is_some() {
            self.install_dir = other.install_dir;
        }
        if other.shell.is_some() {
            self.shell = other.shell;
        }
    }
}

/// What a package alias points at
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PackageDefinition {
    Name(String),
    Many(Vec<String>),
    Detailed {
        name: String,
        #[serde(default)]
        suffix: Option<String>,
        /// Exact project name; wins over `name` and `suffix`
        #[serde(default)]
        full: Option<String>,
    },
}

impl PackageDefinition {
    /// Project names this alias runs against
    pub fn projects(&self) -> Vec<String> {
        match self {
            PackageDefinition::Name(name) => vec![name.clone()],
            PackageDefinition::Many(names) => names.clone(),
            PackageDefinition::Detailed { full: Some(full), .. } if !full.is_empty() => {
                vec![full.clone()]
            }
            PackageDefinition::Detailed { name, suffix, .. } => match suffix {
                Some(suffix) if !suffix.is_empty() => vec![format!("{name}-{suffix}")],
                _ => vec![name.clone()],
            },
        }
    }
}

impl AliasConfig {
    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse from TOML string
    pub fn from_toml(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Map a target shortcut to its full name, or keep it as given
    pub fn resolve_target<'a>(&'a self, target: &'a str) -> &'a str {
        self.nx_targets
            .get(target)
            .map(String::as_str)
            .unwrap_or(target)
    }

    /// Merge another config into this one.
    ///
    /// Entries from `other` win on key conflicts, so callers merge from the
    /// least specific file to the most specific. Settings merge field by
    /// field, so a nested file only overrides the settings it names.
    pub fn merge(&mut self, other: AliasConfig) {
        tracing::debug!(
            "Merging config with {} packages and {} expandable commands",
            other.nx_packages.len(),
            other.expandable_commands.len()
        );
        self.nx_packages.extend(other.nx_packages);
        self.nx_targets.extend(other.nx_targets);
        self.expandable_commands.extend(other.expandable_commands);
        self.expandable_flags.extend(other.expandable_flags);
        self.context_aware_flags.extend(other.context_aware_flags);
        self.internal_flags.extend(other.internal_flags);
        self.env_setting_flags.extend(other.env_setting_flags);
        self.settings.merge(other.settings);
    }
}
