//! Command resolution
//!
//! Classifies the first CLI token as a reserved command, an expandable
//! command or a package alias, and checks configurations for conflicts.

use crate::config::{AliasConfig, ExpandableValue};
use crate::flags::InternalOption;
use crate::template::validate_template;

/// Verbs handled by pae itself; they can never be redefined by configuration
pub const RESERVED_COMMANDS: &[&str] = &["install", "remove", "refresh", "help", "load"];

/// Spellings that resolve to the `help` command
pub const HELP_ALIASES: &[&str] = &["help", "--help", "-h"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResolution {
    Reserved { command: String },
    Expandable { command: String, execution: String },
    Package { command: String },
}

impl CommandResolution {
    pub fn command(&self) -> &str {
        match self {
            CommandResolution::Reserved { command }
            | CommandResolution::Expandable { command, .. }
            | CommandResolution::Package { command } => command,
        }
    }
}

pub fn is_reserved(command: &str) -> bool {
    RESERVED_COMMANDS.contains(&command)
}

/// Resolve `command` with fixed precedence: reserved, expandable, package
pub fn resolve_command(command: &str, config: &AliasConfig) -> CommandResolution {
    if HELP_ALIASES.contains(&command) {
        return CommandResolution::Reserved {
            command: "help".to_string(),
        };
    }

    if is_reserved(command) {
        return CommandResolution::Reserved {
            command: command.to_string(),
        };
    }

    if let Some(execution) = config.expandable_commands.get(command) {
        tracing::debug!("Resolved '{}' as expandable command: {}", command, execution);
        return CommandResolution::Expandable {
            command: command.to_string(),
            execution: execution.clone(),
        };
    }

    CommandResolution::Package {
        command: command.to_string(),
    }
}

/// One error per expandable command that shadows a reserved verb
pub fn validate_expandable_commands(config: &AliasConfig) -> Vec<String> {
    config
        .expandable_commands
        .keys()
        .filter(|name| is_reserved(name))
        .map(|name| {
            format!("Expandable command '{name}' conflicts with the reserved command '{name}'")
        })
        .collect()
}

/// Full load-time check of a configuration; any entry rejects the file
pub fn validate_config(config: &AliasConfig) -> Vec<String> {
    let mut errors = validate_expandable_commands(config);

    for (alias, definition) in &config.nx_packages {
        let projects = definition.projects();
        if projects.is_empty() || projects.iter().any(|p| p.trim().is_empty()) {
            errors.push(format!("Package alias '{alias}' has an empty project name"));
        }
    }

    for (alias, execution) in &config.expandable_commands {
        if execution.trim().is_empty() {
            errors.push(format!("Expandable command '{alias}' has an empty execution"));
        }
    }

    for (flag, value) in &config.internal_flags {
        match value {
            ExpandableValue::Literal(option) if InternalOption::parse(option).is_some() => {}
            ExpandableValue::Literal(option) => errors.push(format!(
                "Internal flag '{flag}' names unknown option '{option}'"
            )),
            ExpandableValue::Template(_) => errors.push(format!(
                "Internal flag '{flag}' must name an option, not a template"
            )),
        }
    }

    errors
}

/// Legacy `{name}` placeholders in flag templates.
///
/// These are reported, not rejected: a single-brace group can be genuine
/// shell syntax, e.g. a PowerShell script block.
pub fn template_warnings(config: &AliasConfig) -> Vec<String> {
    let flag_maps = [
        ("expandable-flags", &config.expandable_flags),
        ("context-aware-flags", &config.context_aware_flags),
        ("env-setting-flags", &config.env_setting_flags),
    ];

    let mut warnings = Vec::new();
    for (section, flags) in flag_maps {
        for (flag, value) in flags {
            for source in value.template_sources() {
                for error in validate_template(source).errors {
                    warnings.push(format!("{section}.{flag}: {error}"));
                }
            }
        }
    }
    warnings
}
