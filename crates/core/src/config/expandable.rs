//! Declarative flag expansions
//!
//! A flag maps either to a literal fragment or to a template description
//! with optional per-shell overrides. Overrides may be a single string, a
//! template object, or a list mixing both.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::impl_case_insensitive_deserialize;
use crate::shell::ShellType;

/// Where an expanded fragment lands in the final command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    #[default]
    Start,
    Prefix,
    PreArgs,
    Suffix,
    End,
}

impl_case_insensitive_deserialize!(
    Position,
    Start => "start",
    Prefix => "prefix",
    PreArgs => "pre-args",
    PreArgs => "preargs",
    PreArgs => "pre_args",
    Suffix => "suffix",
    End => "end"
);

/// Value of a flag entry in any of the flag maps
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExpandableValue {
    /// Inserted verbatim at [`Position::Start`]
    Literal(String),
    Template(TemplateExpansion),
}

impl ExpandableValue {
    pub fn description(&self) -> Option<&str> {
        match self {
            ExpandableValue::Literal(_) => None,
            ExpandableValue::Template(t) => t.description.as_deref(),
        }
    }

    /// Every template string this value can render, across all shells
    pub fn template_sources(&self) -> Vec<&str> {
        match self {
            ExpandableValue::Literal(text) => vec![text.as_str()],
            ExpandableValue::Template(t) => t.template_sources(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TemplateExpansion {
    pub position: Option<Position>,
    pub template: Option<String>,
    pub defaults: BTreeMap<String, String>,
    pub description: Option<String>,
    pub pwsh_template: Option<ShellTemplates>,
    pub linux_template: Option<ShellTemplates>,
    pub cmd_template: Option<ShellTemplates>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ShellTemplates {
    Many(Vec<TemplateSource>),
    One(TemplateSource),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TemplateSource {
    Text(String),
    Entry(TemplateEntry),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateEntry {
    #[serde(default)]
    pub position: Option<Position>,
    pub template: String,
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
}

/// A template ready to render: position and defaults already inherited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub position: Position,
    pub template: String,
    pub defaults: BTreeMap<String, String>,
}

impl ShellTemplates {
    fn sources(&self) -> Vec<&TemplateSource> {
        match self {
            ShellTemplates::Many(sources) => sources.iter().collect(),
            ShellTemplates::One(source) => vec![source],
        }
    }
}

impl TemplateSource {
    fn template(&self) -> &str {
        match self {
            TemplateSource::Text(text) => text,
            TemplateSource::Entry(entry) => &entry.template,
        }
    }
}

impl TemplateExpansion {
    /// Shell-specific override for `shell`, if one is declared
    pub fn shell_override(&self, shell: ShellType) -> Option<&ShellTemplates> {
        match shell {
            ShellType::Pwsh => self.pwsh_template.as_ref(),
            ShellType::Linux => self.linux_template.as_ref(),
            ShellType::Cmd => self.cmd_template.as_ref(),
            ShellType::Unknown => None,
        }
    }

    /// Templates to render for `shell`, in declaration order.
    ///
    /// A shell override replaces the generic `template` entirely. Entries
    /// without their own position or defaults inherit the outer ones.
    pub fn templates_for(&self, shell: ShellType) -> Vec<ResolvedTemplate> {
        let outer_position = self.position.unwrap_or_default();

        match self.shell_override(shell) {
            Some(templates) => templates
                .sources()
                .into_iter()
                .map(|source| match source {
                    TemplateSource::Text(text) => ResolvedTemplate {
                        position: outer_position,
                        template: text.clone(),
                        defaults: self.defaults.clone(),
                    },
                    TemplateSource::Entry(entry) => {
                        let mut defaults = self.defaults.clone();
                        defaults.extend(entry.defaults.clone());
                        ResolvedTemplate {
                            position: entry.position.unwrap_or(outer_position),
                            template: entry.template.clone(),
                            defaults,
                        }
                    }
                })
                .collect(),
            None => self
                .template
                .iter()
                .map(|template| ResolvedTemplate {
                    position: outer_position,
                    template: template.clone(),
                    defaults: self.defaults.clone(),
                })
                .collect(),
        }
    }

    fn template_sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = self.template.iter().map(String::as_str).collect();
        for templates in [&self.pwsh_template, &self.linux_template, &self.cmd_template]
            .into_iter()
            .flatten()
        {
            sources.extend(templates.sources().into_iter().map(TemplateSource::template));
        }
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ExpandableValue {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_literal_and_template_variants() {
        assert_eq!(parse(r#""--verbose""#), ExpandableValue::Literal("--verbose".into()));

        let value = parse(r#"{"template": "--env={{env}}", "defaults": {"env": "dev"}}"#);
        let ExpandableValue::Template(t) = value else {
            panic!("expected template variant");
        };
        assert_eq!(t.template.as_deref(), Some("--env={{env}}"));
        assert_eq!(t.defaults.get("env").map(String::as_str), Some("dev"));
    }

    #[test]
    fn test_shell_override_takes_precedence() {
        let ExpandableValue::Template(t) = parse(
            r#"{
                "position": "start",
                "template": "generic",
                "pwsh-template": [
                    {"position": "start", "template": "$env:A='1';"},
                    {"position": "end", "template": "Remove-Item env:A"}
                ],
                "linux-template": "A=1"
            }"#,
        ) else {
            panic!("expected template variant");
        };

        let pwsh = t.templates_for(ShellType::Pwsh);
        assert_eq!(pwsh.len(), 2);
        assert_eq!(pwsh[0].template, "$env:A='1';");
        assert_eq!(pwsh[1].position, Position::End);

        let linux = t.templates_for(ShellType::Linux);
        assert_eq!(linux.len(), 1);
        assert_eq!(linux[0].template, "A=1");
        assert_eq!(linux[0].position, Position::Start);

        let cmd = t.templates_for(ShellType::Cmd);
        assert_eq!(cmd.len(), 1);
        assert_eq!(cmd[0].template, "generic");
    }

    #[test]
    fn test_entry_inherits_outer_position_and_defaults() {
        let ExpandableValue::Template(t) = parse(
            r#"{
                "position": "suffix",
                "defaults": {"duration": "10"},
                "linux-template": {"template": "--timeout={{duration}}", "defaults": {"unit": "s"}}
            }"#,
        ) else {
            panic!("expected template variant");
        };

        let resolved = t.templates_for(ShellType::Linux);
        assert_eq!(resolved[0].position, Position::Suffix);
        assert_eq!(resolved[0].defaults.len(), 2);
        assert!(t.templates_for(ShellType::Unknown).is_empty());
    }

    #[test]
    fn test_template_sources_cover_every_shell() {
        let value = parse(
            r#"{"template": "a", "pwsh-template": ["b", {"template": "c"}], "cmd-template": "d"}"#,
        );
        assert_eq!(value.template_sources(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_position_spellings() {
        let position: Position = serde_json::from_str(r#""pre-args""#).unwrap();
        assert_eq!(position, Position::PreArgs);
        let position: Position = serde_json::from_str(r#""preArgs""#).unwrap();
        assert_eq!(position, Position::PreArgs);
    }
}
