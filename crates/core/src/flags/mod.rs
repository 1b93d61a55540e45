//! Expandable flag processing
//!
//! Intercepts `--flag[=value]` arguments declared in the configuration and
//! turns them into command fragments filed by [`Position`]. Arguments that
//! are not declared flags pass through untouched and in order.

use std::collections::HashMap;

use crate::config::{AliasConfig, ExpandableValue, Position};
use crate::shell::ShellType;
use crate::template::process_template;

/// A `--key` or `--key=value` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFlag {
    pub key: String,
    pub value: Option<String>,
}

/// Split `--key[=value]`.
///
/// Returns `None` for anything that is not a long flag or has an empty key,
/// so the caller passes it through. `--key=` yields no value.
pub fn parse_expandable_flag(arg: &str) -> Option<ParsedFlag> {
    let body = arg.strip_prefix("--")?;
    let (key, value) = match body.split_once('=') {
        Some((key, value)) => (key, Some(value)),
        None => (body, None),
    };

    if key.is_empty() {
        return None;
    }

    Some(ParsedFlag {
        key: key.to_string(),
        value: value.filter(|v| !v.is_empty()).map(str::to_string),
    })
}

/// Options consumed by pae instead of being forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalOption {
    /// Print the final command instead of running it
    Echo,
    /// Log the final command before running it
    Debug,
}

impl InternalOption {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "echo" | "dry-run" => Some(InternalOption::Echo),
            "debug" | "verbose" => Some(InternalOption::Debug),
            _ => None,
        }
    }
}

/// Fragments produced from one argument list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagExpansion {
    pub start: Vec<String>,
    pub prefix: Vec<String>,
    pub pre_args: Vec<String>,
    pub suffix: Vec<String>,
    pub end: Vec<String>,
    pub remaining_args: Vec<String>,
    /// Pairs for the child environment, from env-setting flags
    pub env: Vec<(String, String)>,
    pub internal: Vec<InternalOption>,
}

impl FlagExpansion {
    fn push(&mut self, position: Position, fragment: String) {
        let bucket = match position {
            Position::Start => &mut self.start,
            Position::Prefix => &mut self.prefix,
            Position::PreArgs => &mut self.pre_args,
            Position::Suffix => &mut self.suffix,
            Position::End => &mut self.end,
        };
        bucket.push(fragment);
    }

    /// True when any bucket holds a fragment, i.e. the base command needs wrapping
    pub fn has_fragments(&self) -> bool {
        !(self.start.is_empty()
            && self.prefix.is_empty()
            && self.pre_args.is_empty()
            && self.suffix.is_empty()
            && self.end.is_empty())
    }

    pub fn has_internal(&self, option: InternalOption) -> bool {
        self.internal.contains(&option)
    }

    /// Final command line: `start, prefix, pre_args, base, remaining, suffix, end`
    pub fn assemble(&self, base: &[String]) -> Vec<String> {
        let mut core = base.to_vec();
        core.extend(self.remaining_args.iter().cloned());
        self.wrap(&core)
    }

    /// Surround `core` (base command plus remaining args) with the buckets
    pub fn wrap(&self, core: &[String]) -> Vec<String> {
        let mut wrapped_start = Vec::new();
        wrapped_start.extend(self.start.iter().cloned());
        wrapped_start.extend(self.prefix.iter().cloned());
        wrapped_start.extend(self.pre_args.iter().cloned());

        let mut wrapped_end = self.suffix.clone();
        wrapped_end.extend(self.end.iter().cloned());

        construct_wrapped_command(core, &wrapped_start, &wrapped_end)
    }
}

/// `start + base + end`, unchanged
pub fn construct_wrapped_command(base: &[String], start: &[String], end: &[String]) -> Vec<String> {
    start.iter().chain(base).chain(end).cloned().collect()
}

/// Expands declared flags against one configuration and shell
pub struct FlagProcessor<'a> {
    config: &'a AliasConfig,
    shell: ShellType,
    context: HashMap<String, String>,
}

impl<'a> FlagProcessor<'a> {
    pub fn new(config: &'a AliasConfig, shell: ShellType) -> Self {
        Self {
            config,
            shell,
            context: HashMap::new(),
        }
    }

    /// Add a variable visible to context-aware flags (e.g. `project`, `target`)
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Expand `args` in order.
    ///
    /// Lookup precedence per flag: internal, env-setting, context-aware,
    /// expandable. A bare `--` stops interception; it and everything after it
    /// are forwarded verbatim.
    pub fn expand(&self, args: &[String]) -> FlagExpansion {
        let mut expansion = FlagExpansion::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            if arg == "--" {
                expansion.remaining_args.push(arg.clone());
                expansion.remaining_args.extend(iter.by_ref().cloned());
                break;
            }

            let Some(flag) = parse_expandable_flag(arg) else {
                expansion.remaining_args.push(arg.clone());
                continue;
            };

            if let Some(value) = self.config.internal_flags.get(&flag.key) {
                self.apply_internal(&flag, value, &mut expansion, arg);
            } else if let Some(value) = self.config.env_setting_flags.get(&flag.key) {
                self.apply_env(&flag, value, &mut expansion);
            } else if let Some(value) = self.config.context_aware_flags.get(&flag.key) {
                let variables = self.variables(&self.context, &flag);
                self.apply_fragments(value, &variables, &mut expansion);
            } else if let Some(value) = self.config.expandable_flags.get(&flag.key) {
                let variables = self.variables(&HashMap::new(), &flag);
                self.apply_fragments(value, &variables, &mut expansion);
            } else {
                expansion.remaining_args.push(arg.clone());
            }
        }

        tracing::debug!("Flag expansion: {:?}", expansion);
        expansion
    }

    fn variables(
        &self,
        context: &HashMap<String, String>,
        flag: &ParsedFlag,
    ) -> HashMap<String, String> {
        let mut variables = context.clone();
        variables.insert("shell".to_string(), self.shell.to_string());
        if let Some(ref value) = flag.value {
            variables.insert("value".to_string(), value.clone());
        }
        variables
    }

    /// Render `value` for the current shell into `(position, fragment)` pairs
    fn render(
        &self,
        value: &ExpandableValue,
        variables: &HashMap<String, String>,
        flag_value: Option<&str>,
    ) -> Vec<(Position, String)> {
        match value {
            ExpandableValue::Literal(text) => {
                vec![(Position::Start, process_template(text, variables))]
            }
            ExpandableValue::Template(expansion) => expansion
                .templates_for(self.shell)
                .into_iter()
                .map(|template| {
                    let mut vars = variables.clone();
                    for (name, default) in &template.defaults {
                        let bound = flag_value.unwrap_or(default.as_str());
                        vars.insert(name.clone(), bound.to_string());
                    }
                    (template.position, process_template(&template.template, &vars))
                })
                .collect(),
        }
    }

    fn apply_fragments(
        &self,
        value: &ExpandableValue,
        variables: &HashMap<String, String>,
        expansion: &mut FlagExpansion,
    ) {
        let flag_value = variables.get("value").map(String::as_str);
        for (position, fragment) in self.render(value, variables, flag_value) {
            if !fragment.trim().is_empty() {
                expansion.push(position, fragment);
            }
        }
    }

    fn apply_env(
        &self,
        flag: &ParsedFlag,
        value: &ExpandableValue,
        expansion: &mut FlagExpansion,
    ) {
        let variables = self.variables(&HashMap::new(), flag);
        for (_, rendered) in self.render(value, &variables, flag.value.as_deref()) {
            match rendered.split_once('=') {
                Some((key, val)) if !key.trim().is_empty() => {
                    expansion.env.push((key.trim().to_string(), val.to_string()));
                }
                _ => tracing::warn!(
                    "Ignoring env-setting flag '--{}': '{}' is not KEY=VALUE",
                    flag.key,
                    rendered
                ),
            }
        }
    }

    fn apply_internal(
        &self,
        flag: &ParsedFlag,
        value: &ExpandableValue,
        expansion: &mut FlagExpansion,
        arg: &str,
    ) {
        let option = match value {
            ExpandableValue::Literal(name) => InternalOption::parse(name),
            ExpandableValue::Template(_) => None,
        };
        match option {
            Some(option) => expansion.internal.push(option),
            None => {
                tracing::warn!("Internal flag '--{}' names no known option, forwarding", flag.key);
                expansion.remaining_args.push(arg.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn config(json: &str) -> AliasConfig {
        AliasConfig::from_json(json).unwrap()
    }

    #[test]
    fn test_parse_expandable_flag() {
        assert_eq!(
            parse_expandable_flag("--env=prod"),
            Some(ParsedFlag {
                key: "env".into(),
                value: Some("prod".into())
            })
        );
        assert_eq!(
            parse_expandable_flag("--verbose"),
            Some(ParsedFlag {
                key: "verbose".into(),
                value: None
            })
        );
        assert_eq!(
            parse_expandable_flag("--env="),
            Some(ParsedFlag {
                key: "env".into(),
                value: None
            })
        );
        assert_eq!(parse_expandable_flag("--a=b=c").unwrap().value.as_deref(), Some("b=c"));
        assert_eq!(parse_expandable_flag("--"), None);
        assert_eq!(parse_expandable_flag("--=x"), None);
        assert_eq!(parse_expandable_flag("-v"), None);
        assert_eq!(parse_expandable_flag("build"), None);
    }

    #[test]
    fn test_literal_goes_to_start() {
        let cfg = config(r#"{"expandable-flags": {"verbose": "pre"}}"#);
        let expansion = FlagProcessor::new(&cfg, ShellType::Linux).expand(&args(&["--verbose"]));
        assert_eq!(expansion.start, vec!["pre"]);
        assert!(expansion.remaining_args.is_empty());
    }

    #[test]
    fn test_unrecognized_flags_pass_through_in_order() {
        let cfg = config(r#"{"expandable-flags": {"verbose": "pre"}}"#);
        let expansion = FlagProcessor::new(&cfg, ShellType::Linux)
            .expand(&args(&["--skip-nx-cache", "--verbose", "positional", "--=x", "--"]));
        assert_eq!(expansion.remaining_args, args(&["--skip-nx-cache", "positional", "--=x", "--"]));
    }

    #[test]
    fn test_double_dash_stops_interception() {
        let cfg = config(r#"{"expandable-flags": {"verbose": "pre"}}"#);
        let expansion = FlagProcessor::new(&cfg, ShellType::Linux)
            .expand(&args(&["--", "--verbose", "x"]));
        assert!(expansion.start.is_empty());
        assert_eq!(expansion.remaining_args, args(&["--", "--verbose", "x"]));
    }

    #[test]
    fn test_template_flag_uses_value_or_default() {
        let cfg = config(
            r#"{"expandable-flags": {
                "timeout": {
                    "position": "suffix",
                    "template": "--timeout={{duration}}",
                    "defaults": {"duration": "30"}
                }
            }}"#,
        );
        let processor = FlagProcessor::new(&cfg, ShellType::Linux);

        assert_eq!(processor.expand(&args(&["--timeout"])).suffix, vec!["--timeout=30"]);
        assert_eq!(processor.expand(&args(&["--timeout=5"])).suffix, vec!["--timeout=5"]);
        assert_eq!(processor.expand(&args(&["--timeout="])).suffix, vec!["--timeout=30"]);
    }

    #[test]
    fn test_shell_specific_templates() {
        let cfg = config(
            r#"{"expandable-flags": {
                "locale": {
                    "template": "LANG={{lang}}",
                    "defaults": {"lang": "C"},
                    "pwsh-template": [
                        {"position": "start", "template": "$env:LANG='{{lang}}';"},
                        {"position": "end", "template": "; Remove-Item env:LANG"}
                    ]
                }
            }}"#,
        );

        let pwsh = FlagProcessor::new(&cfg, ShellType::Pwsh).expand(&args(&["--locale=de"]));
        assert_eq!(pwsh.start, vec!["$env:LANG='de';"]);
        assert_eq!(pwsh.end, vec!["; Remove-Item env:LANG"]);

        let linux = FlagProcessor::new(&cfg, ShellType::Linux).expand(&args(&["--locale"]));
        assert_eq!(linux.start, vec!["LANG=C"]);
        assert!(linux.end.is_empty());
    }

    #[test]
    fn test_buckets_keep_flag_order() {
        let cfg = config(
            r#"{"expandable-flags": {"a": "first", "b": "second", "c": {"position": "prefix", "template": "p"}}}"#,
        );
        let expansion = FlagProcessor::new(&cfg, ShellType::Unknown)
            .expand(&args(&["--b", "--c", "--a", "--b"]));
        assert_eq!(expansion.start, vec!["second", "first", "second"]);
        assert_eq!(expansion.prefix, vec!["p"]);
    }

    #[test]
    fn test_assemble_order() {
        let expansion = FlagExpansion {
            start: args(&["s"]),
            prefix: args(&["p"]),
            pre_args: args(&["pa"]),
            suffix: args(&["su"]),
            end: args(&["e"]),
            remaining_args: args(&["r"]),
            ..Default::default()
        };
        assert_eq!(
            expansion.assemble(&args(&["nx", "run"])),
            args(&["s", "p", "pa", "nx", "run", "r", "su", "e"])
        );
        assert!(expansion.has_fragments());
        assert!(!FlagExpansion::default().has_fragments());
    }

    #[test]
    fn test_construct_wrapped_command() {
        assert_eq!(
            construct_wrapped_command(&args(&["base"]), &args(&["a", "b"]), &args(&["c"])),
            args(&["a", "b", "base", "c"])
        );
    }

    #[test]
    fn test_context_aware_flags_see_project_and_target() {
        let cfg = config(
            r#"{
                "context-aware-flags": {"report": {"position": "suffix", "template": "--output=dist/{{project}}/{{target}}.json"}},
                "expandable-flags": {"plain": "{{project}}"}
            }"#,
        );
        let expansion = FlagProcessor::new(&cfg, ShellType::Linux)
            .with_context("project", "core")
            .with_context("target", "test")
            .expand(&args(&["--report", "--plain"]));
        assert_eq!(expansion.suffix, vec!["--output=dist/core/test.json"]);
        assert_eq!(expansion.start, vec!["{{project}}"]);
    }

    #[test]
    fn test_env_setting_flags() {
        let cfg = config(
            r#"{"env-setting-flags": {
                "debug": "DEBUG=true",
                "level": {"template": "LOG_LEVEL={{level}}", "defaults": {"level": "info"}},
                "broken": "nothing"
            }}"#,
        );
        let expansion = FlagProcessor::new(&cfg, ShellType::Linux)
            .expand(&args(&["--debug", "--level=trace", "--broken"]));
        assert_eq!(
            expansion.env,
            vec![
                ("DEBUG".to_string(), "true".to_string()),
                ("LOG_LEVEL".to_string(), "trace".to_string())
            ]
        );
        assert!(expansion.remaining_args.is_empty());
        assert!(!expansion.has_fragments());
    }

    #[test]
    fn test_internal_flags() {
        let cfg = config(r#"{"internal-flags": {"pae-echo": "echo", "pae-debug": "debug", "odd": "launch"}}"#);
        let expansion = FlagProcessor::new(&cfg, ShellType::Linux)
            .expand(&args(&["--pae-echo", "--pae-debug", "--odd"]));
        assert!(expansion.has_internal(InternalOption::Echo));
        assert!(expansion.has_internal(InternalOption::Debug));
        assert_eq!(expansion.remaining_args, args(&["--odd"]));
    }
}
