use super::{Command, CommandContext, build_process, run_processes};
use crate::error::{Error, Result};
use crate::flags::{FlagExpansion, FlagProcessor};

/// Runs a target against the project(s) a package alias points at
pub struct AliasCommand {
    alias: String,
}

impl AliasCommand {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
        }
    }
}

impl Command for AliasCommand {
    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<i32> {
        let config = ctx.config;
        let definition = config
            .nx_packages
            .get(&self.alias)
            .ok_or_else(|| Error::UnknownAlias(self.alias.clone()))?;

        let (target, rest) = match args.split_first() {
            Some((target, rest)) if !target.starts_with('-') => (target, rest),
            _ => {
                return Err(Error::Usage(format!(
                    "pae {} <target> [flags...] [-- passthrough args]",
                    self.alias
                )));
            }
        };
        let target = config.resolve_target(target);
        let runner: Vec<String> = config
            .settings
            .runner()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let mut commands = Vec::new();
        let mut expansion = FlagExpansion::default();
        for project in definition.projects() {
            expansion = FlagProcessor::new(config, ctx.shell)
                .with_context("project", project.as_str())
                .with_context("target", target)
                .expand(rest);

            let mut base = runner.clone();
            base.push("run".to_string());
            base.push(format!("{project}:{target}"));

            let command = build_process(&base, &expansion, ctx.shell).ok_or_else(|| {
                Error::Config("settings.runner must name a program".to_string())
            })?;
            commands.push(command);
        }

        tracing::debug!(
            "Alias '{}' resolved to {} command(s) for target '{}'",
            self.alias,
            commands.len(),
            target
        );
        // Internal options do not depend on the project, any expansion will do
        run_processes(ctx, &commands, &expansion)
    }
}
