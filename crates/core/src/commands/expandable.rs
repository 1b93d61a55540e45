use super::{Command, CommandContext, build_process, run_processes};
use crate::error::{Error, Result};
use crate::flags::FlagProcessor;

/// Runs the command line an `expandable-commands` entry declares
pub struct ExpandableCommand {
    name: String,
    execution: String,
}

impl ExpandableCommand {
    pub fn new(name: impl Into<String>, execution: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            execution: execution.into(),
        }
    }
}

impl Command for ExpandableCommand {
    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<i32> {
        let base: Vec<String> = self
            .execution
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let expansion = FlagProcessor::new(ctx.config, ctx.shell)
            .with_context("command", self.name.as_str())
            .expand(args);

        let command = build_process(&base, &expansion, ctx.shell).ok_or_else(|| {
            Error::Config(format!("Expandable command '{}' has an empty execution", self.name))
        })?;

        tracing::debug!("Expandable command '{}' -> {}", self.name, command.to_shell_command());
        run_processes(ctx, &[command], &expansion)
    }
}
