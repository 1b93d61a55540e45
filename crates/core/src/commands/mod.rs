//! Command handlers and routing
//!
//! Routing is stateless: the first CLI token picks one handler, the handler
//! assembles its process commands and returns the child's exit code.

mod alias;
mod expandable;
mod help;
mod install;

pub use alias::AliasCommand;
pub use expandable::ExpandableCommand;
pub use help::HelpCommand;
pub use install::{InstallAction, InstallCommand, bash_script, cmd_script, pwsh_script};

use std::io::Write;

use crate::command::{CommandExecutor, ProcessCommand, quote_arg, wrap_for_shell};
use crate::config::AliasConfig;
use crate::error::Result;
use crate::flags::{FlagExpansion, InternalOption};
use crate::resolve::{CommandResolution, resolve_command};
use crate::shell::{Environment, ShellType, detect_shell};

/// A handler for one resolved command kind
pub trait Command {
    /// Run with the arguments following the command token
    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<i32>;
}

/// Everything a handler needs for one invocation
pub struct CommandContext<'a> {
    pub config: &'a AliasConfig,
    pub shell: ShellType,
    pub env: &'a Environment,
    pub executor: &'a dyn CommandExecutor,
    /// User-facing output (help text, echoed commands, generated scripts)
    pub out: Box<dyn Write + 'a>,
}

impl<'a> CommandContext<'a> {
    /// The shell comes from `settings.shell` when set, otherwise from `env`
    pub fn new(
        config: &'a AliasConfig,
        env: &'a Environment,
        executor: &'a dyn CommandExecutor,
        out: Box<dyn Write + 'a>,
    ) -> Self {
        let shell = config.settings.shell.unwrap_or_else(|| detect_shell(env));
        tracing::debug!("Using shell: {}", shell);
        Self {
            config,
            shell,
            env,
            executor,
            out,
        }
    }

    pub fn with_shell(mut self, shell: ShellType) -> Self {
        self.shell = shell;
        self
    }
}

/// Dispatch a top-level command token
pub fn route_command(command: &str, args: &[String], ctx: &mut CommandContext<'_>) -> Result<i32> {
    tracing::debug!("Routing command '{}' with args {:?}", command, args);
    let config = ctx.config;

    match resolve_command(command, config) {
        CommandResolution::Reserved { command } => match InstallAction::from_verb(&command) {
            Some(action) => InstallCommand::new(action).execute(args, ctx),
            None => HelpCommand.execute(args, ctx),
        },
        CommandResolution::Expandable { command, execution } => {
            ExpandableCommand::new(command, execution).execute(args, ctx)
        }
        CommandResolution::Package { command } => route_alias(&command, args, ctx),
    }
}

/// Dispatch an alias: expandable commands first, package aliases otherwise
pub fn route_alias(alias: &str, args: &[String], ctx: &mut CommandContext<'_>) -> Result<i32> {
    let config = ctx.config;
    match config.expandable_commands.get(alias) {
        Some(execution) => ExpandableCommand::new(alias, execution.clone()).execute(args, ctx),
        None => AliasCommand::new(alias).execute(args, ctx),
    }
}

/// Wrap `base` with the expansion buckets and attach env-setting pairs.
///
/// Without fragments the argv is spawned directly. With fragments the whole
/// line runs inside the detected shell: the base command and the user's
/// arguments are quoted for that shell, template fragments stay raw.
pub(crate) fn build_process(
    base: &[String],
    expansion: &FlagExpansion,
    shell: ShellType,
) -> Option<ProcessCommand> {
    if base.is_empty() {
        return None;
    }
    let command = if expansion.has_fragments() {
        let core: Vec<String> = base
            .iter()
            .chain(&expansion.remaining_args)
            .map(|arg| quote_arg(arg, shell))
            .collect();
        wrap_for_shell(&expansion.wrap(&core), shell)
    } else {
        ProcessCommand::from_argv(expansion.assemble(base))?
    };
    Some(command.with_envs(expansion.env.iter().cloned()))
}

/// Echo or execute the assembled commands according to internal options
pub(crate) fn run_processes(
    ctx: &mut CommandContext<'_>,
    commands: &[ProcessCommand],
    expansion: &FlagExpansion,
) -> Result<i32> {
    if expansion.has_internal(InternalOption::Echo) {
        for command in commands {
            writeln!(ctx.out, "{}", display_command(command))?;
        }
        return Ok(0);
    }

    if expansion.has_internal(InternalOption::Debug) {
        for command in commands {
            let line = display_command(command);
            tracing::info!("Executing: {}", line);
            writeln!(ctx.out, "+ {line}")?;
        }
        // Child output must follow the trace lines
        ctx.out.flush()?;
    }

    match commands {
        [] => Ok(0),
        [command] => ctx.executor.execute(command),
        many => ctx.executor.execute_many(many),
    }
}

fn display_command(command: &ProcessCommand) -> String {
    let mut line = String::new();
    for (key, value) in &command.env {
        line.push_str(&format!("{key}={} ", quote_arg(value, ShellType::Linux)));
    }
    line.push_str(&command.to_shell_command());
    line
}
