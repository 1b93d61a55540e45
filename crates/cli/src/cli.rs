use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use pae_core::config::ConfigLoader;
use pae_core::{CommandContext, Environment, ProcessExecutor, route_command};

/// Expand short aliases into full, shell-aware command invocations
#[derive(Parser, Debug)]
#[command(name = "pae")]
#[command(version, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct Pae {
    /// Alias configuration file (JSON, YAML or TOML); defaults to PAE_CONFIG or a discovered .pae.* file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Alias or command, followed by its target, flags and passthrough args
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl Pae {
    /// Resolve and dispatch, returning the exit code to report
    pub fn execute(self) -> Result<i32> {
        let env = Environment::capture();
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let config = ConfigLoader::load(self.config.as_deref(), &env, &cwd)
            .context("Failed to load alias configuration")?;
        let executor = ProcessExecutor::from_settings(&config.settings);

        let (command, rest) = match self.args.split_first() {
            Some((command, rest)) => (command.as_str(), rest),
            None => ("help", &[][..]),
        };
        tracing::debug!("pae {} {:?}", command, rest);

        let mut ctx = CommandContext::new(&config, &env, &executor, Box::new(std::io::stdout()));
        let code = route_command(command, rest, &mut ctx)
            .with_context(|| format!("Failed to run '{command}'"))?;
        ctx.out.flush().context("Failed to flush output")?;
        Ok(code)
    }
}
