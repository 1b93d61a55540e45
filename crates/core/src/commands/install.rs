//! Generated shell alias scripts
//!
//! `install` writes one script per shell family into the install directory.
//! Each script defines a function per alias that forwards to `pae`.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{Command, CommandContext};
use crate::config::AliasConfig;
use crate::error::{Error, Result};
use crate::shell::ShellType;

pub const BASH_SCRIPT: &str = "pae-aliases.sh";
pub const PWSH_SCRIPT: &str = "pae-aliases.ps1";
pub const CMD_SCRIPT: &str = "pae-aliases.cmd";

const HEADER: &str = "Generated by `pae install`. Changes are overwritten on refresh.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallAction {
    Install,
    Remove,
    Refresh,
    Load,
}

impl InstallAction {
    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "install" => Some(InstallAction::Install),
            "remove" => Some(InstallAction::Remove),
            "refresh" => Some(InstallAction::Refresh),
            "load" => Some(InstallAction::Load),
            _ => None,
        }
    }
}

pub struct InstallCommand {
    action: InstallAction,
}

impl InstallCommand {
    pub fn new(action: InstallAction) -> Self {
        Self { action }
    }

    fn install_dir(config: &AliasConfig) -> Result<PathBuf> {
        match config.settings.install_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".pae"))
                .ok_or_else(|| Error::Other("Could not determine home directory".to_string())),
        }
    }

    fn install(ctx: &mut CommandContext<'_>, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(BASH_SCRIPT), bash_script(ctx.config))?;
        fs::write(dir.join(PWSH_SCRIPT), pwsh_script(ctx.config))?;
        fs::write(dir.join(CMD_SCRIPT), cmd_script(ctx.config))?;

        let count = alias_names(ctx.config).len();
        tracing::info!("Installed {} aliases to {:?}", count, dir);
        writeln!(ctx.out, "Installed {} aliases to {}", count, dir.display())?;
        writeln!(ctx.out, "Activate them with: {}", activation_hint(ctx.shell))?;
        Ok(())
    }

    fn remove(ctx: &mut CommandContext<'_>, dir: &Path) -> Result<()> {
        let mut removed = 0;
        for name in [BASH_SCRIPT, PWSH_SCRIPT, CMD_SCRIPT] {
            let path = dir.join(name);
            if path.exists() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        writeln!(ctx.out, "Removed {} alias script(s) from {}", removed, dir.display())?;
        Ok(())
    }
}

impl Command for InstallCommand {
    fn execute(&self, _args: &[String], ctx: &mut CommandContext<'_>) -> Result<i32> {
        match self.action {
            InstallAction::Load => {
                let script = match ctx.shell {
                    ShellType::Pwsh => pwsh_script(ctx.config),
                    ShellType::Cmd => cmd_script(ctx.config),
                    ShellType::Linux | ShellType::Unknown => bash_script(ctx.config),
                };
                write!(ctx.out, "{script}")?;
            }
            InstallAction::Install => {
                let dir = Self::install_dir(ctx.config)?;
                Self::install(ctx, &dir)?;
            }
            InstallAction::Remove => {
                let dir = Self::install_dir(ctx.config)?;
                Self::remove(ctx, &dir)?;
            }
            InstallAction::Refresh => {
                let dir = Self::install_dir(ctx.config)?;
                Self::remove(ctx, &dir)?;
                Self::install(ctx, &dir)?;
            }
        }
        Ok(0)
    }
}

/// Alias names safe to define as shell functions, sorted and de-duplicated
fn alias_names(config: &AliasConfig) -> BTreeSet<&str> {
    config
        .nx_packages
        .keys()
        .chain(config.expandable_commands.keys())
        .map(String::as_str)
        .filter(|name| is_function_name(name))
        .collect()
}

fn is_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn activation_hint(shell: ShellType) -> &'static str {
    match shell {
        ShellType::Pwsh => "pae load | Out-String | Invoke-Expression",
        ShellType::Cmd => "pae load > %TEMP%\\pae.cmd && call %TEMP%\\pae.cmd",
        ShellType::Linux | ShellType::Unknown => "eval \"$(pae load)\"",
    }
}

pub fn bash_script(config: &AliasConfig) -> String {
    let mut script = format!("# {HEADER}\n");
    for name in alias_names(config) {
        script.push_str(&format!("{name}() {{ pae {name} \"$@\"; }}\n"));
    }
    script
}

pub fn pwsh_script(config: &AliasConfig) -> String {
    let mut script = format!("# {HEADER}\n");
    for name in alias_names(config) {
        script.push_str(&format!("function {name} {{ pae {name} @args }}\n"));
    }
    script
}

pub fn cmd_script(config: &AliasConfig) -> String {
    let mut script = format!("@echo off\nrem {HEADER}\n");
    for name in alias_names(config) {
        script.push_str(&format!("doskey {name}=pae {name} $*\n"));
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::RecordingExecutor;
    use crate::shell::Environment;
    use tempfile::TempDir;

    fn config_with_dir(dir: &Path) -> AliasConfig {
        let mut config = AliasConfig::from_json(
            r#"{
                "nxPackages": {"pbc": "project-butler-core", "bad name": "x"},
                "expandable-commands": {"dc": "docker compose"}
            }"#,
        )
        .unwrap();
        config.settings.install_dir = Some(dir.to_path_buf());
        config
    }

    fn run(config: &AliasConfig, action: InstallAction, shell: ShellType) -> String {
        let executor = RecordingExecutor::default();
        let env = Environment::default();
        let mut out = Vec::new();
        {
            let mut ctx = CommandContext::new(config, &env, &executor, Box::new(&mut out))
                .with_shell(shell);
            assert_eq!(InstallCommand::new(action).execute(&[], &mut ctx).unwrap(), 0);
        }
        assert!(executor.commands().is_empty());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_scripts() {
        let config = config_with_dir(Path::new("/unused"));
        let bash = bash_script(&config);
        assert!(bash.contains("dc() { pae dc \"$@\"; }\n"));
        assert!(bash.contains("pbc() { pae pbc \"$@\"; }\n"));
        assert!(!bash.contains("bad name"));

        assert!(pwsh_script(&config).contains("function pbc { pae pbc @args }"));
        assert!(cmd_script(&config).contains("doskey dc=pae dc $*"));
    }

    #[test]
    fn test_install_remove_refresh() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("aliases");
        let config = config_with_dir(&dir);

        let out = run(&config, InstallAction::Install, ShellType::Linux);
        assert!(out.contains("Installed 2 aliases"));
        assert!(out.contains("eval \"$(pae load)\""));
        assert!(dir.join(BASH_SCRIPT).exists());
        assert!(dir.join(PWSH_SCRIPT).exists());
        assert!(dir.join(CMD_SCRIPT).exists());

        let out = run(&config, InstallAction::Refresh, ShellType::Linux);
        assert!(out.contains("Removed 3 alias script(s)"));
        assert!(dir.join(BASH_SCRIPT).exists());

        let out = run(&config, InstallAction::Remove, ShellType::Linux);
        assert!(out.contains("Removed 3 alias script(s)"));
        assert!(!dir.join(BASH_SCRIPT).exists());
    }

    #[test]
    fn test_load_prints_script_for_shell() {
        let config = config_with_dir(Path::new("/unused"));
        assert_eq!(run(&config, InstallAction::Load, ShellType::Pwsh), pwsh_script(&config));
        assert_eq!(run(&config, InstallAction::Load, ShellType::Linux), bash_script(&config));
        assert_eq!(run(&config, InstallAction::Load, ShellType::Cmd), cmd_script(&config));
    }

    #[test]
    fn test_from_verb() {
        assert_eq!(InstallAction::from_verb("refresh"), Some(InstallAction::Refresh));
        assert_eq!(InstallAction::from_verb("help"), None);
    }
}
