use std::collections::BTreeMap;
use std::io::Write;

use super::{Command, CommandContext};
use crate::config::ExpandableValue;
use crate::error::Result;

/// Prints usage and everything the loaded configuration declares
pub struct HelpCommand;

impl Command for HelpCommand {
    fn execute(&self, _args: &[String], ctx: &mut CommandContext<'_>) -> Result<i32> {
        let config = ctx.config;
        let out = &mut ctx.out;

        writeln!(out, "Usage: pae <alias|command> [target] [flags...] [-- passthrough args]")?;
        writeln!(out)?;
        writeln!(out, "Commands:")?;
        writeln!(out, "  install    Write shell alias scripts for every alias")?;
        writeln!(out, "  remove     Delete the generated alias scripts")?;
        writeln!(out, "  refresh    Remove and reinstall the alias scripts")?;
        writeln!(out, "  load       Print the alias script for the current shell")?;
        writeln!(out, "  help       Show this message")?;

        if !config.nx_packages.is_empty() {
            writeln!(out)?;
            writeln!(out, "Aliases:")?;
            for (alias, definition) in &config.nx_packages {
                writeln!(out, "  {:<10} {}", alias, definition.projects().join(", "))?;
            }
        }

        if !config.nx_targets.is_empty() {
            writeln!(out)?;
            writeln!(out, "Targets:")?;
            for (shortcut, target) in &config.nx_targets {
                writeln!(out, "  {:<10} {}", shortcut, target)?;
            }
        }

        if !config.expandable_commands.is_empty() {
            writeln!(out)?;
            writeln!(out, "Expandable commands:")?;
            for (name, execution) in &config.expandable_commands {
                writeln!(out, "  {:<10} {}", name, execution)?;
            }
        }

        let sections = [
            ("Flags", &config.expandable_flags),
            ("Context-aware flags", &config.context_aware_flags),
            ("Environment flags", &config.env_setting_flags),
            ("Internal flags", &config.internal_flags),
        ];
        for (title, flags) in sections {
            write_flags(&mut *out, title, flags)?;
        }

        writeln!(out)?;
        writeln!(out, "Detected shell: {}", ctx.shell)?;
        Ok(0)
    }
}

fn write_flags(
    out: &mut dyn Write,
    title: &str,
    flags: &BTreeMap<String, ExpandableValue>,
) -> Result<()> {
    if flags.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    writeln!(out, "{title}:")?;
    for (flag, value) in flags {
        let summary = match value {
            ExpandableValue::Literal(text) => text.as_str(),
            ExpandableValue::Template(_) => value.description().unwrap_or(""),
        };
        writeln!(out, "  --{:<16} {}", flag, summary)?;
    }
    Ok(())
}
