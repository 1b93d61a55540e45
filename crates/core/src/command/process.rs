use std::process::Command;

use crate::shell::ShellType;

/// A fully resolved child-process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<String>,
    pub env: Vec<(String, String)>,
}

impl ProcessCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
            env: Vec::new(),
        }
    }

    /// Build from an argv whose first element is the program
    pub fn from_argv(mut argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            return None;
        }
        let program = argv.remove(0);
        Some(Self::new(program, argv))
    }

    pub fn with_working_dir(mut self, dir: String) -> Self {
        self.working_dir = Some(dir);
        self
    }

    pub fn with_env(mut self, key: String, value: String) -> Self {
        self.env.push((key, value));
        self
    }

    pub fn with_envs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(pairs);
        self
    }

    /// Render as a POSIX command line that can be pasted back into a shell
    pub fn to_shell_command(&self) -> String {
        let mut cmd = quote_arg(&self.program, ShellType::Linux);
        for arg in &self.args {
            cmd.push(' ');
            cmd.push_str(&quote_arg(arg, ShellType::Linux));
        }
        cmd
    }

    /// Translate into a `std::process::Command` with env and working dir applied
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        // Set working directory if specified
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &self.env {
            tracing::debug!("Setting env: {}={}", key, value);
            cmd.env(key, value);
        }

        cmd
    }
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_-.,/:=+@%".contains(c)
}

/// Quote one argument so `shell` reads it back as a single word
pub fn quote_arg(arg: &str, shell: ShellType) -> String {
    if !arg.is_empty() && arg.chars().all(is_shell_safe) {
        return arg.to_string();
    }
    match shell {
        ShellType::Pwsh => format!("'{}'", arg.replace('\'', "''")),
        ShellType::Cmd => format!("\"{}\"", arg.replace('"', "\"\"")),
        ShellType::Linux | ShellType::Unknown => format!("'{}'", arg.replace('\'', "'\\''")),
    }
}

/// Run `fragments` as one command line inside `shell`.
///
/// Fragments are joined with spaces and handed to the shell unquoted, so
/// shell syntax produced by templates (`;`, `&&`, `$env:`) keeps its meaning.
pub fn wrap_for_shell(fragments: &[String], shell: ShellType) -> ProcessCommand {
    let script = fragments.join(" ");
    match shell {
        ShellType::Pwsh => ProcessCommand::new(
            "pwsh",
            vec!["-NoProfile".to_string(), "-Command".to_string(), script],
        ),
        ShellType::Cmd => ProcessCommand::new("cmd", vec!["/C".to_string(), script]),
        ShellType::Linux | ShellType::Unknown => {
            ProcessCommand::new("sh", vec!["-c".to_string(), script])
        }
    }
}
