//! Shell detection from an explicit environment snapshot

use std::collections::HashMap;
use std::fmt;

use crate::impl_case_insensitive_deserialize;

/// The family of shell `pae` was invoked from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellType {
    Pwsh,
    Linux,
    Cmd,
    Unknown,
}

impl_case_insensitive_deserialize!(
    ShellType,
    Pwsh => "pwsh",
    Pwsh => "powershell",
    Linux => "linux",
    Linux => "bash",
    Cmd => "cmd",
    Unknown => "unknown"
);

impl ShellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShellType::Pwsh => "pwsh",
            ShellType::Linux => "linux",
            ShellType::Cmd => "cmd",
            ShellType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ShellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only snapshot of environment variables
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Snapshot the current process environment
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }
}

const POWERSHELL_MARKERS: &[&str] = &[
    "PSModulePath",
    "POWERSHELL_DISTRIBUTION_CHANNEL",
    "PSExecutionPolicyPreference",
];

const POSIX_MARKERS: &[&str] = &["MSYS_ROOT", "MINGW_ROOT", "WSL_DISTRO_NAME", "WSLENV"];

/// Classify the invoking shell.
///
/// PowerShell markers are checked first, so an environment carrying both
/// PowerShell and POSIX markers is reported as PowerShell.
pub fn detect_shell(env: &Environment) -> ShellType {
    let vscode_pwsh =
        env.get("TERM_PROGRAM") == Some("vscode") && env.contains("PSModulePath");
    if vscode_pwsh || POWERSHELL_MARKERS.iter().any(|key| env.contains(key)) {
        tracing::debug!("Detected PowerShell from environment");
        return ShellType::Pwsh;
    }

    let bash_shell = env
        .get("SHELL")
        .is_some_and(|shell| shell.contains("bash") || shell.contains("git-bash"));
    if bash_shell || POSIX_MARKERS.iter().any(|key| env.contains(key)) {
        tracing::debug!("Detected POSIX shell from environment");
        return ShellType::Linux;
    }

    let cmd_exe = env
        .get("ComSpec")
        .is_some_and(|spec| spec.to_lowercase().ends_with("cmd.exe"));
    if cmd_exe && env.contains("PROMPT") {
        tracing::debug!("Detected cmd.exe from environment");
        return ShellType::Cmd;
    }

    ShellType::Unknown
}
