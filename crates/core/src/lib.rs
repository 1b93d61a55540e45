//! pae-core - alias expansion and dispatch engine
//!
//! This crate provides functionality to:
//! - Load alias configuration (packages, targets, expandable commands and flags)
//! - Expand declarative flags into shell-specific command fragments
//! - Resolve a user-typed token into a reserved command, expandable command or package alias
//! - Dispatch the resolved command to a child process and report its exit code
pub mod command;
pub mod commands;
pub mod config;
pub mod error;
pub mod flags;
pub mod resolve;
pub mod shell;
pub mod template;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Error, Result};

// Re-export main API components
pub use command::{CommandExecutor, ProcessCommand, ProcessExecutor};
pub use commands::{CommandContext, route_alias, route_command};
pub use config::{AliasConfig, ExpandableValue, PackageDefinition, Position};
pub use flags::{FlagExpansion, FlagProcessor, ParsedFlag};
pub use resolve::{CommandResolution, resolve_command};
pub use shell::{Environment, ShellType, detect_shell};
