//! Process command generation and execution

pub mod executor;
pub mod process;

// Re-export commonly used types
pub use executor::{CommandExecutor, ProcessExecutor, TIMEOUT_EXIT_CODE};
pub use process::{ProcessCommand, quote_arg, wrap_for_shell};
