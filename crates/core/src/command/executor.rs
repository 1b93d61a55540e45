//! Child-process execution
//!
//! The executor is the only place where a hard failure can occur. Every
//! other failure surfaces as an exit code.

use std::process::Child;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use super::ProcessCommand;
use crate::config::Settings;
use crate::error::{Error, Result};

/// Exit code reported when a child is killed for exceeding its timeout
pub const TIMEOUT_EXIT_CODE: i32 = 124;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs process commands and reports their exit codes
pub trait CommandExecutor: Send + Sync {
    /// Run one command and wait for it
    fn execute(&self, command: &ProcessCommand) -> Result<i32>;

    /// Run several commands; the result is the first non-zero exit code in
    /// input order, or 0
    fn execute_many(&self, commands: &[ProcessCommand]) -> Result<i32> {
        for command in commands {
            let code = self.execute(command)?;
            if code != 0 {
                return Ok(code);
            }
        }
        Ok(0)
    }
}

/// Executor backed by real OS processes
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Option<Duration>,
    max_concurrency: usize,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self {
            timeout: None,
            max_concurrency: 4,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new()
            .with_timeout(settings.timeout_ms.map(Duration::from_millis))
            .with_max_concurrency(settings.max_concurrency())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    fn wait(&self, mut child: Child, shell_cmd: &str) -> Result<i32> {
        let Some(timeout) = self.timeout else {
            return Ok(exit_code(child.wait()?));
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(exit_code(status));
            }
            if Instant::now() >= deadline {
                tracing::warn!("Timed out after {:?}, killing: {}", timeout, shell_cmd);
                // The child may have exited between try_wait and kill
                let _ = child.kill();
                child.wait()?;
                return Ok(TIMEOUT_EXIT_CODE);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Signal-terminated children have no code; report them as a plain failure
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

impl CommandExecutor for ProcessExecutor {
    fn execute(&self, command: &ProcessCommand) -> Result<i32> {
        let shell_cmd = command.to_shell_command();
        tracing::info!("Running: {}", shell_cmd);

        let child = command.to_command().spawn().map_err(|source| Error::Spawn {
            program: command.program.clone(),
            source,
        })?;

        let code = self.wait(child, &shell_cmd)?;
        tracing::debug!("Exited with {}: {}", code, shell_cmd);
        Ok(code)
    }

    fn execute_many(&self, commands: &[ProcessCommand]) -> Result<i32> {
        if commands.len() <= 1 || self.max_concurrency == 1 {
            for command in commands {
                let code = self.execute(command)?;
                if code != 0 {
                    return Ok(code);
                }
            }
            return Ok(0);
        }

        let next = AtomicUsize::new(0);
        let results: Mutex<Vec<Option<Result<i32>>>> =
            Mutex::new((0..commands.len()).map(|_| None).collect());
        let workers = self.max_concurrency.min(commands.len());

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(command) = commands.get(index) else {
                            break;
                        };
                        let result = self.execute(command);
                        if let Ok(mut slots) = results.lock() {
                            slots[index] = Some(result);
                        }
                    }
                });
            }
        });

        let slots = results
            .into_inner()
            .map_err(|_| Error::Other("process pool result lock poisoned".to_string()))?;
        let mut first_failure = 0;
        for slot in slots {
            let code = slot.unwrap_or(Ok(1))?;
            if first_failure == 0 && code != 0 {
                first_failure = code;
            }
        }
        Ok(first_failure)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ProcessCommand {
        ProcessCommand::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_exit_code_propagates() {
        let executor = ProcessExecutor::new();
        assert_eq!(executor.execute(&sh("exit 0")).unwrap(), 0);
        assert_eq!(executor.execute(&sh("exit 3")).unwrap(), 3);
    }

    #[test]
    fn test_env_reaches_child() {
        let executor = ProcessExecutor::new();
        let command = sh("exit $PAE_TEST_CODE").with_env("PAE_TEST_CODE".into(), "7".into());
        assert_eq!(executor.execute(&command).unwrap(), 7);
    }

    #[test]
    fn test_timeout_kills_child() {
        let executor = ProcessExecutor::new().with_timeout(Some(Duration::from_millis(100)));
        let started = Instant::now();
        assert_eq!(executor.execute(&sh("sleep 5")).unwrap(), TIMEOUT_EXIT_CODE);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_spawn_failure_is_an_error() {
        let executor = ProcessExecutor::new();
        let command = ProcessCommand::new("pae-definitely-missing-binary", Vec::new());
        assert!(matches!(executor.execute(&command), Err(Error::Spawn { .. })));
    }

    #[test]
    fn test_execute_many_reports_first_failure_in_order() {
        let executor = ProcessExecutor::new().with_max_concurrency(2);
        let commands = vec![sh("exit 0"), sh("sleep 0.2; exit 2"), sh("exit 3"), sh("exit 0")];
        assert_eq!(executor.execute_many(&commands).unwrap(), 2);

        let all_ok = vec![sh("exit 0"), sh("exit 0"), sh("exit 0")];
        assert_eq!(executor.execute_many(&all_ok).unwrap(), 0);
    }

    #[test]
    fn test_execute_many_sequential() {
        let executor = ProcessExecutor::new().with_max_concurrency(1);
        let commands = vec![sh("exit 0"), sh("exit 5"), sh("exit 6")];
        assert_eq!(executor.execute_many(&commands).unwrap(), 5);
    }
}
