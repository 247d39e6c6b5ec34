//! SafeCommandExecutor: whitelisted, timeout-bounded external command execution
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only pre-approved commands can execute
//! - **Injection prevention**: Arguments are passed as a vector, never through a shell
//! - **Working directory validation**: Validates existence before execution
//! - **Timeout control**: The child is killed once the timeout elapses
//!
//! # Example
//!
//! ```rust,no_run
//! use types_registry_publisher::SafeCommandExecutor;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), types_registry_publisher::CommandError> {
//! let mut executor = SafeCommandExecutor::new(std::env::temp_dir())?;
//! executor.set_timeout(Duration::from_secs(30));
//!
//! let output = executor.execute("npm", &["--version"]).await?;
//! println!("{}", String::from_utf8_lossy(&output.stdout));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Allowed commands whitelist.
const ALLOWED_COMMANDS: &[&str] = &["npm"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command execution failed (e.g., binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Command exceeded the timeout duration
    #[error("Command timeout after {0:?}")]
    Timeout(Duration),
}

/// Safe command executor with security controls
#[derive(Debug)]
pub struct SafeCommandExecutor {
    /// Working directory where commands will be executed
    working_dir: PathBuf,
    /// Optional timeout for command execution
    timeout: Option<Duration>,
    /// Extra environment for the child process
    envs: HashMap<String, String>,
    /// Commands this executor may run
    allowed_commands: Vec<&'static str>,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self {
            working_dir,
            timeout: None,
            envs: HashMap::new(),
            allowed_commands: ALLOWED_COMMANDS.to_vec(),
        })
    }

    #[cfg(test)]
    fn with_allowed_commands<P: AsRef<Path>>(
        working_dir: P,
        extra: &[&'static str],
    ) -> Result<Self, CommandError> {
        let mut executor = Self::new(working_dir)?;
        executor.allowed_commands.extend_from_slice(extra);
        Ok(executor)
    }

    /// Set command execution timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Pass an environment variable to every executed command.
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.envs.insert(key.into(), value.into());
    }

    /// Execute a whitelisted command and capture its output.
    ///
    /// # Errors
    ///
    /// - `CommandError::CommandNotAllowed` - Command not in whitelist
    /// - `CommandError::ExecutionFailed` - Binary not found or execution error
    /// - `CommandError::Timeout` - Command ran longer than the configured timeout
    pub async fn execute<S: AsRef<OsStr>>(
        &self,
        command: &str,
        args: &[S],
    ) -> Result<Output, CommandError> {
        if !self.allowed_commands.iter().any(|allowed| *allowed == command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }

        // npm is a .cmd shim on Windows
        #[cfg(target_os = "windows")]
        let command_name = format!("{}.cmd", command);

        #[cfg(not(target_os = "windows"))]
        let command_name = command.to_string();

        let child = Command::new(&command_name)
            .args(args)
            .envs(&self.envs)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;

        let output = match self.timeout {
            // Dropping the timed-out future drops the child, which kills it.
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| CommandError::Timeout(timeout))?,
            None => child.wait_with_output().await,
        };

        output.map_err(|e| CommandError::ExecutionFailed(e.to_string()))
    }
}
