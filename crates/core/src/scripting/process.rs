//! Process input/output types shared by the spawner and its callers.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Input handed to a child process.
#[derive(Debug, Clone)]
pub struct ProcessInput {
    /// Payload written to the child's stdin, which is then closed.
    pub stdin: String,
    /// Additional environment variables set for the child process.
    pub env_vars: Vec<(String, String)>,
    /// Working directory for the child process (uses current dir if `None`).
    pub working_directory: Option<String>,
    /// Maximum wall-clock time before the process is killed.
    pub timeout: Duration,
}

/// Captured output from a finished child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// Complete stdout captured from the process.
    pub stdout: String,
    /// Complete stderr captured from the process.
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Terminating signal, when the process did not exit normally.
    pub signal: Option<i32>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && self.signal.is_none()
    }
}

/// Errors that prevent a process from producing a [`ProcessOutput`].
#[derive(Debug)]
pub enum ProcessError {
    /// The binary was not found at the specified path.
    NotFound(String),
    /// The binary exists but lacks execute permissions.
    PermissionDenied(String),
    /// The process exceeded its timeout and was killed.
    Timeout {
        /// Elapsed wall-clock time before the process was killed.
        elapsed_ms: u64,
        /// Stderr captured before the kill.
        stderr: String,
    },
    /// An I/O error occurred while spawning or communicating with the process.
    IoError(std::io::Error),
}

impl ProcessError {
    /// Diagnostic output captured before the failure, if any.
    pub fn captured_stderr(&self) -> &str {
        match self {
            Self::Timeout { stderr, .. } => stderr,
            _ => "",
        }
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "Binary not found: {path}"),
            Self::PermissionDenied(path) => write!(f, "Permission denied: {path}"),
            Self::Timeout { elapsed_ms, .. } => {
                write!(f, "Process timed out after {elapsed_ms}ms")
            }
            Self::IoError(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}
