//! Binary executable runner.
//!
//! Runs a pre-compiled binary directly (not through a shell). Validates
//! that the file exists and has execute permissions before spawning.

use std::os::unix::fs::PermissionsExt;

use super::process::{ProcessError, ProcessInput, ProcessOutput};
use super::subprocess;

/// Run the executable at `binary_path` with `args`.
pub async fn run_binary(
    binary_path: &str,
    args: &[&str],
    input: ProcessInput,
) -> Result<ProcessOutput, ProcessError> {
    let metadata = tokio::fs::metadata(binary_path)
        .await
        .map_err(|_| ProcessError::NotFound(binary_path.to_string()))?;

    let mode = metadata.permissions().mode();
    if !metadata.is_file() || mode & 0o111 == 0 {
        return Err(ProcessError::PermissionDenied(format!(
            "{binary_path} is not an executable file (mode {mode:#o})"
        )));
    }

    let mut cmd = tokio::process::Command::new(binary_path);
    cmd.args(args);
    subprocess::run_command(&mut cmd, input).await
}
