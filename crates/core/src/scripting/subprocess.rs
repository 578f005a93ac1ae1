//! Spawn + I/O + timeout handling for child processes.
//!
//! [`run_command`] takes a prepared [`tokio::process::Command`], pipes the
//! input payload to stdin, captures stdout and stderr on separate tasks and
//! enforces the configured timeout.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use super::process::{ProcessError, ProcessInput, ProcessOutput};

/// Maximum stdout or stderr size captured per stream (10 MiB).
///
/// Output beyond this limit is truncated to bound memory use.
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// How long to keep reading stderr after killing a timed-out child.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Spawn `cmd`, write `input.stdin`, capture stdout/stderr and enforce the
/// timeout.
///
/// The caller sets the program and arguments. Environment variables and the
/// working directory from [`ProcessInput`] are applied here. A non-zero exit
/// is not an error at this level; callers inspect [`ProcessOutput`].
pub async fn run_command(
    cmd: &mut Command,
    input: ProcessInput,
) -> Result<ProcessOutput, ProcessError> {
    // `kill_on_drop(true)` ensures the child dies with its handle.
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, value) in &input.env_vars {
        cmd.env(key, value);
    }

    if let Some(dir) = &input.working_directory {
        cmd.current_dir(dir);
    }

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(ProcessError::IoError)?;

    // Feed stdin on its own task so a child that never reads cannot stall
    // us before the timeout starts. A short write is reported through the
    // child's exit status, not here.
    let stdin_handle = child.stdin.take();
    let payload = input.stdin;
    let stdin_task = tokio::spawn(async move {
        if let Some(mut stdin) = stdin_handle {
            let _ = stdin.write_all(payload.as_bytes()).await;
        }
    });

    // Drain both pipes concurrently so a chatty child cannot block on a
    // full pipe while we wait on it.
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_task = tokio::spawn(async move { read_stream(stdout_handle).await });
    let stderr_task = tokio::spawn(async move { read_stream(stderr_handle).await });

    let wait_result = tokio::time::timeout(input.timeout, child.wait()).await;

    match wait_result {
        Ok(Ok(status)) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            let stdout_bytes = stdout_task.await.unwrap_or_default();
            let stderr_bytes = stderr_task.await.unwrap_or_default();

            Ok(ProcessOutput {
                stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
                stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
                exit_code: status.code().unwrap_or(-1),
                signal: exit_signal(&status),
                duration_ms,
            })
        }
        Ok(Err(e)) => Err(ProcessError::IoError(e)),
        Err(_elapsed) => {
            stdin_task.abort();
            let _ = child.kill().await;
            // Grandchildren may still hold the pipe open; don't wait on them.
            let stderr_bytes = match tokio::time::timeout(DRAIN_GRACE, stderr_task).await {
                Ok(Ok(bytes)) => bytes,
                _ => Vec::new(),
            };
            stdout_task.abort();
            Err(ProcessError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
                stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
            })
        }
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h)
            .take(MAX_OUTPUT_BYTES as u64)
            .read_to_end(&mut buf)
            .await;
    }
    buf
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;
    use crate::scripting::test_helpers::default_input;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn stdin_payload_reaches_child() {
        let output = run_command(&mut sh("cat"), default_input())
            .await
            .expect("run");
        assert!(output.success());
        assert!(output.stdout.contains("key"));
    }

    #[tokio::test]
    async fn stdout_and_stderr_are_kept_apart() {
        let output = run_command(&mut sh("echo out; echo err >&2"), default_input())
            .await
            .expect("run");
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_not_raised() {
        let output = run_command(&mut sh("exit 42"), default_input())
            .await
            .expect("run");
        assert_eq!(output.exit_code, 42);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn signal_death_is_reported() {
        let output = run_command(&mut sh("kill -9 $$"), default_input())
            .await
            .expect("run");
        assert_eq!(output.signal, Some(9));
        assert_eq!(output.exit_code, -1);
    }

    #[tokio::test]
    async fn env_vars_are_applied() {
        let mut input = default_input();
        input.env_vars = vec![("FOLIO_TEST_VAR".to_string(), "hello".to_string())];
        let output = run_command(&mut sh("echo $FOLIO_TEST_VAR"), input)
            .await
            .expect("run");
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn timeout_kills_child_and_keeps_partial_stderr() {
        let mut input = default_input();
        input.timeout = Duration::from_millis(200);
        let result = run_command(&mut sh("echo started >&2; exec sleep 60"), input).await;
        assert_matches!(result, Err(ProcessError::Timeout { ref stderr, .. }) if stderr.contains("started"));
    }

    #[tokio::test]
    async fn timeout_applies_while_child_ignores_large_stdin() {
        let mut input = default_input();
        // Well past the pipe buffer, so the write cannot complete.
        input.stdin = "x".repeat(4 * 1024 * 1024);
        input.timeout = Duration::from_millis(300);

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            run_command(&mut sh("exec sleep 60"), input),
        )
        .await
        .expect("run_command must honour its own timeout");
        assert_matches!(result, Err(ProcessError::Timeout { .. }));
    }
}
