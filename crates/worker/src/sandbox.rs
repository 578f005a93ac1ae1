//! Execution sandbox: one solver process per task.
//!
//! [`ProcessSandbox`] serializes the task inputs into the wire request,
//! runs the `folio-solver` binary, interprets its report and exit status,
//! and stores the captured stderr as the task log before returning. The
//! child shares no memory with the engine, so a crash or a runaway solve
//! only ever fails its own task.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use folio_core::optimization::OptimizationInputs;
use folio_core::scripting::binary;
use folio_core::scripting::process::{ProcessError, ProcessInput, ProcessOutput};
use folio_core::types::TaskId;
use folio_core::wire::{
    self, SolverFailure, SolverFailureKind, SolverOutcome, SolverReport, SolverRequest, WireError,
};

use crate::config::EngineConfig;
use crate::logs::{log_lines, TaskLogStore};

/// Terminal result of one sandboxed run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunResult {
    Completed { weights: Vec<f64> },
    Failed { error: String },
}

/// Everything the engine needs to finalize a task.
#[derive(Debug, Clone)]
pub struct SandboxOutcome {
    pub result: RunResult,
    /// Diagnostic lines as written to the log store.
    pub logs: Vec<String>,
    /// Set when the log could not be stored.
    pub log_error: Option<String>,
}

impl SandboxOutcome {
    /// Outcome for a run that ended before the sandbox could report.
    pub fn aborted(reason: impl std::fmt::Display) -> Self {
        Self {
            result: RunResult::Failed {
                error: format!("sandbox aborted: {reason}"),
            },
            logs: Vec::new(),
            log_error: Some("no diagnostic log was recorded".to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("failed to encode solver request: {0}")]
    Encode(WireError),

    #[error("failed to run solver: {0}")]
    Launch(#[from] ProcessError),

    #[error("solver terminated by signal {0}")]
    Crashed(i32),

    #[error("solver exited with code {exit_code}: {detail}")]
    Exited { exit_code: i32, detail: String },

    #[error("solver failed ({kind:?}): {message}")]
    Solver {
        kind: SolverFailureKind,
        message: String,
    },

    #[error("unparsable solver output: {0}")]
    Unparsable(WireError),

    #[error("solver returned {found} weights for {expected} assets")]
    WrongLength { expected: usize, found: usize },
}

impl From<SolverFailure> for SandboxError {
    fn from(failure: SolverFailure) -> Self {
        Self::Solver {
            kind: failure.kind,
            message: failure.message,
        }
    }
}

/// Runs one optimization in isolation.
#[async_trait]
pub trait ExecutionSandbox: Send + Sync {
    async fn run(&self, task_id: TaskId, inputs: OptimizationInputs) -> SandboxOutcome;
}

/// Sandbox backed by a child process.
pub struct ProcessSandbox {
    solver_path: String,
    timeout: Duration,
    report_delay: Duration,
    logs: Arc<dyn TaskLogStore>,
}

impl ProcessSandbox {
    pub fn new(solver_path: impl Into<String>, timeout: Duration, logs: Arc<dyn TaskLogStore>) -> Self {
        Self {
            solver_path: solver_path.into(),
            timeout,
            report_delay: Duration::ZERO,
            logs,
        }
    }

    pub fn from_config(config: &EngineConfig, logs: Arc<dyn TaskLogStore>) -> Self {
        Self::new(
            config.solver_path.to_string_lossy(),
            config.solver_timeout,
            logs,
        )
        .with_report_delay(config.report_delay)
    }

    /// Hold the result for `delay` after the solve finishes.
    pub fn with_report_delay(mut self, delay: Duration) -> Self {
        self.report_delay = delay;
        self
    }

    /// Run the solver and return its result plus whatever stderr it wrote.
    async fn solve(
        &self,
        task_id: TaskId,
        inputs: &OptimizationInputs,
    ) -> (Result<Vec<f64>, SandboxError>, String) {
        let request = match wire::encode_request(&SolverRequest::from(inputs)) {
            Ok(request) => request,
            Err(e) => return (Err(SandboxError::Encode(e)), String::new()),
        };

        let input = ProcessInput {
            stdin: request,
            env_vars: vec![("FOLIO_TASK_ID".to_string(), task_id.to_string())],
            working_directory: None,
            timeout: self.timeout,
        };

        match binary::run_binary(&self.solver_path, &[], input).await {
            Ok(output) => {
                tracing::debug!(
                    exit_code = output.exit_code,
                    duration_ms = output.duration_ms,
                    "Solver process finished",
                );
                let result = interpret_output(&output, inputs.n_assets());
                (result, output.stderr)
            }
            Err(e) => {
                let stderr = e.captured_stderr().to_string();
                (Err(e.into()), stderr)
            }
        }
    }
}

#[async_trait]
impl ExecutionSandbox for ProcessSandbox {
    async fn run(&self, task_id: TaskId, inputs: OptimizationInputs) -> SandboxOutcome {
        let (result, stderr) = self.solve(task_id, &inputs).await;

        if !self.report_delay.is_zero() {
            tokio::time::sleep(self.report_delay).await;
        }

        let logs = log_lines(&stderr);
        let log_error = match self.logs.write(task_id, &logs).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(%task_id, error = %e, "Failed to store task log");
                Some(e.to_string())
            }
        };

        let result = match result {
            Ok(weights) => RunResult::Completed { weights },
            Err(e) => {
                tracing::warn!(%task_id, error = %e, "Solver run failed");
                RunResult::Failed {
                    error: e.to_string(),
                }
            }
        };

        SandboxOutcome {
            result,
            logs,
            log_error,
        }
    }
}

/// Classify a finished solver process.
///
/// A decodable failure report wins over the exit code because it carries
/// the solver's own explanation. Otherwise a signal or non-zero exit is a
/// failure, and a clean exit must come with a well-formed solved report.
pub fn interpret_output(output: &ProcessOutput, n_assets: usize) -> Result<Vec<f64>, SandboxError> {
    let decoded = match wire::decode_report(&output.stdout) {
        Ok(SolverReport {
            outcome: SolverOutcome::Failed(failure),
            ..
        }) => return Err(failure.into()),
        other => other,
    };

    if !output.success() {
        return Err(match output.signal {
            Some(signal) => SandboxError::Crashed(signal),
            None => SandboxError::Exited {
                exit_code: output.exit_code,
                detail: last_diagnostic(&output.stderr),
            },
        });
    }

    match decoded.map_err(SandboxError::Unparsable)?.outcome {
        SolverOutcome::Solved(allocation) if allocation.weights.len() == n_assets => {
            Ok(allocation.weights)
        }
        SolverOutcome::Solved(allocation) => Err(SandboxError::WrongLength {
            expected: n_assets,
            found: allocation.weights.len(),
        }),
        SolverOutcome::Failed(failure) => Err(failure.into()),
    }
}

fn last_diagnostic(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no diagnostic output")
        .to_string()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use folio_core::wire::{encode_report, SolvedAllocation};

    use super::*;

    fn output(stdout: &str, stderr: &str, exit_code: i32) -> ProcessOutput {
        ProcessOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
            signal: None,
            duration_ms: 1,
        }
    }

    fn solved(weights: &[f64]) -> String {
        encode_report(&SolverReport::solved(SolvedAllocation {
            weights: weights.to_vec(),
            iterations: 1,
            variance: 0.0,
        }))
        .unwrap()
    }

    #[test]
    fn clean_exit_with_report_completes() {
        let weights = interpret_output(&output(&solved(&[0.5, 0.5]), "", 0), 2).unwrap();
        assert_eq!(weights, vec![0.5, 0.5]);
    }

    #[test]
    fn failure_report_carries_solver_message() {
        let report = encode_report(&SolverReport::failed(
            SolverFailureKind::ShapeMismatch,
            "shape mismatch: cannot reshape 4 covariance values into a 3x3 matrix",
        ))
        .unwrap();
        let err = interpret_output(&output(&report, "", 1), 3).unwrap_err();
        assert_matches!(err, SandboxError::Solver { kind: SolverFailureKind::ShapeMismatch, .. });
        assert!(err.to_string().contains("shape mismatch"));
    }

    #[test]
    fn nonzero_exit_without_report_uses_last_stderr_line() {
        let err = interpret_output(&output("", "booting\npanicked at solver\n\n", 101), 2)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "solver exited with code 101: panicked at solver"
        );
    }

    #[test]
    fn signal_is_a_crash() {
        let mut out = output(&solved(&[1.0]), "", -1);
        out.signal = Some(11);
        assert_matches!(interpret_output(&out, 1), Err(SandboxError::Crashed(11)));
    }

    #[test]
    fn clean_exit_with_garbage_is_unparsable() {
        let err = interpret_output(&output("[0.5 0.5]", "", 0), 2).unwrap_err();
        assert_matches!(err, SandboxError::Unparsable(_));
    }

    #[test]
    fn weight_count_must_match_assets() {
        let err = interpret_output(&output(&solved(&[1.0]), "", 0), 2).unwrap_err();
        assert_matches!(err, SandboxError::WrongLength { expected: 2, found: 1 });
    }
}
