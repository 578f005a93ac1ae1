//! Logic of the `folio-solver` executable.
//!
//! Decodes a [`SolverRequest`] from stdin text, reshapes the covariance,
//! runs the optimizer and produces the [`SolverReport`] to print on stdout.
//! Everything diagnostic goes through `tracing`, which the binary routes
//! to stderr; that stream becomes the task log.

use folio_core::optimizer::{self, CovarianceMatrix, SolverError, SolverOptions};
use folio_core::wire::{
    self, SolvedAllocation, SolverFailureKind, SolverOutcome, SolverReport, SolverRequest,
};

/// Exit code for a solved request.
pub const EXIT_SOLVED: i32 = 0;

/// Exit code when a failure report was printed.
pub const EXIT_FAILED: i32 = 1;

/// Exit code when no report could be produced at all.
pub const EXIT_INTERNAL: i32 = 2;

/// Read solver options from `SOLVER_MAX_ITERATIONS` / `SOLVER_TOLERANCE`,
/// falling back to the optimizer defaults.
pub fn options_from_env() -> SolverOptions {
    let defaults = SolverOptions::default();
    let max_iterations = std::env::var("SOLVER_MAX_ITERATIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.max_iterations);
    let tolerance = std::env::var("SOLVER_TOLERANCE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.tolerance);
    SolverOptions {
        max_iterations,
        tolerance,
    }
}

/// Handle one request document and return the report to print.
pub fn handle_request(text: &str, options: &SolverOptions) -> SolverReport {
    let request = match wire::decode_request(text) {
        Ok(request) => request,
        Err(e) => {
            tracing::error!(error = %e, "Rejected solver request");
            return SolverReport::failed(SolverFailureKind::InvalidInput, e.to_string());
        }
    };

    match solve(request, options) {
        Ok(allocation) => SolverReport::solved(allocation),
        Err(e) => {
            tracing::error!(kind = ?e.kind(), "{e}");
            SolverReport::failed(e.kind(), e.to_string())
        }
    }
}

fn solve(request: SolverRequest, options: &SolverOptions) -> Result<SolvedAllocation, SolverError> {
    let n_assets = request.mu.len();
    tracing::info!(
        n_assets,
        target = request.target,
        max_iterations = options.max_iterations,
        "Starting minimum-variance optimization",
    );

    let cov = CovarianceMatrix::from_row_major(request.cov, n_assets)?;
    let solution = optimizer::optimize(&request.mu, &cov, request.target, options)?;

    tracing::info!(
        iterations = solution.iterations,
        variance = solution.variance,
        "Optimization converged",
    );
    tracing::info!("Optimal allocation:");
    for (i, w) in solution.weights.iter().enumerate() {
        tracing::info!("Asset {}: {:.2}%", i + 1, w * 100.0);
    }

    Ok(SolvedAllocation {
        weights: solution.weights,
        iterations: solution.iterations,
        variance: solution.variance,
    })
}

/// Exit code matching a report.
pub fn exit_code(report: &SolverReport) -> i32 {
    match report.outcome {
        SolverOutcome::Solved(_) => EXIT_SOLVED,
        SolverOutcome::Failed(_) => EXIT_FAILED,
    }
}
