//! `folio-solver` -- isolated minimum-variance solver process.
//!
//! Reads one JSON solver request from stdin, prints one JSON report on
//! stdout and exits. Diagnostics are written to stderr.
//!
//! # Environment variables
//!
//! | Variable                | Default | Description                          |
//! |-------------------------|---------|--------------------------------------|
//! | `SOLVER_LOG`            | `info`  | `tracing` filter for stderr output   |
//! | `SOLVER_MAX_ITERATIONS` | `10000` | Iteration cap before non-convergence |
//! | `SOLVER_TOLERANCE`      | `1e-10` | Stationarity tolerance               |
//! | `FOLIO_TASK_ID`         | --      | Task id, echoed in the log           |

use std::io::{Read, Write};

use folio_core::wire;
use folio_worker::solver_process;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("SOLVER_LOG")
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false),
        )
        .init();

    if let Ok(task_id) = std::env::var("FOLIO_TASK_ID") {
        tracing::info!(task_id = %task_id, "Solver process started");
    }

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        tracing::error!(error = %e, "Failed to read request from stdin");
        std::process::exit(solver_process::EXIT_INTERNAL);
    }

    let options = solver_process::options_from_env();
    let report = solver_process::handle_request(&input, &options);

    let encoded = match wire::encode_report(&report) {
        Ok(encoded) => encoded,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode solver report");
            std::process::exit(solver_process::EXIT_INTERNAL);
        }
    };

    let mut stdout = std::io::stdout().lock();
    if writeln!(stdout, "{encoded}").and_then(|()| stdout.flush()).is_err() {
        std::process::exit(solver_process::EXIT_INTERNAL);
    }

    std::process::exit(solver_process::exit_code(&report));
}
