use std::path::PathBuf;
use std::time::Duration;

/// Name of the solver executable shipped alongside the API binary.
pub const SOLVER_BINARY_NAME: &str = "folio-solver";

/// Job engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the solver executable.
    pub solver_path: PathBuf,
    /// Directory holding per-task log files.
    pub log_dir: PathBuf,
    /// Wall-clock limit for one solver process.
    pub solver_timeout: Duration,
    /// Pause between the solve and its finalization. Zero in production;
    /// an operational knob rather than part of the task contract.
    pub report_delay: Duration,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                                 |
    /// |--------------------------|-----------------------------------------|
    /// | `SOLVER_BIN`             | `folio-solver` next to the current exe  |
    /// | `LOG_DIR`                | `logs`                                  |
    /// | `SOLVER_TIMEOUT_SECS`    | `300`                                   |
    /// | `SOLVER_REPORT_DELAY_MS` | `0`                                     |
    pub fn from_env() -> Self {
        let solver_path = std::env::var("SOLVER_BIN")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_solver_path());

        let log_dir = std::env::var("LOG_DIR")
            .unwrap_or_else(|_| "logs".into())
            .into();

        let solver_timeout_secs: u64 = std::env::var("SOLVER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("SOLVER_TIMEOUT_SECS must be a valid u64");

        let report_delay_ms: u64 = std::env::var("SOLVER_REPORT_DELAY_MS")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("SOLVER_REPORT_DELAY_MS must be a valid u64");

        Self {
            solver_path,
            log_dir,
            solver_timeout: Duration::from_secs(solver_timeout_secs),
            report_delay: Duration::from_millis(report_delay_ms),
        }
    }
}

fn default_solver_path() -> PathBuf {
    std::env::current_exe()
        .map(|exe| exe.with_file_name(SOLVER_BINARY_NAME))
        .unwrap_or_else(|_| PathBuf::from(SOLVER_BINARY_NAME))
}
