//! `ProcessSandbox` against scripted stand-ins for the solver.

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use std::time::Duration;

use folio_core::optimization::OptimizationInputs;
use folio_worker::logs::{InMemoryLogStore, TaskLogStore, LOG_HEADER};
use folio_worker::sandbox::{ExecutionSandbox, ProcessSandbox, RunResult};
use uuid::Uuid;

/// Write an executable shell script to a temp file. Same as the helper in
/// `folio_core::scripting`, which is test-only and not visible here.
fn write_script(body: &str) -> tempfile::TempPath {
    let mut f = tempfile::Builder::new()
        .suffix(".sh")
        .tempfile()
        .expect("create temp file");
    writeln!(f, "#!/bin/sh").expect("write shebang");
    write!(f, "{body}").expect("write body");
    let path = f.into_temp_path();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");
    path
}

fn inputs() -> OptimizationInputs {
    OptimizationInputs {
        mu: vec![0.1, 0.2],
        cov: vec![0.05, 0.01, 0.01, 0.07],
        target: 0.15,
    }
}

async fn run_script(body: &str, timeout: Duration) -> (RunResult, Vec<String>) {
    let script = write_script(body);
    let logs = Arc::new(InMemoryLogStore::new());
    let sandbox = ProcessSandbox::new(script.to_string_lossy(), timeout, logs.clone());
    let task_id = Uuid::new_v4();

    let outcome = sandbox.run(task_id, inputs()).await;
    assert!(outcome.log_error.is_none());
    let stored = logs.read(task_id).await.expect("log written");
    assert_eq!(stored, outcome.logs);
    (outcome.result, stored)
}

#[tokio::test]
async fn script_reading_request_can_answer() {
    let body = r#"cat > /dev/null
echo "weights ready" >&2
echo '{"format":1,"outcome":{"solved":{"weights":[0.5,0.5],"iterations":3,"variance":0.035}}}'
"#;
    let (result, logs) = run_script(body, Duration::from_secs(5)).await;
    assert_eq!(
        result,
        RunResult::Completed {
            weights: vec![0.5, 0.5]
        }
    );
    assert_eq!(logs, vec![LOG_HEADER, "weights ready"]);
}

#[tokio::test]
async fn garbage_output_fails_but_keeps_logs() {
    let body = "cat > /dev/null\necho 'partial progress' >&2\necho '[0.5 0.5]'\n";
    let (result, logs) = run_script(body, Duration::from_secs(5)).await;
    match result {
        RunResult::Failed { error } => assert!(error.starts_with("unparsable solver output")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(logs, vec![LOG_HEADER, "partial progress"]);
}

#[tokio::test]
async fn nonzero_exit_is_reported() {
    let body = "cat > /dev/null\necho 'out of memory' >&2\nexit 3\n";
    let (result, _) = run_script(body, Duration::from_secs(5)).await;
    assert_eq!(
        result,
        RunResult::Failed {
            error: "solver exited with code 3: out of memory".into()
        }
    );
}

#[tokio::test]
async fn crash_by_signal_is_reported() {
    let body = "cat > /dev/null\nkill -SEGV $$\n";
    let (result, _) = run_script(body, Duration::from_secs(5)).await;
    assert_eq!(
        result,
        RunResult::Failed {
            error: "solver terminated by signal 11".into()
        }
    );
}

#[tokio::test]
async fn runaway_solver_is_killed_on_timeout() {
    let body = "cat > /dev/null\necho 'iterating' >&2\nexec sleep 30\n";
    let (result, logs) = run_script(body, Duration::from_millis(300)).await;
    match result {
        RunResult::Failed { error } => assert!(error.contains("timed out"), "{error}"),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(logs, vec![LOG_HEADER, "iterating"]);
}

#[tokio::test]
async fn unwritable_log_is_noted_without_changing_result() {
    let script = write_script("cat > /dev/null\nexit 3\n");
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let logs = Arc::new(folio_worker::logs::FileLogStore::new(blocker.path()));
    let sandbox = ProcessSandbox::new(script.to_string_lossy(), Duration::from_secs(5), logs);

    let outcome = sandbox.run(Uuid::new_v4(), inputs()).await;
    assert!(outcome.log_error.is_some());
    assert!(matches!(outcome.result, RunResult::Failed { .. }));
}
