//! Job manager: admit, dispatch, finalize and query optimization tasks.
//!
//! ```text
//! submit -> validate -> [lock: gate.try_acquire + insert record] -> spawn
//!                                                                    |
//!           [lock: record.finish + gate.release] <- sandbox.run <----+
//! ```

use std::sync::Arc;

use folio_core::error::CoreError;
use folio_core::optimization::{validate_submission, OptimizationInputs, SubmitOptimization};
use folio_core::types::TaskId;
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::engine::gate::AdmissionGate;
use crate::engine::registry::{TaskRecord, TaskRegistry, TaskView};
use crate::logs::TaskLogStore;
use crate::sandbox::{ExecutionSandbox, SandboxOutcome};

/// State shared by every clone of a [`JobManager`].
#[derive(Debug, Default)]
struct EngineState {
    gate: AdmissionGate,
    registry: TaskRegistry,
}

/// Single-slot job manager.
///
/// Cheap to clone; clones share the same registry and gate.
#[derive(Clone)]
pub struct JobManager {
    state: Arc<Mutex<EngineState>>,
    sandbox: Arc<dyn ExecutionSandbox>,
    logs: Arc<dyn TaskLogStore>,
}

impl JobManager {
    pub fn new(sandbox: Arc<dyn ExecutionSandbox>, logs: Arc<dyn TaskLogStore>) -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState::default())),
            sandbox,
            logs,
        }
    }

    /// Validate and admit an optimization, then start it in the background.
    ///
    /// Returns the new task id immediately. Validation errors and admission
    /// rejections leave no trace: no record is created and the gate is not
    /// touched.
    pub async fn submit(&self, request: SubmitOptimization) -> Result<TaskId, CoreError> {
        let inputs = validate_submission(request)?;
        let task_id = TaskId::new_v4();

        {
            let mut state = self.state.lock().await;
            if !state.gate.try_acquire(task_id) {
                tracing::info!("Optimization rejected: another task is running");
                return Err(CoreError::AdmissionRejected);
            }
            state
                .registry
                .insert(TaskRecord::running(task_id, inputs.clone()));
        }

        tracing::info!(
            %task_id,
            n_assets = inputs.n_assets(),
            target = inputs.target,
            "Optimization admitted",
        );

        let manager = self.clone();
        let span = tracing::info_span!("optimization", %task_id);
        tokio::spawn(manager.execute(task_id, inputs).instrument(span));

        Ok(task_id)
    }

    /// Run the sandbox for an admitted task and finalize it.
    ///
    /// The sandbox runs in its own task so that a panic inside it surfaces
    /// as a join error here instead of skipping finalization.
    async fn execute(self, task_id: TaskId, inputs: OptimizationInputs) {
        let sandbox = Arc::clone(&self.sandbox);
        let handle = tokio::spawn(
            async move { sandbox.run(task_id, inputs).await }.in_current_span(),
        );

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Sandbox task aborted");
                SandboxOutcome::aborted(e)
            }
        };

        self.finalize(task_id, outcome).await;
    }

    /// Write the terminal state and free the gate in one critical section.
    async fn finalize(&self, task_id: TaskId, outcome: SandboxOutcome) {
        let mut state = self.state.lock().await;

        match state.registry.get_mut(&task_id) {
            Some(record) => match record.finish(outcome) {
                Ok(()) => tracing::info!(status = %record.status, "Optimization finished"),
                Err(e) => tracing::error!(error = %e, "Rejected task state transition"),
            },
            None => tracing::error!("Finalizing a task missing from the registry"),
        }

        if !state.gate.release(task_id) {
            tracing::warn!("Admission gate was not held by the finishing task");
        }
    }

    /// Sanitized snapshot of a task.
    ///
    /// Terminal tasks carry their stored log; if it cannot be read the view
    /// reports `log_error` instead of failing the query, along with any lines
    /// the sandbox captured but could not store.
    pub async fn query(&self, task_id: TaskId) -> Result<TaskView, CoreError> {
        let mut record = {
            let state = self.state.lock().await;
            state
                .registry
                .get(&task_id)
                .cloned()
                .ok_or_else(|| CoreError::task_not_found(task_id))?
        };

        let terminal = record.status.is_terminal();
        let unstored = record.unstored_logs.take();
        let mut view = TaskView::sanitized(record);

        if terminal {
            match self.logs.read(task_id).await {
                Ok(lines) => view.logs = Some(lines),
                Err(e) => {
                    tracing::debug!(%task_id, error = %e, "Task log unavailable");
                    if view.log_error.is_none() {
                        view.log_error = Some(e.to_string());
                    }
                    view.logs = unstored;
                }
            }
        }

        Ok(view)
    }

    /// Whether a task currently holds the admission gate.
    pub async fn is_busy(&self) -> bool {
        self.state.lock().await.gate.is_held()
    }
}
