//! Task lifecycle records and their sanitized read view.

use std::collections::HashMap;

use folio_core::optimization::OptimizationInputs;
use folio_core::task::TaskStatus;
use folio_core::types::{TaskId, Timestamp};
use serde::Serialize;

use crate::sandbox::{RunResult, SandboxOutcome};

/// Registry entry for one submitted optimization.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: TaskId,
    pub status: TaskStatus,
    /// Solver inputs; dropped as soon as the task is terminal.
    pub inputs: Option<OptimizationInputs>,
    pub result: Option<Vec<f64>>,
    pub error: Option<String>,
    /// Set when the sandbox could not store the diagnostic log.
    pub log_error: Option<String>,
    /// Captured log lines the log store did not accept.
    pub unstored_logs: Option<Vec<String>>,
    pub created_at: Timestamp,
    pub finished_at: Option<Timestamp>,
}

#[derive(Debug, thiserror::Error)]
#[error("task {id} cannot move from {from} to {to}")]
pub struct TransitionError {
    pub id: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

impl TaskRecord {
    pub fn running(id: TaskId, inputs: OptimizationInputs) -> Self {
        Self {
            id,
            status: TaskStatus::Running,
            inputs: Some(inputs),
            result: None,
            error: None,
            log_error: None,
            unstored_logs: None,
            created_at: chrono::Utc::now(),
            finished_at: None,
        }
    }

    /// Move to the terminal state matching the sandbox outcome.
    ///
    /// Sets exactly one of `result` / `error` and purges the inputs. When
    /// the log could not be stored, the captured lines are kept on the
    /// record instead. A record that is already terminal is left untouched.
    pub fn finish(&mut self, outcome: SandboxOutcome) -> Result<(), TransitionError> {
        let SandboxOutcome {
            result,
            logs,
            log_error,
        } = outcome;
        let next = match result {
            RunResult::Completed { .. } => TaskStatus::Completed,
            RunResult::Failed { .. } => TaskStatus::Failed,
        };
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                id: self.id,
                from: self.status,
                to: next,
            });
        }

        match result {
            RunResult::Completed { weights } => self.result = Some(weights),
            RunResult::Failed { error } => self.error = Some(error),
        }
        self.status = next;
        self.inputs = None;
        if log_error.is_some() && !logs.is_empty() {
            self.unstored_logs = Some(logs);
        }
        self.log_error = log_error;
        self.finished_at = Some(chrono::Utc::now());
        Ok(())
    }
}

/// In-memory task registry.
///
/// Records are never evicted; they live as long as the process.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskId, TaskRecord>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: TaskRecord) {
        self.tasks.insert(record.id, record);
    }

    pub fn get(&self, id: &TaskId) -> Option<&TaskRecord> {
        self.tasks.get(id)
    }

    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut TaskRecord> {
        self.tasks.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Read-only snapshot of a task as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    pub task_id: TaskId,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<OptimizationInputs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_error: Option<String>,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
}

impl TaskView {
    /// Build a view from a record copy. Inputs never accompany a terminal
    /// status, whatever the record holds.
    pub fn sanitized(record: TaskRecord) -> Self {
        let inputs = if record.status.is_terminal() {
            None
        } else {
            record.inputs
        };
        Self {
            task_id: record.id,
            status: record.status,
            inputs,
            result: record.result,
            error: record.error,
            logs: None,
            log_error: record.log_error,
            created_at: record.created_at,
            finished_at: record.finished_at,
        }
    }
}
