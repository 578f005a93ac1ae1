use crate::types::TaskId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed for '{field}': {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("An optimization is already running")]
    AdmissionRejected,
}

impl CoreError {
    /// Shorthand for a missing or invalid request field.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Shorthand for an unknown task id.
    pub fn task_not_found(id: TaskId) -> Self {
        Self::NotFound {
            entity: "Task",
            id: id.to_string(),
        }
    }
}
