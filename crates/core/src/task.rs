//! Task lifecycle status.
//!
//! ```text
//! Running -> Completed | Failed
//! Completed -> (terminal)
//! Failed    -> (terminal)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a submitted optimization task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// The solver process has been admitted and has not finished yet.
    Running,
    /// The solver produced an allocation (terminal).
    Completed,
    /// The run ended without an allocation (terminal).
    Failed,
}

impl TaskStatus {
    /// Returns `true` for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Only `Running` may move, and only into a terminal state.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        self == Self::Running && next.is_terminal()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
    }

    #[test]
    fn running_moves_only_to_terminal() {
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Failed));
        assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Running));
    }

    #[test]
    fn terminal_states_reject_every_transition() {
        for from in [TaskStatus::Completed, TaskStatus::Failed] {
            for to in [TaskStatus::Running, TaskStatus::Completed, TaskStatus::Failed] {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&TaskStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
