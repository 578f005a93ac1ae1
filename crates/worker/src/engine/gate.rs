use folio_core::types::TaskId;

/// Single-slot admission gate.
///
/// Holds the id of the task currently admitted, if any. Only
/// [`try_acquire`](Self::try_acquire) and [`release`](Self::release) change
/// it; there is no way to flip the slot without naming a task.
#[derive(Debug, Default)]
pub struct AdmissionGate {
    holder: Option<TaskId>,
}

impl AdmissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `task_id` if the slot is free. Returns `false` when busy.
    pub fn try_acquire(&mut self, task_id: TaskId) -> bool {
        if self.holder.is_some() {
            return false;
        }
        self.holder = Some(task_id);
        true
    }

    /// Free the slot if `task_id` holds it. A release by any other task is
    /// ignored and returns `false`.
    pub fn release(&mut self, task_id: TaskId) -> bool {
        if self.holder == Some(task_id) {
            self.holder = None;
            true
        } else {
            false
        }
    }

    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn second_acquire_is_rejected_until_release() {
        let mut gate = AdmissionGate::new();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(gate.try_acquire(first));
        assert!(!gate.try_acquire(second));
        assert!(gate.release(first));
        assert!(gate.try_acquire(second));
    }

    #[test]
    fn release_by_non_holder_is_ignored() {
        let mut gate = AdmissionGate::new();
        let holder = Uuid::new_v4();
        gate.try_acquire(holder);

        assert!(!gate.release(Uuid::new_v4()));
        assert!(gate.is_held());
    }

    #[test]
    fn release_is_idempotent() {
        let mut gate = AdmissionGate::new();
        let id = Uuid::new_v4();
        gate.try_acquire(id);

        assert!(gate.release(id));
        assert!(!gate.release(id));
        assert!(!gate.is_held());
    }
}
