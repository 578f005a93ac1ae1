//! Job engine: admission control, task registry and lifecycle.
//!
//! [`JobManager`] is the only owner of the registry and the admission gate.
//! Both sit behind one mutex, so admitting a task and creating its record,
//! or writing a terminal state and releasing the gate, each happen in a
//! single critical section.

pub mod gate;
pub mod manager;
pub mod registry;

pub use gate::AdmissionGate;
pub use manager::JobManager;
pub use registry::{TaskRecord, TaskRegistry, TaskView};
