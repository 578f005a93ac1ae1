//! `folio-worker` library crate.
//!
//! Background execution for portfolio optimizations: the job engine
//! (admission gate, task registry, job manager), the process sandbox that
//! runs the `folio-solver` binary, and the per-task log store. The solver
//! binary entrypoint lives in `src/bin/folio-solver.rs`.

pub mod config;
pub mod engine;
pub mod logs;
pub mod sandbox;
pub mod solver_process;
