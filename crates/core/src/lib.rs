//! `folio-core` -- domain types and pure logic for the allocation engine.
//!
//! Nothing in this crate touches the task registry or the network. The
//! optimizer is pure math, [`wire`] is the solver process I/O contract,
//! and [`scripting`] spawns and captures child processes.

pub mod error;
pub mod optimization;
pub mod optimizer;
pub mod scripting;
pub mod task;
pub mod types;
pub mod wire;
