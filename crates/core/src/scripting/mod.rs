//! Child process execution with captured I/O.
//!
//! The solver runs out of process so that a crash or runaway allocation in
//! one solve cannot touch the task registry. This module only knows how to
//! spawn a binary, feed its stdin, capture stdout/stderr separately and
//! enforce a timeout; it knows nothing about portfolios.

pub mod binary;
pub mod process;
pub mod subprocess;
