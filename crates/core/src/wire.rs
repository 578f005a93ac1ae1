//! Solver process I/O contract.
//!
//! The engine writes one [`SolverRequest`] as JSON to the solver's stdin and
//! expects exactly one [`SolverReport`] as JSON on its stdout. Both sides
//! link this module, so the encoding and decoding cannot drift apart.
//! Unknown fields and mismatched `format` versions are rejected.
//!
//! Diagnostics never go to stdout; the solver writes them to stderr.

use serde::{Deserialize, Serialize};

use crate::optimization::OptimizationInputs;

/// Current contract version. Bump on any incompatible change.
pub const WIRE_FORMAT_VERSION: u32 = 1;

/// Input document piped to the solver process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverRequest {
    pub format: u32,
    /// Expected returns, one per asset.
    pub mu: Vec<f64>,
    /// Covariance matrix flattened row-major. Must hold `mu.len()^2` values.
    pub cov: Vec<f64>,
    /// Target portfolio return.
    pub target: f64,
}

impl From<&OptimizationInputs> for SolverRequest {
    fn from(inputs: &OptimizationInputs) -> Self {
        Self {
            format: WIRE_FORMAT_VERSION,
            mu: inputs.mu.clone(),
            cov: inputs.cov.clone(),
            target: inputs.target,
        }
    }
}

/// Output document printed by the solver process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverReport {
    pub format: u32,
    pub outcome: SolverOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverOutcome {
    Solved(SolvedAllocation),
    Failed(SolverFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolvedAllocation {
    pub weights: Vec<f64>,
    pub iterations: u32,
    /// Portfolio variance `w' * cov * w` at the returned weights.
    pub variance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverFailure {
    pub kind: SolverFailureKind,
    pub message: String,
}

/// Coarse classification of solver-side failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverFailureKind {
    InvalidInput,
    ShapeMismatch,
    Infeasible,
    NotConverged,
}

impl SolverReport {
    pub fn solved(allocation: SolvedAllocation) -> Self {
        Self {
            format: WIRE_FORMAT_VERSION,
            outcome: SolverOutcome::Solved(allocation),
        }
    }

    pub fn failed(kind: SolverFailureKind, message: impl Into<String>) -> Self {
        Self {
            format: WIRE_FORMAT_VERSION,
            outcome: SolverOutcome::Failed(SolverFailure {
                kind,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed solver document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported solver format version {found} (expected {WIRE_FORMAT_VERSION})")]
    UnsupportedFormat { found: u32 },
}

pub fn encode_request(request: &SolverRequest) -> Result<String, WireError> {
    Ok(serde_json::to_string(request)?)
}

pub fn decode_request(text: &str) -> Result<SolverRequest, WireError> {
    let request: SolverRequest = serde_json::from_str(text.trim())?;
    check_format(request.format)?;
    Ok(request)
}

pub fn encode_report(report: &SolverReport) -> Result<String, WireError> {
    Ok(serde_json::to_string(report)?)
}

pub fn decode_report(text: &str) -> Result<SolverReport, WireError> {
    let report: SolverReport = serde_json::from_str(text.trim())?;
    check_format(report.format)?;
    Ok(report)
}

fn check_format(found: u32) -> Result<(), WireError> {
    if found == WIRE_FORMAT_VERSION {
        Ok(())
    } else {
        Err(WireError::UnsupportedFormat { found })
    }
}
