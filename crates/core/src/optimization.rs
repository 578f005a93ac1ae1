//! Optimization request decoding and validation.
//!
//! A request carries expected returns (`mu`), a covariance matrix (`cov`)
//! and a target return. The covariance may arrive as nested rows, a flat
//! row-major list, or a mix of both; it is normalized to a flat list here.
//! Squareness is deliberately not checked at this layer: the solver process
//! reshapes the matrix and reports a mismatch as a task failure.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One element of the `cov` field: either a full row or a single value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CovarianceEntry {
    Scalar(f64),
    Row(Vec<f64>),
}

/// Request body as decoded by the transport layer.
///
/// Every field is optional so that a missing field is reported as a
/// validation error naming it, rather than as a decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitOptimization {
    pub mu: Option<Vec<f64>>,
    pub cov: Option<Vec<CovarianceEntry>>,
    pub target: Option<f64>,
}

/// Validated solver inputs. `cov` is flattened row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationInputs {
    pub mu: Vec<f64>,
    pub cov: Vec<f64>,
    pub target: f64,
}

impl OptimizationInputs {
    /// Number of assets, taken from the expected-return vector.
    pub fn n_assets(&self) -> usize {
        self.mu.len()
    }
}

/// Flatten `cov` entries row-major, in order.
pub fn flatten_covariance(entries: Vec<CovarianceEntry>) -> Vec<f64> {
    let mut flat = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            CovarianceEntry::Scalar(v) => flat.push(v),
            CovarianceEntry::Row(row) => flat.extend(row),
        }
    }
    flat
}

/// Validate a submission and normalize it into [`OptimizationInputs`].
///
/// Fields are checked in the order `mu`, `cov`, `target`; the first
/// problem found is returned.
pub fn validate_submission(request: SubmitOptimization) -> Result<OptimizationInputs, CoreError> {
    let mu = request
        .mu
        .ok_or_else(|| CoreError::validation("mu", "is required"))?;
    require_values("mu", &mu)?;

    let cov = request
        .cov
        .map(flatten_covariance)
        .ok_or_else(|| CoreError::validation("cov", "is required"))?;
    require_values("cov", &cov)?;

    let target = request
        .target
        .ok_or_else(|| CoreError::validation("target", "is required"))?;
    if !target.is_finite() {
        return Err(CoreError::validation("target", "must be a finite number"));
    }

    Ok(OptimizationInputs { mu, cov, target })
}

fn require_values(field: &'static str, values: &[f64]) -> Result<(), CoreError> {
    if values.is_empty() {
        return Err(CoreError::validation(field, "must not be empty"));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(CoreError::validation(
            field,
            format!("value at index {i} is not a finite number"),
        ));
    }
    Ok(())
}
