//! Minimum-variance portfolio optimizer.
//!
//! Solves
//!
//! ```text
//! minimize    w' C w
//! subject to  sum(w) = 1
//!             mu' w  = target
//!             w     >= 0
//! ```
//!
//! with accelerated projected gradient (FISTA with gradient-based restart).
//! Every iterate is exactly feasible because the projection onto the
//! constraint polytope is exact (see [`projection::FeasibleSet`]). The
//! search starts from the uniform allocation projected onto that polytope.
//!
//! Pure: no I/O, no shared state.

pub mod projection;

use crate::wire::SolverFailureKind;

use self::projection::{dot, return_range, FeasibleSet};

/// Default iteration cap before reporting non-convergence.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10_000;

/// Default stationarity tolerance (infinity norm of the projected step).
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Relative slack used when comparing the target with the return range.
const FEASIBILITY_SLACK: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    pub max_iterations: u32,
    pub tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "shape mismatch: cannot reshape {found} covariance values into a {n}x{n} matrix \
         (expected {expected})"
    )]
    ShapeMismatch {
        n: usize,
        expected: usize,
        found: usize,
    },

    #[error("target return {target} is outside the attainable range [{min}, {max}]")]
    Infeasible { target: f64, min: f64, max: f64 },

    #[error("did not converge within {iterations} iterations (last step {last_step:e})")]
    NotConverged { iterations: u32, last_step: f64 },
}

impl SolverError {
    pub fn kind(&self) -> SolverFailureKind {
        match self {
            Self::InvalidInput(_) => SolverFailureKind::InvalidInput,
            Self::ShapeMismatch { .. } => SolverFailureKind::ShapeMismatch,
            Self::Infeasible { .. } => SolverFailureKind::Infeasible,
            Self::NotConverged { .. } => SolverFailureKind::NotConverged,
        }
    }
}

/// Square covariance matrix stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl CovarianceMatrix {
    /// Reshape a flat row-major list into an `n x n` matrix.
    pub fn from_row_major(values: Vec<f64>, n: usize) -> Result<Self, SolverError> {
        let expected = n * n;
        if n == 0 || values.len() != expected {
            return Err(SolverError::ShapeMismatch {
                n,
                expected,
                found: values.len(),
            });
        }
        Ok(Self { n, data: values })
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// `w' C w`.
    pub fn quadratic_form(&self, w: &[f64]) -> f64 {
        (0..self.n)
            .map(|i| w[i] * (0..self.n).map(|j| self.get(i, j) * w[j]).sum::<f64>())
            .sum()
    }

    /// Gradient of `w' C w`, i.e. `(C + C') w`.
    fn gradient(&self, w: &[f64]) -> Vec<f64> {
        (0..self.n)
            .map(|i| {
                (0..self.n)
                    .map(|j| (self.get(i, j) + self.get(j, i)) * w[j])
                    .sum()
            })
            .collect()
    }

    /// Gershgorin upper bound on the largest eigenvalue of `C + C'`.
    fn lipschitz_bound(&self) -> f64 {
        (0..self.n)
            .map(|i| {
                (0..self.n)
                    .map(|j| (self.get(i, j) + self.get(j, i)).abs())
                    .sum::<f64>()
            })
            .fold(0.0, f64::max)
    }
}

/// Result of a converged optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub weights: Vec<f64>,
    pub iterations: u32,
    pub variance: f64,
}

/// Compute the minimum-variance allocation reaching `target`.
pub fn optimize(
    mu: &[f64],
    cov: &CovarianceMatrix,
    target: f64,
    options: &SolverOptions,
) -> Result<Solution, SolverError> {
    let n = mu.len();
    if n == 0 {
        return Err(SolverError::InvalidInput(
            "expected returns must not be empty".into(),
        ));
    }
    if cov.dim() != n {
        return Err(SolverError::ShapeMismatch {
            n,
            expected: n * n,
            found: cov.dim() * cov.dim(),
        });
    }
    if mu.iter().chain(&cov.data).any(|v| !v.is_finite()) || !target.is_finite() {
        return Err(SolverError::InvalidInput(
            "inputs must contain only finite numbers".into(),
        ));
    }
    if options.max_iterations == 0 || !(options.tolerance > 0.0) {
        return Err(SolverError::InvalidInput(
            "max_iterations and tolerance must be positive".into(),
        ));
    }

    let (min, max) = return_range(mu);
    let slack = FEASIBILITY_SLACK * min.abs().max(max.abs()).max(1.0);
    if target < min - slack || target > max + slack {
        return Err(SolverError::Infeasible { target, min, max });
    }

    let feasible = FeasibleSet::new(mu, target, slack);
    let lipschitz = match cov.lipschitz_bound() {
        l if l > 0.0 => l,
        _ => 1.0,
    };

    let uniform = vec![1.0 / n as f64; n];
    let mut x = feasible.project(&uniform);
    let mut y = x.clone();
    let mut momentum = 1.0_f64;
    let mut last_step = f64::INFINITY;

    for iteration in 1..=options.max_iterations {
        let grad = cov.gradient(&y);
        let trial: Vec<f64> = y
            .iter()
            .zip(&grad)
            .map(|(yi, gi)| yi - gi / lipschitz)
            .collect();
        let next = feasible.project(&trial);

        last_step = max_abs_diff(&next, &y);
        if last_step <= options.tolerance {
            let variance = cov.quadratic_form(&next);
            return Ok(Solution {
                weights: next,
                iterations: iteration,
                variance,
            });
        }

        let delta: Vec<f64> = next.iter().zip(&x).map(|(a, b)| a - b).collect();
        let overshoot: Vec<f64> = y.iter().zip(&next).map(|(a, b)| a - b).collect();
        if dot(&overshoot, &delta) > 0.0 {
            momentum = 1.0;
            y = next.clone();
        } else {
            let next_momentum = 0.5 * (1.0 + (1.0 + 4.0 * momentum * momentum).sqrt());
            let beta = (momentum - 1.0) / next_momentum;
            y = next.iter().zip(&delta).map(|(a, d)| a + beta * d).collect();
            momentum = next_momentum;
        }
        x = next;
    }

    Err(SolverError::NotConverged {
        iterations: options.max_iterations,
        last_step,
    })
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}
