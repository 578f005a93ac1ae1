//! Euclidean projections used by the optimizer.

/// Bisection steps used to locate the return multiplier.
const MAX_BISECTION_STEPS: usize = 200;

/// Doublings allowed while bracketing the return multiplier.
const MAX_BRACKET_DOUBLINGS: usize = 200;

/// Project `z` onto the probability simplex `{w >= 0, sum(w) = 1}`.
///
/// Sort-based algorithm: find the threshold `tau` such that
/// `sum(max(z_i - tau, 0)) = 1`.
pub fn project_simplex(z: &[f64]) -> Vec<f64> {
    let mut sorted = z.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut cumulative = 0.0;
    let mut tau = 0.0;
    for (j, &u) in sorted.iter().enumerate() {
        cumulative += u;
        let candidate = (cumulative - 1.0) / (j + 1) as f64;
        if u - candidate > 0.0 {
            tau = candidate;
        }
    }

    z.iter().map(|&v| (v - tau).max(0.0)).collect()
}

/// The feasible allocations `{w >= 0, sum(w) = 1, mu' w = target}`.
///
/// Callers must check that `target` lies in `[min(mu), max(mu)]` first;
/// [`FeasibleSet::project`] assumes the set is non-empty.
pub struct FeasibleSet<'a> {
    mu: &'a [f64],
    target: f64,
    flat_returns: bool,
    tolerance: f64,
}

impl<'a> FeasibleSet<'a> {
    pub fn new(mu: &'a [f64], target: f64, tolerance: f64) -> Self {
        let (lo, hi) = return_range(mu);
        Self {
            mu,
            target,
            flat_returns: hi - lo <= tolerance,
            tolerance,
        }
    }

    /// Project `y` onto the feasible set.
    ///
    /// The projection is `P_simplex(y - b * mu)` for the multiplier `b` at
    /// which the return constraint holds. `mu' P_simplex(y - b * mu)` is
    /// non-increasing in `b`, so `b` is found by bracketing then bisection.
    /// With constant returns the return constraint is redundant.
    pub fn project(&self, y: &[f64]) -> Vec<f64> {
        if self.flat_returns {
            return project_simplex(y);
        }

        let mut lo = -1.0;
        let mut hi = 1.0;
        for _ in 0..MAX_BRACKET_DOUBLINGS {
            if self.excess_return(y, hi) <= self.tolerance {
                break;
            }
            hi *= 2.0;
        }
        for _ in 0..MAX_BRACKET_DOUBLINGS {
            if self.excess_return(y, lo) >= -self.tolerance {
                break;
            }
            lo *= 2.0;
        }

        let mut mid = 0.5 * (lo + hi);
        for _ in 0..MAX_BISECTION_STEPS {
            mid = 0.5 * (lo + hi);
            let excess = self.excess_return(y, mid);
            if excess.abs() <= self.tolerance * 1e-2 {
                break;
            }
            if excess > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        self.shifted_simplex(y, mid)
    }

    fn shifted_simplex(&self, y: &[f64], b: f64) -> Vec<f64> {
        let shifted: Vec<f64> = y.iter().zip(self.mu).map(|(v, m)| v - b * m).collect();
        project_simplex(&shifted)
    }

    fn excess_return(&self, y: &[f64], b: f64) -> f64 {
        dot(&self.shifted_simplex(y, b), self.mu) - self.target
    }
}

/// `(min, max)` of the expected returns.
pub fn return_range(mu: &[f64]) -> (f64, f64) {
    mu.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &m| {
            (lo.min(m), hi.max(m))
        })
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() <= tol, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn simplex_point_is_fixed() {
        let w = [0.2, 0.3, 0.5];
        assert_close(&project_simplex(&w), &w, 1e-15);
    }

    #[test]
    fn simplex_projection_clips_negative_mass() {
        assert_close(&project_simplex(&[2.0, 0.0]), &[1.0, 0.0], 1e-15);
        assert_close(&project_simplex(&[0.5, 0.5, -3.0]), &[0.5, 0.5, 0.0], 1e-15);
    }

    #[test]
    fn feasible_projection_meets_both_equalities() {
        let mu = [0.1, 0.2, 0.3];
        let set = FeasibleSet::new(&mu, 0.25, 1e-12);
        let w = set.project(&[0.9, -0.4, 0.1]);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((dot(&w, &mu) - 0.25).abs() < 1e-9);
        assert!(w.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn extreme_target_lands_on_vertex() {
        let mu = [0.1, 0.2, 0.3];
        let set = FeasibleSet::new(&mu, 0.3, 1e-12);
        assert_close(&set.project(&[1.0 / 3.0; 3]), &[0.0, 0.0, 1.0], 1e-9);
    }

    #[test]
    fn flat_returns_reduce_to_simplex() {
        let mu = [0.1, 0.1];
        let set = FeasibleSet::new(&mu, 0.1, 1e-12);
        assert_close(&set.project(&[3.0, 1.0]), &[1.0, 0.0], 1e-15);
    }
}
