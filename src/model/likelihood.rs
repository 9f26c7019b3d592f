// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! E-step: posterior class responsibilities and total log-likelihood.
//!
//! Per observation `(c, m)` and class `j`, the un-normalized log binomial term is
//! `ln w_j + m ln r_j + (c - m) ln(1 - r_j)`. Terms are combined with the
//! log-sum-exp trick (subtracting the per-observation maximum), so that neither
//! very deep sites nor classes with extreme rates over- or underflow.

use itertools::Itertools;
use ndarray::Array2;
use statrs::function::factorial::ln_binomial;

use crate::errors::Error;
use crate::model::{Dataset, Model, Observation, RateClass};

/// Dense `n x k` table of posterior class probabilities, one row per observation.
pub type ResponsibilityMatrix = Array2<f64>;

/// Allocate a zeroed responsibility matrix for `n` observations and `k` classes.
pub fn allocate_responsibilities(n: usize, k: usize) -> Result<ResponsibilityMatrix, Error> {
    let failure = || Error::AllocationFailure { rows: n, cols: k };

    let len = n.checked_mul(k).ok_or_else(failure)?;
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| failure())?;
    buffer.resize(len, 0.0);

    Array2::from_shape_vec((n, k), buffer).map_err(|_| failure())
}

#[derive(Debug, Clone, Copy)]
struct LogParams {
    weight: f64,
    rate: f64,
    inv_rate: f64,
}

impl LogParams {
    fn new(class: &RateClass) -> Self {
        LogParams {
            weight: class.weight.ln(),
            rate: class.rate.ln(),
            inv_rate: (1.0 - class.rate).ln(),
        }
    }

    /// Log binomial term, omitting the combinatorial coefficient.
    fn ln_term(&self, obs: &Observation) -> f64 {
        self.weight + scaled(obs.majority(), self.rate) + scaled(obs.minority(), self.inv_rate)
    }
}

/// `count * ln_p`, with `0 * ln(0) = 0`.
fn scaled(count: u32, ln_p: f64) -> f64 {
    if count > 0 {
        f64::from(count) * ln_p
    } else {
        0.0
    }
}

/// Fill `responsibilities` for the given model and return the total log-likelihood.
///
/// If `include_constant` is set, the log binomial coefficients are added, yielding the
/// true log-likelihood (needed for AICc). They do not depend on the model, so
/// iteration can skip them.
///
/// # Errors
///
/// `Error::NumericalInstability` if an observation has zero likelihood under every
/// class (e.g. all classes have rates of exactly 0 or 1 contradicting the counts).
pub fn evaluate(
    data: &Dataset,
    model: &Model,
    responsibilities: &mut ResponsibilityMatrix,
    include_constant: bool,
) -> Result<f64, Error> {
    debug_assert_eq!(responsibilities.dim(), (data.len(), model.order()));

    let log_params = model.iter().map(LogParams::new).collect_vec();
    let mut terms = vec![0.0; log_params.len()];
    let mut ln_likelihood = 0.0;

    for (i, (obs, mut row)) in data
        .iter()
        .zip(responsibilities.outer_iter_mut())
        .enumerate()
    {
        for (term, params) in terms.iter_mut().zip(log_params.iter()) {
            *term = params.ln_term(obs);
        }

        let max = terms.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if max == f64::NEG_INFINITY || terms.iter().any(|term| term.is_nan()) {
            return Err(Error::NumericalInstability { observation: i });
        }

        let mut sum = 0.0;
        for term in terms.iter_mut() {
            *term = (*term - max).exp();
            sum += *term;
        }
        for (r, term) in row.iter_mut().zip(terms.iter()) {
            *r = term / sum;
        }

        ln_likelihood += sum.ln() + max;
        if include_constant {
            ln_likelihood += ln_binomial(u64::from(obs.coverage()), u64::from(obs.majority()));
        }
    }

    Ok(ln_likelihood)
}

/// Allocate a responsibility matrix and evaluate the model on it.
pub fn responsibilities(
    data: &Dataset,
    model: &Model,
    include_constant: bool,
) -> Result<(ResponsibilityMatrix, f64), Error> {
    let mut responsibilities = allocate_responsibilities(data.len(), model.order())?;
    let ln_likelihood = evaluate(data, model, &mut responsibilities, include_constant)?;
    Ok((responsibilities, ln_likelihood))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dataset(counts: &[(u32, u32)]) -> Dataset {
        counts
            .iter()
            .map(|&(c, m)| Observation::new(c, m).unwrap())
            .collect()
    }

    #[test]
    fn test_single_class_likelihood() {
        let data = dataset(&[(2, 1)]);
        let model = Model::new(vec![RateClass::new(1.0, 0.5)]);

        let (_, without_constant) = responsibilities(&data, &model, false).unwrap();
        assert_relative_eq!(without_constant, 2.0 * 0.5f64.ln());

        // C(2, 1) = 2, hence Pr = 2 * 0.25
        let (_, with_constant) = responsibilities(&data, &model, true).unwrap();
        assert_relative_eq!(with_constant, 0.5f64.ln());
    }

    #[test]
    fn test_rows_sum_to_one() {
        let data = dataset(&[(30, 30), (30, 15), (1000, 990), (0, 0), (5, 0)]);
        let model = Model::new(vec![
            RateClass::new(0.5, 0.99),
            RateClass::new(0.3, 0.5),
            RateClass::new(0.2, 0.001),
        ]);

        let (resp, ln_likelihood) = responsibilities(&data, &model, true).unwrap();
        assert!(ln_likelihood.is_finite());
        for row in resp.outer_iter() {
            assert!(row.iter().all(|r| r.is_finite()));
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_deep_coverage_does_not_underflow() {
        // ln terms around -70000 would underflow to zero if exponentiated directly
        let data = dataset(&[(100_000, 50_000)]);
        let model = Model::new(vec![RateClass::new(0.5, 0.5), RateClass::new(0.5, 0.4)]);

        let (resp, ln_likelihood) = responsibilities(&data, &model, false).unwrap();
        assert!(ln_likelihood.is_finite());
        assert_relative_eq!(resp[[0, 0]], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_extreme_rates() {
        // rate 1.0 cannot explain minority reads, rate 0.0 cannot explain majority reads
        let data = dataset(&[(10, 10), (10, 0), (0, 0)]);
        let model = Model::new(vec![RateClass::new(0.5, 1.0), RateClass::new(0.5, 0.0)]);

        let (resp, ln_likelihood) = responsibilities(&data, &model, false).unwrap();
        assert_eq!(resp[[0, 0]], 1.0);
        assert_eq!(resp[[0, 1]], 0.0);
        assert_eq!(resp[[1, 0]], 0.0);
        assert_eq!(resp[[1, 1]], 1.0);
        assert_relative_eq!(resp[[2, 0]], 0.5);
        assert_relative_eq!(ln_likelihood, 2.0 * 0.5f64.ln());
    }

    #[test]
    fn test_inconsistent_observation() {
        let data = dataset(&[(10, 10), (10, 5)]);
        let model = Model::new(vec![RateClass::new(0.5, 1.0), RateClass::new(0.5, 0.0)]);

        assert_eq!(
            responsibilities(&data, &model, false).unwrap_err(),
            Error::NumericalInstability { observation: 1 }
        );
    }

    #[test]
    fn test_allocation_overflow() {
        assert_eq!(
            allocate_responsibilities(usize::MAX, 2).unwrap_err(),
            Error::AllocationFailure {
                rows: usize::MAX,
                cols: 2
            }
        );
    }
}
