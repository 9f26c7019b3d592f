// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Expectation maximization for a fixed number of rate classes.

use crate::constants::{CONVERGENCE_TOLERANCE, MAX_EM_ITERATIONS};
use crate::errors::Error;
use crate::model::likelihood::{allocate_responsibilities, evaluate};
use crate::model::update::{update, EMPTY_CLASS_RATE};
use crate::model::{Dataset, Model};

/// Outcome of fitting a model of fixed order.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct EmFit {
    #[getset(get = "pub")]
    model: Model,
    /// Log-likelihood including the binomial coefficients.
    #[getset(get_copy = "pub")]
    ln_likelihood: f64,
    #[getset(get_copy = "pub")]
    iterations: usize,
    #[getset(get_copy = "pub")]
    converged: bool,
    /// Log-likelihood (without binomial coefficients) before the first and after every
    /// M-step.
    #[getset(get = "pub")]
    trace: Vec<f64>,
}

impl EmFit {
    pub fn into_model(self) -> Model {
        self.model
    }
}

/// Fit the given model to the data, starting from its current parameters.
///
/// A single class is solved in closed form. Otherwise E- and M-steps alternate until the
/// log-likelihood changes by less than `CONVERGENCE_TOLERANCE` or `MAX_EM_ITERATIONS`
/// is reached. Hitting the iteration cap is not an error, the last state is returned.
pub fn fit(data: &Dataset, mut model: Model) -> Result<EmFit, Error> {
    let mut responsibilities = allocate_responsibilities(data.len(), model.order())?;
    let mut trace = Vec::new();
    let mut iterations = 0;
    let mut converged = true;

    if model.order() == 1 {
        let total_coverage = data.total_coverage();
        model[0].weight = 1.0;
        model[0].rate = if total_coverage == 0 {
            EMPTY_CLASS_RATE
        } else {
            data.total_majority() as f64 / total_coverage as f64
        };
    } else {
        let mut ln_likelihood = evaluate(data, &model, &mut responsibilities, false)?;
        trace.push(ln_likelihood);
        converged = false;

        while iterations < MAX_EM_ITERATIONS {
            iterations += 1;
            update(&responsibilities, data, &mut model);
            let updated = evaluate(data, &model, &mut responsibilities, false)?;
            trace.push(updated);

            if updated < ln_likelihood - CONVERGENCE_TOLERANCE * ln_likelihood.abs().max(1.0) {
                warn!(
                    "log-likelihood decreased during EM iteration {}: {} -> {}",
                    iterations, ln_likelihood, updated
                );
            }

            let delta = (updated - ln_likelihood).abs();
            ln_likelihood = updated;
            if delta < CONVERGENCE_TOLERANCE {
                converged = true;
                break;
            }
        }

        if !converged {
            debug!(
                "EM with {} classes did not converge within {} iterations",
                model.order(),
                MAX_EM_ITERATIONS
            );
        }
    }

    let ln_likelihood = evaluate(data, &model, &mut responsibilities, true)?;

    Ok(EmFit {
        model,
        ln_likelihood,
        iterations,
        converged,
        trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Observation, RateClass};
    use approx::assert_relative_eq;
    use itertools::Itertools;

    fn dataset(counts: &[(u32, u32)]) -> Dataset {
        counts
            .iter()
            .map(|&(c, m)| Observation::new(c, m).unwrap())
            .collect()
    }

    fn mixed_dataset() -> Dataset {
        let mut counts = Vec::new();
        for i in 0..200u32 {
            let coverage = 20 + i % 17;
            let minority = if i % 3 == 0 {
                coverage / 2 - i % 4
            } else {
                i % 2
            };
            counts.push((coverage, coverage - minority));
        }
        dataset(&counts)
    }

    #[test]
    fn test_single_class_closed_form() {
        let data = dataset(&[(10, 9), (7, 7), (13, 2)]);
        let fit = fit(&data, Model::new(vec![RateClass::new(1.0, 0.5)])).unwrap();

        assert_eq!(fit.iterations(), 0);
        assert!(fit.converged());
        assert_eq!(fit.model()[0].weight, 1.0);
        assert_eq!(fit.model()[0].rate, 18.0 / 30.0);
        assert!(fit.ln_likelihood().is_finite());
    }

    #[test]
    fn test_monotone_likelihood() {
        let data = mixed_dataset();
        let model = Model::new(vec![
            RateClass::new(0.2, 0.9),
            RateClass::new(0.3, 0.6),
            RateClass::new(0.5, 0.3),
        ]);
        let fit = fit(&data, model).unwrap();

        assert!(fit.trace().len() >= 2);
        for (previous, next) in fit.trace().iter().tuple_windows() {
            assert!(*next >= previous - 1e-9 * previous.abs());
        }
        assert_relative_eq!(fit.model().total_weight(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_converges_on_separated_classes() {
        let data = mixed_dataset();
        let model = Model::new(vec![RateClass::new(0.5, 0.99), RateClass::new(0.5, 0.6)]);
        let fit = fit(&data, model).unwrap();

        assert!(fit.converged());
        assert!(fit.iterations() <= MAX_EM_ITERATIONS);
        let rates = fit.model().rates();
        assert!(rates.iter().any(|r| *r > 0.95));
        assert!(rates.iter().any(|r| (*r - 0.5).abs() < 0.1));
    }

    #[test]
    fn test_zero_coverage() {
        let data = dataset(&[(0, 0), (0, 0), (0, 0)]);

        let single = fit(&data, Model::new(vec![RateClass::new(1.0, 0.5)])).unwrap();
        assert_eq!(single.model().rates(), vec![EMPTY_CLASS_RATE]);
        assert_eq!(single.ln_likelihood(), 0.0);

        let model = Model::new(vec![RateClass::new(0.4, 0.8), RateClass::new(0.6, 0.3)]);
        let double = fit(&data, model).unwrap();
        assert_eq!(
            double.model().rates(),
            vec![EMPTY_CLASS_RATE, EMPTY_CLASS_RATE]
        );
        assert!(double.model().weights().iter().all(|w| w.is_finite()));
        assert!(double.ln_likelihood().is_finite());
    }
}
