// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Model order selection by AICc.
//!
//! Orders are grown one class at a time. Each new order starts from the best model of
//! the previous order plus a seed class and is fitted from several randomized restarts.
//! Growth stops at the first order that does not strictly improve the AICc, or whose
//! AICc is undefined because there are too few observations.

use rand::Rng;

use crate::constants::SEED_CLASS;
use crate::errors::Error;
use crate::estimation::rate_classes::em::{fit, EmFit};
use crate::estimation::rate_classes::initialization::initialize;
use crate::estimation::rate_classes::FitResult;
use crate::model::{Dataset, Model};

/// Number of free parameters counted for a model of the given order (a weight and a
/// rate per class).
pub fn parameter_count(order: usize) -> usize {
    2 * order
}

/// AICc penalty `2k + 2k(k + 1) / (n - k - 1)` for a model of the given order.
///
/// # Errors
///
/// `Error::UndefinedCriterion` if `n - k - 1 <= 0`.
pub fn penalty(order: usize, observations: usize) -> Result<f64, Error> {
    let parameters = parameter_count(order);
    let denominator = observations
        .checked_sub(parameters + 1)
        .filter(|d| *d > 0)
        .ok_or(Error::UndefinedCriterion {
            order,
            parameters,
            observations,
        })?;

    let k = parameters as f64;
    Ok(2.0 * k + 2.0 * k * (k + 1.0) / denominator as f64)
}

/// Corrected Akaike information criterion of a model of the given order.
pub fn aicc(order: usize, ln_likelihood: f64, observations: usize) -> Result<f64, Error> {
    Ok(penalty(order, observations)? - 2.0 * ln_likelihood)
}

#[derive(Debug, Clone, CopyGetters)]
pub struct ModelSelector {
    /// Randomized restarts per model order.
    #[getset(get_copy = "pub")]
    nrestart: usize,
}

impl ModelSelector {
    pub fn new(nrestart: usize) -> Result<Self, Error> {
        if nrestart == 0 {
            return Err(Error::InvalidRestartCount);
        }
        Ok(ModelSelector { nrestart })
    }

    /// Select the number of rate classes and fit them.
    ///
    /// Rates in the result are minority rates (one minus the fitted majority rate),
    /// sorted ascending.
    ///
    /// # Errors
    ///
    /// Numerical and allocation failures of any fit abort the search. If the AICc of a
    /// single class is undefined (fewer than four observations),
    /// `Error::UndefinedCriterion` is returned.
    pub fn select<R: Rng>(&self, data: &Dataset, rng: &mut R) -> Result<FitResult, Error> {
        let n = data.len();

        let initial = fit(data, Model::new(vec![SEED_CLASS]))?;
        let mut best_aicc = aicc(1, initial.ln_likelihood(), n)?;
        let mut best_ln_likelihood = initial.ln_likelihood();
        let mut best_model = initial.into_model();
        info!(
            "order 1: log-likelihood={:.3}, AICc={:.3}",
            best_ln_likelihood, best_aicc
        );

        for order in 2.. {
            let penalty = match penalty(order, n) {
                Ok(penalty) => penalty,
                Err(err) => {
                    info!("{}, keeping order {}", err, order - 1);
                    break;
                }
            };

            let candidate = self.fit_order(data, &best_model, rng)?;
            let candidate_aicc = penalty - 2.0 * candidate.ln_likelihood();
            info!(
                "order {}: log-likelihood={:.3}, AICc={:.3}",
                order,
                candidate.ln_likelihood(),
                candidate_aicc
            );

            if candidate_aicc >= best_aicc {
                info!("AICc did not improve, keeping order {}", order - 1);
                break;
            }

            best_aicc = candidate_aicc;
            best_ln_likelihood = candidate.ln_likelihood();
            best_model = candidate.into_model();
        }

        Ok(FitResult::from_majority_rates(
            best_ln_likelihood,
            best_aicc,
            best_model,
        ))
    }

    /// Fit the order following `previous` from `nrestart` trials and return the one with
    /// the highest log-likelihood (the earliest one on ties).
    fn fit_order<R: Rng>(
        &self,
        data: &Dataset,
        previous: &Model,
        rng: &mut R,
    ) -> Result<EmFit, Error> {
        let mut candidate = previous.clone();
        candidate.push(SEED_CLASS);
        initialize(&mut candidate, 0, rng);

        let mut best = fit(data, candidate)?;
        debug!(
            "order {} trial 0: log-likelihood={:.3} after {} iterations",
            best.model().order(),
            best.ln_likelihood(),
            best.iterations()
        );

        for trial in 1..self.nrestart {
            let mut model = best.model().clone();
            initialize(&mut model, trial, rng);

            let trial_fit = fit(data, model)?;
            debug!(
                "order {} trial {}: log-likelihood={:.3} after {} iterations",
                trial_fit.model().order(),
                trial,
                trial_fit.ln_likelihood(),
                trial_fit.iterations()
            );
            if trial_fit.ln_likelihood() > best.ln_likelihood() {
                best = trial_fit;
            }
        }

        Ok(best)
    }
}
