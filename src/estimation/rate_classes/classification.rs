// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use crate::errors::Error;
use crate::estimation::rate_classes::FitResult;
use crate::model::likelihood::responsibilities;
use crate::model::Dataset;

/// Most probable rate class of a site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SiteClass {
    pub coverage: u32,
    pub majority: u32,
    /// Index into the classes of the fit result (ascending minority rate).
    pub class: usize,
    /// Posterior probability of the class.
    pub posterior: f64,
}

/// Assign each observation to the class with maximum posterior probability (the lower
/// rate class on ties).
pub fn classify(data: &Dataset, result: &FitResult) -> Result<Vec<SiteClass>, Error> {
    let (responsibilities, _) = responsibilities(data, &result.majority_model(), false)?;

    Ok(data
        .iter()
        .zip(responsibilities.outer_iter())
        .map(|(obs, row)| {
            let (class, posterior) = row.iter().enumerate().fold(
                (0, f64::NEG_INFINITY),
                |(best, best_posterior), (j, &posterior)| {
                    if posterior > best_posterior {
                        (j, posterior)
                    } else {
                        (best, best_posterior)
                    }
                },
            );
            SiteClass {
                coverage: obs.coverage(),
                majority: obs.majority(),
                class,
                posterior,
            }
        })
        .collect())
}
