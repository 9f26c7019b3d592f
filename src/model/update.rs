// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! M-step: closed-form maximum likelihood weights and rates given responsibilities.

use crate::model::likelihood::ResponsibilityMatrix;
use crate::model::{Dataset, Model};

/// Rate assigned to a class without any expected coverage.
pub const EMPTY_CLASS_RATE: f64 = 1.0;

/// Recompute weight and rate of every class in place.
///
/// The weight of class `j` is its mean responsibility, its rate is the
/// responsibility-weighted majority count over the responsibility-weighted coverage.
/// An empty dataset leaves the model untouched.
pub fn update(responsibilities: &ResponsibilityMatrix, data: &Dataset, model: &mut Model) {
    debug_assert_eq!(responsibilities.dim(), (data.len(), model.order()));
    if data.is_empty() {
        return;
    }

    let n = data.len() as f64;
    for (class, column) in model.iter_mut().zip(responsibilities.columns()) {
        let mut mass = 0.0;
        let mut coverage = 0.0;
        let mut majority = 0.0;
        for (obs, r) in data.iter().zip(column.iter()) {
            mass += r;
            coverage += r * f64::from(obs.coverage());
            majority += r * f64::from(obs.majority());
        }

        class.weight = mass / n;
        class.rate = if coverage == 0.0 {
            EMPTY_CLASS_RATE
        } else {
            majority / coverage
        };
    }
}
