// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use crate::model::RateClass;

/// EM stops once the absolute log-likelihood change between iterations drops below this.
pub const CONVERGENCE_TOLERANCE: f64 = 1e-8;

/// Soft cap on EM iterations per fit.
pub const MAX_EM_ITERATIONS: usize = 100;

// Restart trials with an index of at least this value re-draw every class,
// earlier trials only re-draw the most recently added one.
pub const FULL_RANDOMIZATION_TRIAL: usize = 10;

/// Class appended to the previous best model when growing the order.
pub static SEED_CLASS: RateClass = RateClass {
    weight: 1.0,
    rate: 0.5,
};
