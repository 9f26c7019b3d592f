// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use rand::distributions::Open01;
use rand::Rng;

use crate::constants::FULL_RANDOMIZATION_TRIAL;
use crate::model::Model;

/// Re-seed the classes of `model` for the given restart trial.
///
/// The most recently added class is always drawn anew (weight and rate uniform in (0, 1)).
/// The remaining classes keep their fitted values unless `trial` has reached
/// `FULL_RANDOMIZATION_TRIAL`, in which case every class is drawn anew.
/// Weights are renormalized afterwards.
pub fn initialize<R: Rng>(model: &mut Model, trial: usize, rng: &mut R) {
    let last = model.order().saturating_sub(1);
    for (i, class) in model.iter_mut().enumerate() {
        if trial >= FULL_RANDOMIZATION_TRIAL || i == last {
            class.weight = rng.sample(Open01);
            class.rate = rng.sample(Open01);
        }
    }
    model.normalize_weights();
}
