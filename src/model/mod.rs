// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Observations and the latent rate class mixture fitted to them.

use std::iter::FromIterator;

use crate::errors::Error;

pub mod likelihood;
pub mod update;

/// Pileup counts of a single site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Observation {
    coverage: u32,
    majority: u32,
}

impl Observation {
    /// Create new observation, checking that the majority count does not exceed the coverage.
    pub fn new(coverage: u32, majority: u32) -> Result<Self, Error> {
        if majority > coverage {
            return Err(Error::InvalidObservation { coverage, majority });
        }
        Ok(Observation { coverage, majority })
    }

    /// Number of reads overlapping the site.
    pub fn coverage(&self) -> u32 {
        self.coverage
    }

    /// Number of reads supporting the most frequent base.
    pub fn majority(&self) -> u32 {
        self.majority
    }

    /// Number of reads not supporting the most frequent base.
    pub fn minority(&self) -> u32 {
        self.coverage - self.majority
    }
}

/// Immutable collection of observations, in the order they were supplied.
#[derive(new, Debug, Clone, Default, Derefable, PartialEq)]
pub struct Dataset {
    #[deref]
    observations: Vec<Observation>,
}

impl Dataset {
    pub fn total_coverage(&self) -> u64 {
        self.iter().map(|obs| u64::from(obs.coverage)).sum()
    }

    pub fn total_majority(&self) -> u64 {
        self.iter().map(|obs| u64::from(obs.majority)).sum()
    }
}

impl FromIterator<Observation> for Dataset {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Dataset::new(iter.into_iter().collect())
    }
}

/// A latent subpopulation of sites sharing a common rate.
#[derive(new, Debug, Clone, Copy, PartialEq)]
pub struct RateClass {
    pub weight: f64,
    pub rate: f64,
}

/// Mixture of rate classes.
///
/// During fitting, classes are kept in insertion order (the most recently added
/// class is the last one). Weights sum to one.
#[derive(new, Debug, Clone, Default, Derefable, PartialEq)]
pub struct Model {
    #[deref(mutable)]
    classes: Vec<RateClass>,
}

impl Model {
    pub fn order(&self) -> usize {
        self.classes.len()
    }

    /// Append a class (it becomes the most recently added one).
    pub fn push(&mut self, class: RateClass) {
        self.classes.push(class);
    }

    pub fn total_weight(&self) -> f64 {
        self.iter().map(|class| class.weight).sum()
    }

    /// Rescale weights so that they sum to one.
    pub fn normalize_weights(&mut self) {
        let total = self.total_weight();
        for class in self.classes.iter_mut() {
            class.weight /= total;
        }
    }

    pub fn rates(&self) -> Vec<f64> {
        self.iter().map(|class| class.rate).collect()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.iter().map(|class| class.weight).collect()
    }

    pub fn into_classes(self) -> Vec<RateClass> {
        self.classes
    }
}
