// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Simulation of per-site observations from a known rate class mixture.
//!
//! Each site draws its class by weight, its coverage from a Poisson distribution and its
//! minority count from a binomial distribution with the class rate.

use std::fs::File;
use std::io::{stdout, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use bio::stats::Prob;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Binomial, Poisson};

use crate::errors::Error;
use crate::model::{Dataset, Observation};

fn invalid_mixture(msg: String) -> Error {
    Error::InvalidMixture { msg }
}

#[derive(Debug, Clone, Getters)]
pub struct Simulation {
    #[getset(get = "pub")]
    rates: Vec<f64>,
    classes: WeightedIndex<f64>,
    coverage: Poisson<f64>,
}

impl Simulation {
    /// Create a simulation from parallel class weights and minority rates.
    ///
    /// Weights have to be positive probabilities summing to one, rates probabilities,
    /// and the mean coverage has to be positive.
    pub fn new(weights: &[f64], rates: &[f64], mean_coverage: f64) -> Result<Self, Error> {
        if weights.is_empty() || weights.len() != rates.len() {
            return Err(invalid_mixture(format!(
                "expecting the same positive number of weights and rates, found {} and {}",
                weights.len(),
                rates.len()
            )));
        }
        for &p in weights.iter().chain(rates) {
            Prob::checked(p)
                .map_err(|_| invalid_mixture(format!("{} is not a probability", p)))?;
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(invalid_mixture(format!(
                "weights sum to {} instead of 1",
                total
            )));
        }

        let classes = WeightedIndex::new(weights)
            .map_err(|err| invalid_mixture(format!("invalid weights: {}", err)))?;
        let coverage = Poisson::new(mean_coverage).map_err(|_| {
            invalid_mixture(format!(
                "mean coverage has to be positive, found {}",
                mean_coverage
            ))
        })?;

        Ok(Simulation {
            rates: rates.to_vec(),
            classes,
            coverage,
        })
    }

    /// Draw the given number of sites.
    pub fn sample<R: Rng>(&self, sites: usize, rng: &mut R) -> Result<Dataset, Error> {
        (0..sites)
            .map(|_| {
                let rate = self.rates[self.classes.sample(rng)];
                let coverage = self.coverage.sample(rng) as u32;
                let minority = Binomial::new(u64::from(coverage), rate)
                    .map_err(|err| invalid_mixture(format!("invalid rate {}: {}", rate, err)))?
                    .sample(rng) as u32;
                Observation::new(coverage, coverage - minority)
            })
            .collect()
    }
}

/// Write observations as TSV with a `coverage<TAB>majority` header.
pub fn write_observations<W: Write>(data: &Dataset, writer: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    for observation in data.iter() {
        writer.serialize(observation)?;
    }
    writer.flush()?;
    Ok(())
}

/// Simulate sites from the given mixture and write them to the output (STDOUT if
/// omitted).
pub fn simulate(
    weights: &[f64],
    rates: &[f64],
    sites: usize,
    mean_coverage: f64,
    seed: u64,
    output: Option<&PathBuf>,
) -> Result<()> {
    let simulation = Simulation::new(weights, rates, mean_coverage)?;
    let data = simulation.sample(sites, &mut StdRng::seed_from_u64(seed))?;
    info!(
        "Simulated {} sites with a total coverage of {}.",
        data.len(),
        data.total_coverage()
    );

    if let Some(path) = output {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        write_observations(&data, file)
    } else {
        write_observations(&data, stdout())
    }
}
