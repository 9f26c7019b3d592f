// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Estimation of latent rate classes from per-site pileup counts.
//!
//! This module provides:
//! 1. EM fitting of a mixture of binomial rate classes (`em`, `initialization`)
//! 2. Model order selection by AICc with randomized restarts (`selection`)
//! 3. Assignment of sites to their most probable class (`classification`)
//! 4. Reading observations and writing reports (`input`, `output`)

pub mod classification;
pub mod em;
pub mod initialization;
pub mod input;
pub mod output;
pub mod selection;

use std::cmp::Ordering;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::model::{Dataset, Model, RateClass};
use output::OutputFormat;
use selection::ModelSelector;

/// Selected rate class mixture.
///
/// Rates are minority rates, classes are sorted ascending by rate.
#[derive(Debug, Clone, PartialEq, Getters, CopyGetters)]
pub struct FitResult {
    /// Log-likelihood including binomial coefficients.
    #[getset(get_copy = "pub")]
    ln_likelihood: f64,
    #[getset(get_copy = "pub")]
    aicc: f64,
    #[getset(get = "pub")]
    model: Model,
}

impl FitResult {
    /// Create a result from a model that already carries minority rates; classes are
    /// sorted by rate.
    pub fn new(ln_likelihood: f64, aicc: f64, model: Model) -> Self {
        let mut classes = model.into_classes();
        classes.sort_by(|a, b| a.rate.partial_cmp(&b.rate).unwrap_or(Ordering::Equal));
        FitResult {
            ln_likelihood,
            aicc,
            model: Model::new(classes),
        }
    }

    /// Create a result from a fitted model with majority rates.
    pub(crate) fn from_majority_rates(ln_likelihood: f64, aicc: f64, model: Model) -> Self {
        Self::new(ln_likelihood, aicc, invert_rates(&model))
    }

    /// The reported model with rates converted back to majority rates, as fitted.
    pub fn majority_model(&self) -> Model {
        invert_rates(&self.model)
    }
}

fn invert_rates(model: &Model) -> Model {
    Model::new(
        model
            .iter()
            .map(|class| RateClass::new(class.weight, 1.0 - class.rate))
            .collect(),
    )
}

fn output_writer(output: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file {}", path.display())
        })?)),
        None => Box::new(stdout()),
    })
}

/// Estimate rate classes from observations and write the report.
///
/// # Arguments
///
/// * `input` - TSV with coverage and majority count per site (if omitted, read from STDIN)
/// * `output` - report path (if omitted, write to STDOUT)
/// * `format` - report format
/// * `nrestart` - randomized restarts per model order
/// * `seed` - seed of the random number generator used for restarts
pub fn estimate_rate_classes(
    input: Option<&PathBuf>,
    output: Option<&PathBuf>,
    format: OutputFormat,
    nrestart: usize,
    seed: u64,
) -> Result<()> {
    let data = input::read_observations(input)?;
    info!("Read {} observations.", data.len());

    let result = estimate(&data, nrestart, seed)?;
    info!(
        "Selected {} rate classes (log-likelihood={:.3}, AICc={:.3}).",
        result.model().order(),
        result.ln_likelihood(),
        result.aicc()
    );

    let mut writer = output_writer(output)?;
    match format {
        OutputFormat::Json => output::write_json(&result, &mut writer)?,
        OutputFormat::Tsv => output::write_tsv(&result, &mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

/// Run model selection with a random number generator seeded by `seed`.
pub fn estimate(data: &Dataset, nrestart: usize, seed: u64) -> Result<FitResult> {
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(ModelSelector::new(nrestart)?.select(data, &mut rng)?)
}

/// Assign each observation to its most probable class under a previously written JSON
/// report.
pub fn classify_sites(
    input: Option<&PathBuf>,
    report: &PathBuf,
    output: Option<&PathBuf>,
) -> Result<()> {
    let result = output::read_json(
        File::open(report)
            .with_context(|| format!("Failed to open report {}", report.display()))?,
    )?;
    let data = input::read_observations(input)?;

    let sites = classification::classify(&data, &result)?;
    let mut writer = output_writer(output)?;
    output::write_assignments(&sites, &mut writer)?;
    writer.flush()?;
    Ok(())
}
