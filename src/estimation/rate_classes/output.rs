// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Reports of selected rate classes and per-site assignments.

use std::io::{Read, Write};

use anyhow::{Context, Result};

use crate::errors::Error;
use crate::estimation::rate_classes::classification::SiteClass;
use crate::estimation::rate_classes::FitResult;
use crate::model::{Model, RateClass};

#[derive(
    Display,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumString,
    IntoStaticStr,
    VariantNames,
)]
#[strum(serialize_all = "kebab_case")]
pub enum OutputFormat {
    Json,
    Tsv,
}

/// Report as read back from JSON.
#[derive(Debug, Deserialize)]
struct Report {
    logl: f64,
    aicc: f64,
    rates: Vec<f64>,
    weights: Vec<f64>,
}

/// Fixed precision with a leading blank for non-negative values.
fn signed(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    if formatted.starts_with('-') {
        formatted
    } else {
        format!(" {}", formatted)
    }
}

fn values(values: &[f64]) -> String {
    values.iter().map(|v| format!("{:.7}", v)).collect::<Vec<_>>().join(", ")
}

/// Render the JSON report.
///
/// # Example Output
/// ```text
/// {
///   "logl":     -123.457,
///   "aicc":      250.900,
///   "rates":   [ 0.0123400, 0.5000000 ],
///   "weights": [ 0.7000000, 0.3000000 ]
/// }
/// ```
pub fn render_json(result: &FitResult) -> String {
    format!(
        "{{\n  \"logl\":     {},\n  \"aicc\":     {},\n  \"rates\":   [ {} ],\n  \"weights\": [ {} ]\n}}\n",
        signed(result.ln_likelihood()),
        signed(result.aicc()),
        values(&result.model().rates()),
        values(&result.model().weights()),
    )
}

pub fn write_json<W: Write>(result: &FitResult, writer: &mut W) -> Result<()> {
    writer
        .write_all(render_json(result).as_bytes())
        .context("Failed to write rate class report")?;
    Ok(())
}

/// Write the report as TSV with one row per class.
///
/// # Example Output
/// ```text
/// # log-likelihood: -123.457
/// # AICc: 250.900
/// class	rate	weight
/// 0	0.0123400	0.7000000
/// 1	0.5000000	0.3000000
/// ```
pub fn write_tsv<W: Write>(result: &FitResult, writer: &mut W) -> Result<()> {
    writeln!(writer, "# log-likelihood: {:.3}", result.ln_likelihood())?;
    writeln!(writer, "# AICc: {:.3}", result.aicc())?;
    writeln!(writer, "class\trate\tweight")?;
    for (i, class) in result.model().iter().enumerate() {
        writeln!(writer, "{}\t{:.7}\t{:.7}", i, class.rate, class.weight)?;
    }
    Ok(())
}

/// Read a JSON report written by `write_json`.
pub fn read_json<R: Read>(reader: R) -> Result<FitResult> {
    let report: Report =
        serde_json::from_reader(reader).context("Failed to parse rate class report")?;
    if report.rates.len() != report.weights.len() || report.rates.is_empty() {
        return Err(Error::InvalidReport {
            rates: report.rates.len(),
            weights: report.weights.len(),
        }
        .into());
    }

    let model = Model::new(
        report
            .weights
            .iter()
            .zip(report.rates.iter())
            .map(|(&weight, &rate)| RateClass::new(weight, rate))
            .collect(),
    );
    Ok(FitResult::new(report.logl, report.aicc, model))
}

/// Write per-site class assignments as TSV with header.
pub fn write_assignments<W: Write>(sites: &[SiteClass], writer: &mut W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    for site in sites {
        writer.serialize(site)?;
    }
    writer.flush()?;
    Ok(())
}
