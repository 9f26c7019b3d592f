// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Reading of per-site observations.
//!
//! Input is tab-separated with one `coverage<TAB>majority` row per site. A leading
//! header row (`coverage<TAB>majority`) is optional, lines starting with `#` are
//! ignored.

use std::fs::File;
use std::io::{stdin, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use csv::ReaderBuilder;

use crate::errors;
use crate::model::{Dataset, Observation};

const HEADER: [&str; 2] = ["coverage", "majority"];

/// Read observations from the given path, or from STDIN if omitted.
pub fn read_observations(path: Option<&PathBuf>) -> Result<Dataset> {
    if let Some(path) = path {
        let file = File::open(path)
            .with_context(|| format!("Failed to open observations {}", path.display()))?;
        parse_observations(file)
    } else {
        parse_observations(stdin())
    }
}

pub fn parse_observations<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(reader);

    let mut observations = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(i + 1, |pos| pos.line() as usize);

        if i == 0 && record.iter().eq(HEADER.iter().cloned()) {
            continue;
        }
        if record.len() != 2 {
            return Err(errors::invalid_observation_record(
                line,
                &format!("expected 2 columns, found {}", record.len()),
            )
            .into());
        }

        let count = |idx: usize| -> Result<u32> {
            record[idx].trim().parse::<u32>().map_err(|err| {
                errors::invalid_observation_record(
                    line,
                    &format!("{} is not a valid count: {}", HEADER[idx], err),
                )
                .into()
            })
        };
        let observation = Observation::new(count(0)?, count(1)?)
            .map_err(|err| errors::invalid_observation_record(line, &err.to_string()))?;
        observations.push(observation);
    }

    Ok(Dataset::new(observations))
}
