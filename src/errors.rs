// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("unable to allocate responsibility matrix of {rows} x {cols} entries")]
    AllocationFailure { rows: usize, cols: usize },
    #[error("numerical instability: observation {observation} has zero likelihood under every rate class of the current model")]
    NumericalInstability { observation: usize },
    #[error("AICc is undefined for order {order}: {parameters} parameters require more than {observations} observations")]
    UndefinedCriterion {
        order: usize,
        parameters: usize,
        observations: usize,
    },
    #[error("invalid observation: majority count {majority} exceeds coverage {coverage}")]
    InvalidObservation { coverage: u32, majority: u32 },
    #[error("invalid number of restarts, must be at least 1")]
    InvalidRestartCount,
    #[error("invalid mixture: {msg}")]
    InvalidMixture { msg: String },
    #[error("invalid observation record in line {line}: {msg}")]
    InvalidObservationRecord { line: usize, msg: String },
    #[error("invalid rate class report: rates and weights differ in length ({rates} vs {weights})")]
    InvalidReport { rates: usize, weights: usize },
}

pub(crate) fn invalid_observation_record(line: usize, msg: &str) -> Error {
    Error::InvalidObservationRecord {
        line,
        msg: msg.to_owned(),
    }
}
