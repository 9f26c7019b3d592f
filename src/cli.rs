// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;
use strum::VariantNames;

use crate::estimation::rate_classes;
use crate::estimation::rate_classes::output::OutputFormat;
use crate::simulation;

#[derive(Debug, StructOpt, Clone)]
#[structopt(
    name = "rateclass",
    about = "Estimate latent classes of sites sharing a common minority base rate from pileup counts."
)]
pub struct Rateclass {
    #[structopt(long, short, global = true, help = "Print debug information.")]
    pub verbose: bool,
    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, StructOpt, Clone)]
pub enum Command {
    #[structopt(
        name = "estimate-rate-classes",
        about = "Select the number of rate classes by AICc and fit their weights and minority rates.",
        usage = "rateclass estimate-rate-classes observations.tsv --nrestart 50 > report.json"
    )]
    EstimateRateClasses {
        #[structopt(
            parse(from_os_str),
            help = "TSV file with coverage and majority base count per site, \
                    optionally with header (if omitted, read from STDIN)."
        )]
        input: Option<PathBuf>,
        #[structopt(
            long,
            default_value = "50",
            help = "Number of randomized restarts per number of classes. More restarts make \
                    it less likely to miss the best fit, at the cost of runtime."
        )]
        nrestart: usize,
        #[structopt(
            long,
            default_value = "0",
            help = "Seed of the random number generator used for restarts."
        )]
        seed: u64,
        #[structopt(
            parse(from_os_str),
            long,
            help = "File that shall contain the report (if omitted, write to STDOUT)."
        )]
        output: Option<PathBuf>,
        #[structopt(
            long = "output-format",
            default_value = "json",
            possible_values = OutputFormat::VARIANTS,
            help = "Format of the report."
        )]
        output_format: OutputFormat,
    },
    #[structopt(
        name = "classify-sites",
        about = "Assign each site to its most probable rate class.",
        usage = "rateclass classify-sites observations.tsv --report report.json > classes.tsv"
    )]
    ClassifySites {
        #[structopt(
            parse(from_os_str),
            help = "TSV file with coverage and majority base count per site \
                    (if omitted, read from STDIN)."
        )]
        input: Option<PathBuf>,
        #[structopt(
            parse(from_os_str),
            long,
            help = "JSON report as written by estimate-rate-classes."
        )]
        report: PathBuf,
        #[structopt(
            parse(from_os_str),
            long,
            help = "TSV file that shall contain the class of each site (if omitted, write to STDOUT)."
        )]
        output: Option<PathBuf>,
    },
    #[structopt(
        name = "simulate",
        about = "Simulate observations from a known mixture of rate classes.",
        usage = "rateclass simulate --weights 0.7 0.3 --rates 0.01 0.5 --sites 2000 > observations.tsv"
    )]
    Simulate {
        #[structopt(long, required = true, help = "Weights of the classes (summing to 1).")]
        weights: Vec<f64>,
        #[structopt(
            long,
            required = true,
            help = "Minority base rates of the classes, in the same order as the weights."
        )]
        rates: Vec<f64>,
        #[structopt(long, default_value = "1000", help = "Number of sites to simulate.")]
        sites: usize,
        #[structopt(
            long = "mean-coverage",
            default_value = "30",
            help = "Mean of the Poisson distributed coverage per site."
        )]
        mean_coverage: f64,
        #[structopt(long, default_value = "0", help = "Seed of the random number generator.")]
        seed: u64,
        #[structopt(
            parse(from_os_str),
            long,
            help = "TSV file that shall contain the observations (if omitted, write to STDOUT)."
        )]
        output: Option<PathBuf>,
    },
}

pub fn run(opt: Rateclass) -> Result<()> {
    match opt.command {
        Command::EstimateRateClasses {
            input,
            nrestart,
            seed,
            output,
            output_format,
        } => rate_classes::estimate_rate_classes(
            input.as_ref(),
            output.as_ref(),
            output_format,
            nrestart,
            seed,
        ),
        Command::ClassifySites {
            input,
            report,
            output,
        } => rate_classes::classify_sites(input.as_ref(), &report, output.as_ref()),
        Command::Simulate {
            weights,
            rates,
            sites,
            mean_coverage,
            seed,
            output,
        } => simulation::simulate(&weights, &rates, sites, mean_coverage, seed, output.as_ref()),
    }
}
