use std::fs;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::{Binomial, Discrete};

use rateclass::estimation::rate_classes::output::OutputFormat;
use rateclass::estimation::rate_classes::{classify_sites, estimate, estimate_rate_classes};
use rateclass::model::{Dataset, Observation};
use rateclass::simulation::{simulate, Simulation};

fn setup_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Sites of a single class at fixed coverage, with minority counts distributed exactly
/// (up to largest remainder rounding) as expected under the binomial.
fn expected_sites(sites: usize, coverage: u32, rate: f64) -> Vec<Observation> {
    let binomial = Binomial::new(rate, u64::from(coverage)).unwrap();
    let expected = (0..=coverage)
        .map(|minority| binomial.pmf(u64::from(minority)) * sites as f64)
        .collect::<Vec<_>>();

    let mut counts = expected.iter().map(|e| e.floor() as usize).collect::<Vec<_>>();
    let mut remainders = expected
        .iter()
        .enumerate()
        .map(|(minority, e)| (minority, e - e.floor()))
        .collect::<Vec<_>>();
    remainders.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then(a.0.cmp(&b.0)));
    let missing = sites - counts.iter().sum::<usize>();
    for &(minority, _) in remainders.iter().take(missing) {
        counts[minority] += 1;
    }

    counts
        .iter()
        .enumerate()
        .flat_map(|(minority, &count)| {
            let majority = coverage - minority as u32;
            std::iter::repeat(Observation::new(coverage, majority).unwrap()).take(count)
        })
        .collect()
}

/// Two classes (weights 0.7/0.3, minority rates 0.01/0.5) over 2000 sites with
/// coverages between 26 and 34.
fn two_class_dataset() -> Dataset {
    let mut observations = Vec::new();
    for &coverage in &[26, 28, 30, 32, 34] {
        observations.extend(expected_sites(280, coverage, 0.01));
        observations.extend(expected_sites(120, coverage, 0.5));
    }
    Dataset::new(observations)
}

macro_rules! assert_within {
    ($value:expr, $expected:expr, $relative:expr) => {
        assert!(
            (($value - $expected) / $expected).abs() <= $relative,
            "{} is not within {} of {}",
            $value,
            $relative,
            $expected
        );
    };
}

#[test]
fn test_recover_two_classes() {
    setup_logger();
    let data = two_class_dataset();
    assert_eq!(data.len(), 2000);

    let result = estimate(&data, 5, 0).unwrap();

    assert_eq!(result.model().order(), 2);
    let rates = result.model().rates();
    let weights = result.model().weights();
    assert_within!(rates[0], 0.01, 0.1);
    assert_within!(rates[1], 0.5, 0.1);
    assert_within!(weights[0], 0.7, 0.1);
    assert_within!(weights[1], 0.3, 0.1);
    assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
}

#[test]
fn test_recover_simulated_classes() {
    setup_logger();
    let simulation = Simulation::new(&[0.7, 0.3], &[0.01, 0.5], 30.0).unwrap();
    let data = simulation
        .sample(2000, &mut StdRng::seed_from_u64(5))
        .unwrap();

    let result = estimate(&data, 5, 1).unwrap();

    assert!(result.model().order() >= 2);
    let low_rate_weight: f64 = result
        .model()
        .iter()
        .filter(|class| class.rate < 0.2)
        .map(|class| class.weight)
        .sum();
    assert_within!(low_rate_weight, 0.7, 0.1);
    assert!(result.model()[0].rate < 0.02);
}

#[test]
fn test_deterministic_given_seed() {
    let simulation = Simulation::new(&[0.5, 0.3, 0.2], &[0.02, 0.2, 0.45], 25.0).unwrap();
    let data = simulation
        .sample(300, &mut StdRng::seed_from_u64(13))
        .unwrap();

    let first = estimate(&data, 8, 99).unwrap();
    let second = estimate(&data, 8, 99).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_zero_coverage() {
    let data: Dataset = (0..10).map(|_| Observation::new(0, 0).unwrap()).collect();

    let result = estimate(&data, 3, 0).unwrap();

    assert_eq!(result.model().order(), 1);
    assert_eq!(result.majority_model().rates(), vec![1.0]);
    assert_eq!(result.ln_likelihood(), 0.0);
    assert!(result.aicc().is_finite());
}

#[test]
fn test_estimate_and_classify_files() {
    setup_logger();
    let dir = tempfile::tempdir().unwrap();
    let observations = dir.path().join("observations.tsv");
    let report = dir.path().join("report.json");
    let classes = dir.path().join("classes.tsv");

    simulate(&[0.8, 0.2], &[0.01, 0.4], 200, 30.0, 3, Some(&observations)).unwrap();
    estimate_rate_classes(
        Some(&observations),
        Some(&report),
        OutputFormat::Json,
        3,
        0,
    )
    .unwrap();

    let rendered = fs::read_to_string(&report).unwrap();
    assert!(rendered.starts_with("{\n  \"logl\":     -"));
    assert!(rendered.ends_with(" ]\n}\n"));
    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(
        parsed["rates"].as_array().unwrap().len(),
        parsed["weights"].as_array().unwrap().len()
    );

    classify_sites(Some(&observations), &report, Some(&classes)).unwrap();
    let assignments = fs::read_to_string(&classes).unwrap();
    let lines = assignments.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], "coverage\tmajority\tclass\tposterior");
    assert_eq!(lines.len(), 201);
}

#[test]
fn test_tsv_report() {
    let dir = tempfile::tempdir().unwrap();
    let observations = dir.path().join("observations.tsv");
    let report = dir.path().join("report.tsv");

    simulate(&[1.0], &[0.05], 50, 20.0, 0, Some(&observations)).unwrap();
    estimate_rate_classes(Some(&observations), Some(&report), OutputFormat::Tsv, 2, 0).unwrap();

    let rendered = fs::read_to_string(&report).unwrap();
    assert!(rendered.starts_with("# log-likelihood: "));
    assert!(rendered.contains("class\trate\tweight\n0\t"));
}
