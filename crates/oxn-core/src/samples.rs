//! Result tree sources: the bundled sample snapshot and snapshot files on disk.
//!
//! The backend does not serve result trees yet, so the results views read a
//! snapshot file (JSON or YAML) or fall back to the bundled sample.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::models::Experiment;

const SAMPLE_RESULTS: &str = include_str!("../data/sample_results.json");

/// The bundled sample results.
pub fn sample_results() -> Result<Vec<Experiment>> {
    Ok(serde_json::from_str(SAMPLE_RESULTS)?)
}

/// Load result trees from a `.json`, `.yaml` or `.yml` file.
pub fn load_results(path: &Path) -> Result<Vec<Experiment>> {
    let content = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let experiments: Vec<Experiment> = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };
    check_loadgen(&experiments);
    info!(path = %path.display(), experiments = experiments.len(), "Loaded result snapshot");
    Ok(experiments)
}

/// Result trees from `path`, or the bundled sample when no path is given.
pub fn results_or_sample(path: Option<&Path>) -> Result<Vec<Experiment>> {
    match path {
        Some(p) => load_results(p),
        None => sample_results(),
    }
}

fn check_loadgen(experiments: &[Experiment]) {
    for experiment in experiments {
        for (key, run) in experiment.runs.iter() {
            if !run.loadgen.is_consistent() {
                warn!(
                    experiment = %experiment.experiment_id,
                    run = %key,
                    "Load generator reports more failures than requests"
                );
            }
        }
    }
}
