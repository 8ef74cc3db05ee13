//! Example of using oxn-core directly from Rust.

use oxn_core::dates::DateFormatter;
use oxn_core::normalize::{dashboard_metrics, find};
use oxn_core::samples::results_or_sample;
use oxn_core::{flatten, summarize};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Pass a results file, or fall back to the bundled sample.
    let path = std::env::args().nth(1).map(PathBuf::from);
    let experiments = results_or_sample(path.as_deref())?;
    let dates = DateFormatter::utc();

    for summary in summarize(&experiments) {
        println!(
            "{}  {}  runs={}  treatments={}",
            dates.format(&summary.experiment_date),
            summary.experiment_id,
            summary.number_of_runs,
            summary.treatment_names.join(", ")
        );
    }

    if let Some(first) = experiments.first() {
        let rows = flatten(find(&experiments, &first.experiment_id));
        println!("{} interaction rows in {}", rows.len(), first.experiment_id);
    }

    let metrics = dashboard_metrics(&experiments);
    println!(
        "{} runs, {} requests, {} failures",
        metrics.total_runs, metrics.total_requests, metrics.total_failures
    );

    Ok(())
}
