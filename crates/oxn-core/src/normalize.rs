//! Reshape experiment result trees into flat table rows.
//!
//! Pure functions only. Timestamps are passed through untouched; the
//! [`DateFormatter`](crate::dates::DateFormatter) deals with them at render time.

use serde::Serialize;
use tracing::warn;

use crate::dates::parse_timestamp;
use crate::models::Experiment;

/// One row of the results overview.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExperimentSummary {
    pub experiment_id: String,
    pub experiment_date: String,
    pub number_of_runs: usize,
    /// Distinct treatment names over all runs. Order is not significant.
    pub treatment_names: Vec<String>,
    /// Distinct treatment types over all runs. Order is not significant.
    pub treatment_types: Vec<String>,
}

/// One row per (run, interaction) of a single experiment.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExperimentDetail {
    pub experiment_id: String,
    pub experiment_date: String,
    pub run_id: String,
    pub run_date: String,
    pub loadgen_start_time: String,
    pub loadgen_end_time: String,
    pub loadgen_total_requests: u64,
    pub loadgen_total_failures: u64,
    pub interaction_id: String,
    pub treatment_name: String,
    pub treatment_type: String,
    pub treatment_start: String,
    pub treatment_end: String,
    pub response_name: String,
    pub response_start: String,
    pub response_end: String,
    pub response_type: String,
    pub store_key: String,
}

fn push_distinct(into: &mut Vec<String>, value: &str) {
    if !into.iter().any(|v| v == value) {
        into.push(value.to_string());
    }
}

/// One summary row per experiment, in input order.
pub fn summarize(experiments: &[Experiment]) -> Vec<ExperimentSummary> {
    experiments
        .iter()
        .map(|experiment| {
            let mut treatment_names = Vec::new();
            let mut treatment_types = Vec::new();
            for run in experiment.runs.values() {
                for interaction in run.interactions.values() {
                    push_distinct(&mut treatment_names, &interaction.treatment_name);
                    push_distinct(&mut treatment_types, &interaction.treatment_type);
                }
            }
            ExperimentSummary {
                experiment_id: experiment.experiment_id.clone(),
                experiment_date: experiment.date.clone(),
                number_of_runs: experiment.runs.len(),
                treatment_names,
                treatment_types,
            }
        })
        .collect()
}

/// Flatten one experiment into detail rows. A missing experiment yields no rows.
pub fn flatten(experiment: Option<&Experiment>) -> Vec<ExperimentDetail> {
    let Some(experiment) = experiment else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for run in experiment.runs.values() {
        let loadgen = &run.loadgen;
        for (interaction_id, interaction) in run.interactions.iter() {
            rows.push(ExperimentDetail {
                experiment_id: experiment.experiment_id.clone(),
                experiment_date: experiment.date.clone(),
                run_id: run.id.clone(),
                run_date: run.date.clone(),
                loadgen_start_time: loadgen.loadgen_start_time.clone(),
                loadgen_end_time: loadgen.loadgen_end_time.clone(),
                loadgen_total_requests: loadgen.loadgen_total_requests,
                loadgen_total_failures: loadgen.loadgen_total_failures,
                interaction_id: interaction_id.to_string(),
                treatment_name: interaction.treatment_name.clone(),
                treatment_type: interaction.treatment_type.clone(),
                treatment_start: interaction.treatment_start.clone(),
                treatment_end: interaction.treatment_end.clone(),
                response_name: interaction.response_name.clone(),
                response_start: interaction.response_start.clone(),
                response_end: interaction.response_end.clone(),
                response_type: interaction.response_type.clone(),
                store_key: interaction.store_key.clone(),
            });
        }
    }
    rows
}

/// Look up an experiment by id.
pub fn find<'a>(experiments: &'a [Experiment], experiment_id: &str) -> Option<&'a Experiment> {
    experiments.iter().find(|e| e.experiment_id == experiment_id)
}

/// Totals shown on the dashboard home.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct DashboardMetrics {
    pub total_runs: usize,
    pub total_requests: u64,
    pub total_failures: u64,
    /// `total_failures / total_requests`; `None` without any requests.
    pub failure_rate: Option<f64>,
    /// Mean load generator duration over runs with parseable timestamps.
    pub average_run_secs: Option<f64>,
}

pub fn dashboard_metrics(experiments: &[Experiment]) -> DashboardMetrics {
    let mut metrics = DashboardMetrics::default();
    let mut durations = Vec::new();

    for experiment in experiments {
        for (run_key, run) in experiment.runs.iter() {
            let loadgen = &run.loadgen;
            if !loadgen.is_consistent() {
                warn!(
                    experiment = %experiment.experiment_id,
                    run = %run_key,
                    requests = loadgen.loadgen_total_requests,
                    failures = loadgen.loadgen_total_failures,
                    "Load generator reports more failures than requests"
                );
            }
            metrics.total_runs += 1;
            metrics.total_requests = metrics
                .total_requests
                .saturating_add(loadgen.loadgen_total_requests);
            metrics.total_failures = metrics
                .total_failures
                .saturating_add(loadgen.loadgen_total_failures);

            let start = parse_timestamp(&loadgen.loadgen_start_time);
            let end = parse_timestamp(&loadgen.loadgen_end_time);
            if let (Some(start), Some(end)) = (start, end) {
                durations.push((end - start).num_milliseconds() as f64 / 1000.0);
            }
        }
    }

    if metrics.total_requests > 0 {
        metrics.failure_rate = Some(metrics.total_failures as f64 / metrics.total_requests as f64);
    }
    if !durations.is_empty() {
        metrics.average_run_secs = Some(durations.iter().sum::<f64>() / durations.len() as f64);
    }
    metrics
}
