//! Column configurations for the dashboard tables.

use oxn_core::{ExperimentDetail, ExperimentStatus, ExperimentSummary};

use crate::table::{Cell, Column};

/// Filter column of the results overview.
pub const SUMMARY_FILTER: &str = "experiment_id";
/// Filter column of the result detail table.
pub const DETAIL_FILTER: &str = "run_id";
/// Filter column of the live experiment list.
pub const EXPERIMENT_FILTER: &str = "id";

pub fn summary_columns() -> Vec<Column<ExperimentSummary>> {
    vec![
        Column::new("experiment_date", "Date", |r: &ExperimentSummary| {
            Cell::timestamp(&r.experiment_date)
        }),
        Column::new("experiment_id", "Experiment ID", |r: &ExperimentSummary| {
            Cell::text(&r.experiment_id)
        }),
        Column::new("number_of_runs", "# of Runs", |r: &ExperimentSummary| {
            Cell::Count(r.number_of_runs as u64)
        }),
        Column::new("treatment_names", "Treatment Names", |r: &ExperimentSummary| {
            Cell::List(r.treatment_names.clone())
        }),
        Column::new("treatment_types", "Treatment Types", |r: &ExperimentSummary| {
            Cell::List(r.treatment_types.clone())
        }),
    ]
}

pub fn detail_columns() -> Vec<Column<ExperimentDetail>> {
    vec![
        Column::new("run_date", "Date", |r: &ExperimentDetail| Cell::timestamp(&r.run_date)),
        Column::new("run_id", "Run ID", |r: &ExperimentDetail| Cell::text(&r.run_id)),
        Column::new("interaction_id", "Interaction ID", |r: &ExperimentDetail| {
            Cell::text(&r.interaction_id)
        }),
        Column::new("treatment_name", "Treatment Name", |r: &ExperimentDetail| {
            Cell::text(&r.treatment_name)
        }),
        Column::new("treatment_type", "Treatment Type", |r: &ExperimentDetail| {
            Cell::text(&r.treatment_type)
        }),
        Column::new("treatment_start", "Treatment Start", |r: &ExperimentDetail| {
            Cell::timestamp(&r.treatment_start)
        }),
        Column::new("treatment_end", "Treatment End", |r: &ExperimentDetail| {
            Cell::timestamp(&r.treatment_end)
        }),
        Column::new("response_name", "Response Name", |r: &ExperimentDetail| {
            Cell::text(&r.response_name)
        }),
        Column::new("response_type", "Response Type", |r: &ExperimentDetail| {
            Cell::text(&r.response_type)
        }),
        Column::new("loadgen_total_requests", "Total Requests", |r: &ExperimentDetail| {
            Cell::Count(r.loadgen_total_requests)
        }),
        Column::new("loadgen_total_failures", "Total Failures", |r: &ExperimentDetail| {
            Cell::Count(r.loadgen_total_failures)
        }),
    ]
}

pub fn experiment_columns() -> Vec<Column<ExperimentStatus>> {
    vec![
        Column::new("id", "Experiment ID", |r: &ExperimentStatus| Cell::text(&r.id)),
        Column::new("name", "Experiment name", |r: &ExperimentStatus| Cell::text(&r.name)),
        Column::new("started_at", "Started at", |r: &ExperimentStatus| {
            Cell::Timestamp(r.started_at.clone())
        }),
        Column::new("completed_at", "Completed at", |r: &ExperimentStatus| {
            Cell::Timestamp(r.completed_at.clone())
        }),
        Column::new("status", "Status", |r: &ExperimentStatus| Cell::text(r.status.to_string())),
    ]
}
