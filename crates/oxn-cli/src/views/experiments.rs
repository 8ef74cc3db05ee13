use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Table};

use oxn_core::{DataFormat, ExperimentFilter};

use super::{spinner, TableArgs, ViewContext};
use crate::columns::{experiment_columns, EXPERIMENT_FILTER};
use crate::table::TableView;

#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub table: TableArgs,
}

/// Live experiment list from the backend.
pub async fn experiments(ctx: &ViewContext, out: &mut dyn Write, args: &ListArgs) -> Result<()> {
    let view = TableView::new(experiment_columns(), ctx.dates())
        .filter_on(EXPERIMENT_FILTER)?
        .filter(args.table.filter.as_deref())
        .sort_by(args.table.sort.as_deref(), args.table.desc)?;

    let api = ctx.api()?;
    let filter = ExperimentFilter {
        status: args.status.clone(),
        limit: args.limit,
    };
    let pb = spinner("Fetching experiments...");
    let fetched = api.list_experiments(&filter).await;
    pb.finish_and_clear();
    let experiments = fetched.context("Error fetching experiments")?;

    if experiments.is_empty() {
        writeln!(out, "No experiments found at {}", ctx.config().backend_url)?;
        return Ok(());
    }
    writeln!(out, "{}", view.render(&experiments))?;
    Ok(())
}

/// Refresh the status of one experiment.
pub async fn status(ctx: &ViewContext, out: &mut dyn Write, id: &str) -> Result<()> {
    let api = ctx.api()?;
    let status = api
        .experiment_status(id)
        .await
        .context("Error happened while refreshing status of experiment.")?;

    let dates = ctx.dates();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(["Field", "Value"]);
    table.add_row(["Experiment ID", status.id.as_str()]);
    table.add_row(["Experiment name", status.name.as_str()]);
    table.add_row(["Status", &status.status.to_string()]);
    table.add_row(["Created at", &dates.format_opt(status.created_at.as_deref())]);
    table.add_row(["Started at", &dates.format_opt(status.started_at.as_deref())]);
    table.add_row(["Completed at", &dates.format_opt(status.completed_at.as_deref())]);
    if let Some(message) = &status.error_message {
        table.add_row(["Error", message.as_str()]);
    }
    writeln!(out, "{}", table)?;
    Ok(())
}

/// Fetch the benchmark payload; write it to `output` or print it.
pub async fn benchmark(
    ctx: &ViewContext,
    out: &mut dyn Write,
    id: &str,
    output: Option<&Path>,
) -> Result<()> {
    let api = ctx.api()?;
    let pb = spinner("Downloading benchmark...");
    let fetched = api.benchmark(id).await;
    pb.finish_and_clear();
    let body = fetched.context("Error happened while downloading file.")?;

    save_or_print(out, &body, output, &format!("benchmark for {}", id))
}

/// Fetch the run data of an experiment; write it to `output` or print it.
pub async fn data(
    ctx: &ViewContext,
    out: &mut dyn Write,
    id: &str,
    format: DataFormat,
    output: Option<&Path>,
) -> Result<()> {
    let api = ctx.api()?;
    let pb = spinner("Downloading run data...");
    let fetched = api.experiment_data(id, format).await;
    pb.finish_and_clear();
    let body = fetched.context("Error happened while downloading file.")?;

    save_or_print(out, &body, output, &format!("{} data for {}", format.as_str(), id))
}

fn save_or_print(out: &mut dyn Write, body: &str, output: Option<&Path>, what: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            writeln!(out, "Saved {} to {}", what, path.display())?;
        }
        None => write!(out, "{}", body)?,
    }
    Ok(())
}

pub async fn health(ctx: &ViewContext, out: &mut dyn Write) -> Result<()> {
    let api = ctx.api()?;
    let health = api
        .health()
        .await
        .with_context(|| format!("Backend at {} is unreachable", ctx.config().backend_url))?;
    writeln!(out, "Backend {}: {}", ctx.config().backend_url, health.status)?;
    Ok(())
}
