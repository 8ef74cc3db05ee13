use std::io::Write;
use std::path::Path;

use anyhow::Result;

use oxn_core::normalize::find;
use oxn_core::samples::results_or_sample;
use oxn_core::{flatten, summarize};

use super::{TableArgs, ViewContext};
use crate::columns::{detail_columns, summary_columns, DETAIL_FILTER, SUMMARY_FILTER};
use crate::table::TableView;

/// Overview of all experiment results, one row per experiment.
pub fn results(
    ctx: &ViewContext,
    out: &mut dyn Write,
    source: Option<&Path>,
    args: &TableArgs,
) -> Result<()> {
    let view = TableView::new(summary_columns(), ctx.dates())
        .filter_on(SUMMARY_FILTER)?
        .filter(args.filter.as_deref())
        .sort_by(args.sort.as_deref(), args.desc)?;

    let experiments = results_or_sample(source)?;
    let rows = summarize(&experiments);

    writeln!(out, "All Experiment Results")?;
    writeln!(out, "{}", view.render(&rows))?;
    Ok(())
}

/// Per-interaction details of one experiment. An unknown id gives an empty table.
pub fn result(
    ctx: &ViewContext,
    out: &mut dyn Write,
    experiment_id: &str,
    source: Option<&Path>,
    args: &TableArgs,
) -> Result<()> {
    let view = TableView::new(detail_columns(), ctx.dates())
        .filter_on(DETAIL_FILTER)?
        .filter(args.filter.as_deref())
        .sort_by(args.sort.as_deref(), args.desc)?;

    let experiments = results_or_sample(source)?;
    let rows = flatten(find(&experiments, experiment_id));

    writeln!(out, "Details for #{}", experiment_id)?;
    writeln!(out, "{}", view.render(&rows))?;
    if rows.is_empty() {
        writeln!(out, "No results found for experiment '{}'", experiment_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxn_core::{DashboardConfig, DisplayZone};

    fn ctx() -> ViewContext {
        ViewContext::new(DashboardConfig::default().with_display_zone(DisplayZone::Utc))
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut out: Vec<u8> = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_results_overview() {
        let text = render(|out| results(&ctx(), out, None, &TableArgs::default()));
        assert!(text.starts_with("All Experiment Results"));
        assert!(text.contains("# of Runs"));
        assert!(text.contains("sample_treatment"));
        assert!(text.contains("2024-09-17 15:10:56"));
    }

    #[test]
    fn test_results_filter() {
        let args = TableArgs {
            filter: Some("003".into()),
            ..Default::default()
        };
        let text = render(|out| results(&ctx(), out, None, &args));
        assert!(text.contains("delay_treatment"));
        assert!(!text.contains("sample_treatment"));
    }

    #[test]
    fn test_result_detail_for_run() {
        let args = TableArgs {
            filter: Some("1".into()),
            ..Default::default()
        };
        let text = render(|out| result(&ctx(), out, "002", None, &args));
        assert!(text.starts_with("Details for #002"));
        assert!(text.contains("sample_treatment"));
        assert!(text.contains("41210"));
        assert!(!text.contains("52904"));
    }

    #[test]
    fn test_unknown_result_is_empty() {
        let text = render(|out| result(&ctx(), out, "404", None, &TableArgs::default()));
        assert!(text.contains("Run ID"));
        assert!(text.contains("No results found for experiment '404'"));
    }
}
