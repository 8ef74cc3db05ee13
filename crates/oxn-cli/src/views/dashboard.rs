use std::io::Write;
use std::path::Path;

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Table};

use oxn_core::normalize::{dashboard_metrics, DashboardMetrics};
use oxn_core::samples::results_or_sample;

use super::ViewContext;

/// Metric cards of the home view: title and description.
pub const CARDS: [(&str, &str); 4] = [
    ("Total Experiment Runs", "The total number of experiment runs handled."),
    ("Total Failures", "The total number of failed load generator requests."),
    ("Failure Rate", "The share of load generator requests that failed."),
    ("Average Run Duration", "The average load generation time of a run."),
];

const MENU: [(&str, &str); 3] = [
    ("Dashboard", "oxn dashboard"),
    ("Experiments", "oxn experiments"),
    ("Results", "oxn results"),
];

fn card_values(m: &DashboardMetrics) -> [String; 4] {
    [
        m.total_runs.to_string(),
        m.total_failures.to_string(),
        m.failure_rate
            .map(|r| format!("{:.2}%", r * 100.0))
            .unwrap_or_else(|| "-".to_string()),
        m.average_run_secs
            .map(format_duration)
            .unwrap_or_else(|| "-".to_string()),
    ]
}

/// Home view: metric cards over the result trees, then the menu.
pub fn dashboard(ctx: &ViewContext, out: &mut dyn Write, results: Option<&Path>) -> Result<()> {
    let experiments = results_or_sample(results)?;
    let metrics = dashboard_metrics(&experiments);

    let mut cards = Table::new();
    cards.load_preset(UTF8_FULL);
    cards.set_header(["Metric", "Value", "Description"]);
    for ((title, description), value) in CARDS.iter().zip(card_values(&metrics)) {
        cards.add_row([*title, value.as_str(), *description]);
    }

    writeln!(out, "OXN Dashboard")?;
    writeln!(out, "   Backend: {}", ctx.config().backend_url)?;
    writeln!(out)?;
    writeln!(out, "{}", cards)?;
    writeln!(out)?;
    for (title, command) in MENU {
        writeln!(out, "   {:<12} {}", title, command)?;
    }
    writeln!(out)?;
    writeln!(out, "   Start new experiment:     oxn upload FILE --name NAME --start")?;
    writeln!(out, "   Explore past experiments: oxn experiments")?;
    Ok(())
}

pub fn format_duration(secs: f64) -> String {
    let secs = secs.max(0.0) as u64;
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{}h {}m", h, m)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}
