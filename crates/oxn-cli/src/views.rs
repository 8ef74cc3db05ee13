//! Page-level views. Each view fetches or loads its data, runs it through the
//! normalizer where needed, and writes a table to `out`.

mod dashboard;
mod experiments;
mod results;
mod upload;

use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use oxn_core::dates::DateFormatter;
use oxn_core::{ApiClient, ApiError, DashboardConfig, UploadError};

pub use dashboard::{dashboard, format_duration, CARDS};
pub use experiments::{benchmark, data, experiments, health, status, ListArgs};
pub use results::{result, results};
pub use upload::{upload, UploadArgs};

/// Filter and sort options shared by the table views.
#[derive(Debug, Clone, Default)]
pub struct TableArgs {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub desc: bool,
}

/// What every view needs: configuration, the date formatter, and a way to
/// reach the backend.
pub struct ViewContext {
    config: DashboardConfig,
    dates: DateFormatter,
    api: Option<ApiClient>,
}

impl ViewContext {
    pub fn new(config: DashboardConfig) -> Self {
        let dates = DateFormatter::new(config.display_zone);
        Self {
            config,
            dates,
            api: None,
        }
    }

    /// Use `api` instead of building an HTTP client from the configuration.
    pub fn with_api(mut self, api: ApiClient) -> Self {
        self.api = Some(api);
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn dates(&self) -> DateFormatter {
        self.dates
    }

    /// A client for one view, with its own loading and error state.
    pub fn api(&self) -> Result<ApiClient> {
        match &self.api {
            Some(api) => Ok(api.handle()),
            None => Ok(ApiClient::from_config(&self.config)?),
        }
    }
}

/// Failures shown as a one-line notice rather than the error view.
pub fn is_notice(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.is::<ApiError>() || cause.is::<UploadError>())
}

pub fn notice_line(err: &anyhow::Error) -> String {
    format!("✗ {:#}", err)
}

/// Fallback view for anything a view did not expect.
pub fn error_view(err: &anyhow::Error) -> String {
    format!("Something went wrong\n\n{:#}", err)
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
