//! oxn-core: data model, result normalization and backend client for the OXN dashboard.
//!
//! Experiment result trees are read-only snapshots. Everything that touches the
//! network goes through an [`api::ApiClient`] built around an injected
//! [`api::Transport`], so the normalizer and the upload pipeline stay testable
//! without a backend.

pub mod api;
pub mod config;
pub mod dates;
pub mod error;
pub mod keyed;
pub mod models;
pub mod normalize;
pub mod samples;
pub mod upload;

pub use api::{ApiClient, ApiError, HttpTransport, RequestOptions, Transport};
pub use config::DashboardConfig;
pub use dates::{DateFormatter, DisplayZone};
pub use error::OxnError;
pub use keyed::Keyed;
pub use models::{
    DataFormat, Experiment, ExperimentFilter, ExperimentStatus, Interaction, Loadgen, OutputFormat,
    Run, RunOptions, Status,
};
pub use normalize::{flatten, summarize, DashboardMetrics, ExperimentDetail, ExperimentSummary};
pub use upload::{Notice, NoticeKind, SelectedFile, UploadError, UploadPipeline, UploadState};
