//! Data models for the OXN dashboard.
//!
//! Two shapes of "experiment" come from the backend: the result tree
//! ([`Experiment`] → [`Run`] → [`Interaction`]) used by the results views, and
//! the flat lifecycle record ([`ExperimentStatus`]) listed by `GET /experiments`.
//! Timestamps stay strings here; they are formatted at render time.

use serde::{Deserialize, Serialize};

use crate::keyed::Keyed;

/// A finished experiment and all of its runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experiment {
    pub experiment_id: String,
    pub date: String,
    #[serde(default)]
    pub runs: Keyed<Run>,
}

/// One execution of an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub interactions: Keyed<Interaction>,
    pub loadgen: Loadgen,
}

/// One treatment/response pairing within a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub treatment_name: String,
    pub treatment_type: String,
    pub treatment_start: String,
    pub treatment_end: String,
    pub response_name: String,
    pub response_start: String,
    pub response_end: String,
    pub response_type: String,
    /// Pointer into the external artifact store. Never dereferenced here.
    pub store_key: String,
}

/// Load generator statistics for a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Loadgen {
    pub loadgen_start_time: String,
    pub loadgen_end_time: String,
    pub loadgen_total_requests: u64,
    pub loadgen_total_failures: u64,
}

impl Loadgen {
    /// A run can never fail more requests than it sent.
    pub fn is_consistent(&self) -> bool {
        self.loadgen_total_failures <= self.loadgen_total_requests
    }
}

/// Lifecycle status reported by the backend.
///
/// Unknown values are kept verbatim so a newer backend never breaks the list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Pending,
    Running,
    Completed,
    Failed,
    Other(String),
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PENDING" => Status::Pending,
            "RUNNING" => Status::Running,
            "COMPLETED" => Status::Completed,
            "FAILED" => Status::Failed,
            _ => Status::Other(value),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.to_string()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pending => write!(f, "PENDING"),
            Status::Running => write!(f, "RUNNING"),
            Status::Completed => write!(f, "COMPLETED"),
            Status::Failed => write!(f, "FAILED"),
            Status::Other(s) => write!(f, "{}", s),
        }
    }
}

/// An experiment configuration as tracked by the backend (`GET /experiments`).
///
/// `started_at` and `completed_at` stay `None` until the backend performs the
/// corresponding transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentStatus {
    pub id: String,
    pub name: String,
    pub status: Status,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Body of `POST /experiments`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateExperiment<'a> {
    pub name: &'a str,
    pub config: &'a serde_json::Value,
}

/// Response of `POST /experiments`. Only the identifier is relied upon.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CreatedExperiment {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Body of the start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    pub runs: u32,
    pub output_format: OutputFormat,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            runs: 1,
            output_format: OutputFormat::Json,
        }
    }
}

/// Acknowledgement returned when a start request is accepted.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct StartAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub experiment_id: Option<String>,
}

/// Format of the raw run data served by `GET /experiments/{id}/data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFormat {
    #[default]
    Hdf,
    Json,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Hdf => "hdf",
            DataFormat::Json => "json",
        }
    }
}

/// Filter for `GET /experiments`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentFilter {
    pub status: Option<String>,
    /// The backend accepts 1..=100.
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Health {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrips_known_and_unknown() {
        let s: Status = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(s, Status::Running);
        let s: Status = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(s, Status::Other("CANCELLED".into()));
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"CANCELLED\"");
    }

    #[test]
    fn test_experiment_status_nulls() {
        let raw = r#"{
            "id": "1733873826",
            "name": "baseline",
            "status": "PENDING",
            "started_at": null,
            "completed_at": null,
            "error_message": null
        }"#;
        let exp: ExperimentStatus = serde_json::from_str(raw).unwrap();
        assert_eq!(exp.status, Status::Pending);
        assert!(exp.started_at.is_none());
        assert!(exp.created_at.is_none());
    }

    #[test]
    fn test_run_without_interactions_field() {
        let raw = r#"{
            "id": "2",
            "date": "2024-01-20T16:02:11.000Z",
            "loadgen": {
                "loadgen_start_time": "a",
                "loadgen_end_time": "b",
                "loadgen_total_requests": 0,
                "loadgen_total_failures": 0
            }
        }"#;
        let run: Run = serde_json::from_str(raw).unwrap();
        assert!(run.interactions.is_empty());
    }

    #[test]
    fn test_loadgen_consistency() {
        let mut lg = Loadgen {
            loadgen_start_time: String::new(),
            loadgen_end_time: String::new(),
            loadgen_total_requests: 10,
            loadgen_total_failures: 10,
        };
        assert!(lg.is_consistent());
        lg.loadgen_total_failures = 11;
        assert!(!lg.is_consistent());
    }

    #[test]
    fn test_run_options_body() {
        let body = serde_json::to_value(RunOptions::default()).unwrap();
        assert_eq!(body, serde_json::json!({"runs": 1, "output_format": "json"}));
    }
}
