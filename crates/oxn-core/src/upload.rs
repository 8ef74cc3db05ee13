//! Upload workflow for experiment configurations.
//!
//! ```text
//! Empty --select_file--> Selected --parse--> Parsed --save--> Saved --start--> Started
//!   ^                        |                  |               |
//!   +--------------------- remove (from any state) -------------+
//! ```
//!
//! A failed step leaves the state where it was and records a [`Notice`]. Only
//! one file is in flight at a time; the pipeline owns all of its fields.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{RunOptions, StartAck};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Empty,
    Selected,
    Parsed,
    Saved,
    Started,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadState::Empty => "empty",
            UploadState::Selected => "selected",
            UploadState::Parsed => "parsed",
            UploadState::Saved => "saved",
            UploadState::Started => "started",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The file was refused before reading it (blocking alert).
    Rejection,
    /// The file could not be read or decoded (blocking alert).
    ParseError,
    /// A backend call failed (non-blocking toast).
    Network,
}

/// User-facing message describing the last failed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn is_blocking(&self) -> bool {
        !matches!(self.kind, NoticeKind::Network)
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Only files of type: {allowed} are allowed")]
    Rejected { file: String, allowed: String },
    #[error("Error parsing YAML file {file}: {message}")]
    Parse { file: String, message: String },
    #[error("cannot {action} while the upload is {state}")]
    NotReady {
        action: &'static str,
        state: UploadState,
    },
    #[error("an experiment name is required")]
    MissingName,
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Text(String),
}

/// A file picked by the user, not yet read.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    name: String,
    source: FileSource,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        Self {
            name,
            source: FileSource::Path(path),
        }
    }

    /// A file whose content is already in memory.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Text(text.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn read_text(&self) -> std::io::Result<String> {
        match &self.source {
            FileSource::Path(path) => fs::read_to_string(path),
            FileSource::Text(text) => Ok(text.clone()),
        }
    }
}

enum Stage {
    Empty,
    Selected {
        file: SelectedFile,
    },
    Parsed {
        file: SelectedFile,
        content: Value,
    },
    Saved {
        file: SelectedFile,
        content: Value,
        experiment_id: String,
    },
    Started {
        file: SelectedFile,
        experiment_id: String,
        ack: StartAck,
    },
}

pub struct UploadPipeline {
    accepted: Vec<String>,
    stage: Stage,
    notice: Option<Notice>,
}

impl Default for UploadPipeline {
    fn default() -> Self {
        Self::new(vec![".yaml".to_string()])
    }
}

impl UploadPipeline {
    /// `accepted` is the extension allow-list, e.g. `[".yaml"]`.
    pub fn new(accepted: Vec<String>) -> Self {
        Self {
            accepted: accepted
                .into_iter()
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            stage: Stage::Empty,
            notice: None,
        }
    }

    pub fn accepted_extensions(&self) -> &[String] {
        &self.accepted
    }

    pub fn state(&self) -> UploadState {
        match self.stage {
            Stage::Empty => UploadState::Empty,
            Stage::Selected { .. } => UploadState::Selected,
            Stage::Parsed { .. } => UploadState::Parsed,
            Stage::Saved { .. } => UploadState::Saved,
            Stage::Started { .. } => UploadState::Started,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn file_name(&self) -> Option<&str> {
        match &self.stage {
            Stage::Empty => None,
            Stage::Selected { file }
            | Stage::Parsed { file, .. }
            | Stage::Saved { file, .. }
            | Stage::Started { file, .. } => Some(file.name()),
        }
    }

    pub fn parsed(&self) -> Option<&Value> {
        match &self.stage {
            Stage::Parsed { content, .. } | Stage::Saved { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Pretty-printed parsed content, as shown in the file preview.
    pub fn preview(&self) -> Option<String> {
        self.parsed()
            .and_then(|content| serde_json::to_string_pretty(content).ok())
    }

    pub fn experiment_id(&self) -> Option<&str> {
        match &self.stage {
            Stage::Saved { experiment_id, .. } | Stage::Started { experiment_id, .. } => {
                Some(experiment_id)
            }
            _ => None,
        }
    }

    pub fn start_ack(&self) -> Option<&StartAck> {
        match &self.stage {
            Stage::Started { ack, .. } => Some(ack),
            _ => None,
        }
    }

    pub fn can_select(&self) -> bool {
        self.state() == UploadState::Empty
    }

    pub fn can_parse(&self) -> bool {
        self.state() == UploadState::Selected
    }

    pub fn can_save(&self) -> bool {
        self.state() == UploadState::Parsed
    }

    pub fn can_start(&self) -> bool {
        self.state() == UploadState::Saved
    }

    /// The workflow is over once the experiment has been started.
    pub fn is_closed(&self) -> bool {
        self.state() == UploadState::Started
    }

    pub fn is_accepted(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        self.accepted.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    fn not_ready(&self, action: &'static str) -> UploadError {
        UploadError::NotReady {
            action,
            state: self.state(),
        }
    }

    fn raise(&mut self, kind: NoticeKind, error: UploadError) -> UploadError {
        warn!(state = %self.state(), error = %error, "Upload step failed");
        self.notice = Some(Notice {
            kind,
            message: error.to_string(),
        });
        error
    }

    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), UploadError> {
        if !self.can_select() {
            return Err(self.not_ready("select a file"));
        }
        if !self.is_accepted(file.name()) {
            let error = UploadError::Rejected {
                file: file.name().to_string(),
                allowed: self.accepted.join(", "),
            };
            return Err(self.raise(NoticeKind::Rejection, error));
        }
        info!(file = %file.name(), "File selected");
        self.notice = None;
        self.stage = Stage::Selected { file };
        Ok(())
    }

    /// Read the selected file and decode it as YAML.
    pub fn parse(&mut self) -> Result<&Value, UploadError> {
        let Stage::Selected { file } = &self.stage else {
            return Err(self.not_ready("parse"));
        };

        let parse_error = |message: String| UploadError::Parse {
            file: file.name().to_string(),
            message,
        };
        let decoded = file
            .read_text()
            .map_err(|e| parse_error(e.to_string()))
            .and_then(|text| decode_yaml(&text).map_err(parse_error));

        let content = match decoded {
            Ok(content) => content,
            Err(error) => return Err(self.raise(NoticeKind::ParseError, error)),
        };

        let Stage::Selected { file } = std::mem::replace(&mut self.stage, Stage::Empty) else {
            unreachable!("stage checked above");
        };
        info!(file = %file.name(), "Configuration parsed");
        self.notice = None;
        self.stage = Stage::Parsed { file, content };
        match &self.stage {
            Stage::Parsed { content, .. } => Ok(content),
            _ => unreachable!("stage set above"),
        }
    }

    /// Discard the selection and everything derived from it.
    pub fn remove(&mut self) {
        if let Some(name) = self.file_name() {
            info!(file = %name, "Upload discarded");
        }
        self.stage = Stage::Empty;
        self.notice = None;
    }

    /// Submit the parsed configuration under `name` and keep the returned id.
    pub async fn save(&mut self, api: &ApiClient, name: &str) -> Result<&str, UploadError> {
        let Stage::Parsed { content, .. } = &self.stage else {
            return Err(self.not_ready("save"));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(self.raise(NoticeKind::Rejection, UploadError::MissingName));
        }

        let created = match api.create_experiment(name, content).await {
            Ok(created) => created,
            Err(e) => return Err(self.raise(NoticeKind::Network, e.into())),
        };

        let Stage::Parsed { file, content } = std::mem::replace(&mut self.stage, Stage::Empty)
        else {
            unreachable!("stage checked above");
        };
        self.notice = None;
        self.stage = Stage::Saved {
            file,
            content,
            experiment_id: created.id,
        };
        Ok(self.experiment_id().unwrap_or_default())
    }

    /// Start the saved experiment. Refused without a request unless saved.
    pub async fn start(
        &mut self,
        api: &ApiClient,
        options: RunOptions,
    ) -> Result<&StartAck, UploadError> {
        let Stage::Saved { experiment_id, .. } = &self.stage else {
            return Err(self.not_ready("start"));
        };

        let ack = match api.start_experiment(experiment_id, options).await {
            Ok(ack) => ack,
            Err(e) => return Err(self.raise(NoticeKind::Network, e.into())),
        };

        let Stage::Saved {
            file, experiment_id, ..
        } = std::mem::replace(&mut self.stage, Stage::Empty)
        else {
            unreachable!("stage checked above");
        };
        info!(id = %experiment_id, "Upload workflow closed");
        self.notice = None;
        self.stage = Stage::Started {
            file,
            experiment_id,
            ack,
        };
        match &self.stage {
            Stage::Started { ack, .. } => Ok(ack),
            _ => unreachable!("stage set above"),
        }
    }
}

/// Decode YAML text into a JSON value suitable for submission.
fn decode_yaml(text: &str) -> Result<Value, String> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    if yaml.is_null() {
        return Err("file is empty".to_string());
    }
    serde_json::to_value(&yaml).map_err(|e| e.to_string())
}
