use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::error::ApiError;
use crate::api::transport::{ApiRequest, HttpTransport, Method, RequestOptions, Transport};
use crate::config::{DashboardConfig, DEFAULT_START_PATH};
use crate::models::{
    CreateExperiment, CreatedExperiment, DataFormat, ExperimentFilter, ExperimentStatus, Health,
    RunOptions, StartAck,
};

/// Bookkeeping of the most recent call made through one [`ApiClient`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallState {
    pub loading: bool,
    /// Last error message; cleared when the next call starts.
    pub error: Option<String>,
}

/// Backend client with its own loading/error state.
///
/// Views that need independent state call [`ApiClient::handle`] to get a second
/// client over the same transport.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    start_path: String,
    state: Mutex<CallState>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            start_path: DEFAULT_START_PATH.to_string(),
            state: Mutex::new(CallState::default()),
        }
    }

    /// HTTP client for the configured backend.
    pub fn from_config(config: &DashboardConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(Arc::new(transport)).with_start_path(config.start_path.clone()))
    }

    /// Template for the start endpoint; `{id}` is replaced by the experiment id.
    pub fn with_start_path(mut self, path: impl Into<String>) -> Self {
        self.start_path = path.into();
        self
    }

    /// A new client sharing the transport, with fresh call state.
    pub fn handle(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            start_path: self.start_path.clone(),
            state: Mutex::new(CallState::default()),
        }
    }

    pub fn call_state(&self) -> CallState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_loading(&self) -> bool {
        self.call_state().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.call_state().error
    }

    fn begin(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.loading = true;
        state.error = None;
    }

    fn finish(&self, error: Option<&ApiError>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.loading = false;
        if let Some(e) = error {
            state.error = Some(e.to_string());
        }
    }

    /// Records errors raised while building a request, before anything is sent.
    fn prepare<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(e) = &result {
            self.begin();
            self.finish(Some(e));
        }
        result
    }

    async fn send(&self, request: ApiRequest) -> Result<String, ApiError> {
        self.begin();
        let method = request.method.as_str();
        let result = match self.transport.execute(&request).await {
            Ok(response) if response.is_success() => Ok(response.body),
            Ok(response) => Err(ApiError::Status {
                method,
                path: request.path.clone(),
                status: response.status,
                body: response.body,
            }),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            warn!(method, path = %request.path, error = %e, "Request failed");
        }
        self.finish(result.as_ref().err());
        result
    }

    /// `GET path`, returning the raw response body.
    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<String, ApiError> {
        self.send(ApiRequest {
            method: Method::Get,
            path: path.to_string(),
            body: None,
            options,
        })
        .await
    }

    /// `POST path` with a JSON body, returning the raw response body.
    pub async fn post(
        &self,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<String, ApiError> {
        self.send(ApiRequest {
            method: Method::Post,
            path: path.to_string(),
            body,
            options,
        })
        .await
    }

    fn decode<T: DeserializeOwned>(&self, path: &str, body: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|e| {
            let error = ApiError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            };
            self.finish(Some(&error));
            error
        })
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let body = self.get(path, options).await?;
        self.decode(path, &body)
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let body = self.post(path, body, options).await?;
        self.decode(path, &body)
    }

    // ─── Endpoints ──────────────────────────────────────────────────────────

    pub async fn list_experiments(
        &self,
        filter: &ExperimentFilter,
    ) -> Result<Vec<ExperimentStatus>, ApiError> {
        let mut options = RequestOptions::new();
        if let Some(status) = &filter.status {
            options = options.query("status", status);
        }
        if let Some(limit) = filter.limit {
            options = options.query("limit", limit);
        }
        self.get_json("/experiments", options).await
    }

    pub async fn experiment_status(&self, id: &str) -> Result<ExperimentStatus, ApiError> {
        let path = format!("/experiments/{}/status", self.prepare(segment(id))?);
        self.get_json(&path, RequestOptions::new()).await
    }

    /// Raw benchmark payload of a finished experiment.
    pub async fn benchmark(&self, id: &str) -> Result<String, ApiError> {
        let path = format!("/experiments/{}/benchmark", self.prepare(segment(id))?);
        self.get(&path, RequestOptions::new()).await
    }

    /// Raw run data of a finished experiment.
    pub async fn experiment_data(&self, id: &str, format: DataFormat) -> Result<String, ApiError> {
        let path = format!("/experiments/{}/data", self.prepare(segment(id))?);
        self.get(&path, RequestOptions::new().query("format", format.as_str()))
            .await
    }

    pub async fn create_experiment(
        &self,
        name: &str,
        config: &Value,
    ) -> Result<CreatedExperiment, ApiError> {
        let body = self.prepare(
            serde_json::to_value(CreateExperiment { name, config })
                .map_err(|e| ApiError::InvalidRequest(e.to_string())),
        )?;
        let created: CreatedExperiment = self
            .post_json("/experiments", Some(body), RequestOptions::new())
            .await?;
        info!(id = %created.id, name, "Experiment created");
        Ok(created)
    }

    pub async fn start_experiment(
        &self,
        id: &str,
        options: RunOptions,
    ) -> Result<StartAck, ApiError> {
        let path = self.start_path.replace("{id}", self.prepare(segment(id))?);
        let body = self.prepare(
            serde_json::to_value(options).map_err(|e| ApiError::InvalidRequest(e.to_string())),
        )?;
        let ack: StartAck = self.post_json(&path, Some(body), RequestOptions::new()).await?;
        info!(id, runs = options.runs, "Experiment start accepted");
        Ok(ack)
    }

    pub async fn health(&self) -> Result<Health, ApiError> {
        self.get_json("/health", RequestOptions::new()).await
    }
}

/// Experiment ids are opaque but must stay a single path segment with no
/// query, fragment or escape characters.
fn segment(id: &str) -> Result<&str, ApiError> {
    let reserved =
        |c: char| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control();
    if id.is_empty() || id.contains(reserved) {
        return Err(ApiError::InvalidRequest(format!(
            "'{}' is not a valid experiment id",
            id
        )));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::models::{OutputFormat, Status};
    use serde_json::json;

    fn client(transport: MockTransport) -> (ApiClient, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        (ApiClient::new(transport.clone()), transport)
    }

    #[tokio::test]
    async fn test_list_experiments_with_filter() {
        let (api, transport) = client(MockTransport::new().reply(
            200,
            r#"[{"id":"1","name":"a","status":"RUNNING","started_at":"2024-12-10T13:21:02Z","completed_at":null,"error_message":null}]"#,
        ));
        let filter = ExperimentFilter {
            status: Some("RUNNING".into()),
            limit: Some(5),
        };
        let list = api.list_experiments(&filter).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].status, Status::Running);

        let req = &transport.requests()[0];
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.path, "/experiments");
        assert_eq!(
            req.options.query,
            [
                ("status".to_string(), "RUNNING".to_string()),
                ("limit".to_string(), "5".to_string())
            ]
        );
        assert_eq!(api.call_state(), CallState::default());
    }

    #[tokio::test]
    async fn test_status_error_is_recorded() {
        let (api, _) = client(MockTransport::new().reply(404, r#"{"detail":"Experiment not found"}"#));
        let err = api.experiment_status("missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!api.is_loading());
        assert!(api.last_error().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_next_call_clears_error() {
        let (api, _) = client(
            MockTransport::new()
                .fail(ApiError::Network("connection refused".into()))
                .reply(200, r#"{"status":"healthy"}"#),
        );
        assert!(api.health().await.is_err());
        assert_eq!(api.last_error().as_deref(), Some("network error: connection refused"));
        assert_eq!(api.health().await.unwrap().status, "healthy");
        assert!(api.last_error().is_none());
    }

    #[tokio::test]
    async fn test_decode_failure_is_tagged() {
        let (api, _) = client(MockTransport::new().reply(200, r#"{"unexpected": true}"#));
        let err = api.list_experiments(&ExperimentFilter::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { ref path, .. } if path == "/experiments"));
        assert!(api.last_error().is_some());
    }

    #[tokio::test]
    async fn test_handles_have_independent_state() {
        let (api, _) = client(MockTransport::new().reply(500, "boom"));
        let other = api.handle();
        assert!(api.health().await.is_err());
        assert!(api.last_error().is_some());
        assert!(other.last_error().is_none());
    }

    #[tokio::test]
    async fn test_create_and_start() {
        let (api, transport) = client(
            MockTransport::new()
                .reply(200, r#"{"id":"1733873826","name":"baseline","status":"PENDING"}"#)
                .reply(200, r#"{"status":"accepted","message":"Experiment started successfully","experiment_id":"1733873826"}"#),
        );
        let api = api.with_start_path("/experiments/{id}/runsync");

        let config = json!({"experiment": {"name": "baseline"}});
        let created = api.create_experiment("baseline", &config).await.unwrap();
        assert_eq!(created.id, "1733873826");

        let ack = api
            .start_experiment(
                &created.id,
                RunOptions {
                    runs: 3,
                    output_format: OutputFormat::Csv,
                },
            )
            .await
            .unwrap();
        assert_eq!(ack.status.as_deref(), Some("accepted"));

        let requests = transport.requests();
        assert_eq!(requests[0].path, "/experiments");
        assert_eq!(
            requests[0].body,
            Some(json!({"name": "baseline", "config": config}))
        );
        assert_eq!(requests[1].method, Method::Post);
        assert_eq!(requests[1].path, "/experiments/1733873826/runsync");
        assert_eq!(requests[1].body, Some(json!({"runs": 3, "output_format": "csv"})));
    }

    #[tokio::test]
    async fn test_raw_endpoints() {
        let (api, transport) = client(
            MockTransport::new()
                .reply(200, "detector,time\nalerts,12.5\n")
                .reply(200, "null"),
        );
        let csv = api.benchmark("42").await.unwrap();
        assert!(csv.starts_with("detector,time"));
        api.experiment_data("42", DataFormat::Json).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].path, "/experiments/42/benchmark");
        assert_eq!(requests[1].path, "/experiments/42/data");
        assert_eq!(requests[1].options.query, [("format".to_string(), "json".to_string())]);
    }

    #[tokio::test]
    async fn test_rejects_bad_ids_without_request() {
        let (api, transport) = client(MockTransport::new());
        assert!(matches!(
            api.experiment_status("a/b").await,
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(api.benchmark("").await.is_err());
        for id in ["a?b", "a#b", "a%2Fb", "a b"] {
            assert!(matches!(
                api.experiment_data(id, DataFormat::Json).await,
                Err(ApiError::InvalidRequest(_))
            ));
        }
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_id_replaces_previous_error() {
        let (api, _) = client(MockTransport::new().reply(500, "boom"));
        assert!(api.health().await.is_err());
        assert!(api.last_error().unwrap().contains("status 500"));

        let err = api.experiment_status("a/b").await.unwrap_err();
        assert_eq!(api.last_error(), Some(err.to_string()));
        assert!(!api.is_loading());

        let err = api
            .start_experiment(
                "a?b",
                RunOptions {
                    runs: 1,
                    output_format: OutputFormat::Json,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(api.last_error(), Some(err.to_string()));
    }
}
