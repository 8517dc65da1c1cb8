use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{ProviderResult, ResearchError};

pub const DEFAULT_BASE_URL: &str = "https://api.apify.com";

const PROVIDER: &str = "Apify";

/// Identifiers returned when a scraping run is submitted
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobHandle {
    #[serde(rename = "id")]
    pub run_id: String,

    #[serde(rename = "defaultDatasetId")]
    pub dataset_id: String,
}

/// Lifecycle state reported by the run-status endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
    TimingOut,
    TimedOut,
    Aborting,
    Aborted,
    Other(String),
}

impl RunStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "READY" => RunStatus::Ready,
            "RUNNING" => RunStatus::Running,
            "SUCCEEDED" => RunStatus::Succeeded,
            "FAILED" => RunStatus::Failed,
            "TIMING-OUT" => RunStatus::TimingOut,
            "TIMED-OUT" => RunStatus::TimedOut,
            "ABORTING" => RunStatus::Aborting,
            "ABORTED" => RunStatus::Aborted,
            _ => RunStatus::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Ready => "READY",
            RunStatus::Running => "RUNNING",
            RunStatus::Succeeded => "SUCCEEDED",
            RunStatus::Failed => "FAILED",
            RunStatus::TimingOut => "TIMING-OUT",
            RunStatus::TimedOut => "TIMED-OUT",
            RunStatus::Aborting => "ABORTING",
            RunStatus::Aborted => "ABORTED",
            RunStatus::Other(raw) => raw,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RunStatus::Failed | RunStatus::Aborted | RunStatus::TimedOut)
    }
}

/// Snapshot of a run as returned by the status endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub run_id: String,
    pub status: RunStatus,
    pub dataset_id: Option<String>,
}

/// Actor-run API used by every scraping provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActorApi: Send + Sync {
    /// Submit a run of `actor_id` with the given input
    async fn start_run(&self, actor_id: &str, token: &str, input: &Value) -> ProviderResult<JobHandle>;

    /// Fetch the current state of a run
    async fn run_status(&self, run_id: &str, token: &str) -> ProviderResult<RunInfo>;

    /// Fetch every item of a finished run's dataset
    async fn dataset_items(&self, dataset_id: &str, token: &str) -> ProviderResult<Vec<Value>>;
}

/// Path-style actor ids (`user/actor`) must be sent as `user~actor`
pub fn actor_path_id(actor_id: &str) -> String {
    actor_id.trim().replace('/', "~")
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct RunData {
    id: String,
    status: String,
    #[serde(rename = "defaultDatasetId")]
    default_dataset_id: Option<String>,
}

/// HTTP client for the Apify v2 API
pub struct ApifyClient {
    client: Client,
    base_url: String,
}

impl ApifyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, token: &str) -> ProviderResult<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ResearchError::network(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResearchError::ProviderRequest {
                provider: PROVIDER.to_string(),
                status: Some(status.as_u16()),
                message: body,
            });
        }

        response.json::<T>().await.map_err(|e| ResearchError::ProviderRequest {
            provider: PROVIDER.to_string(),
            status: Some(status.as_u16()),
            message: format!("unexpected response body: {}", e),
        })
    }
}

#[async_trait]
impl ActorApi for ApifyClient {
    async fn start_run(&self, actor_id: &str, token: &str, input: &Value) -> ProviderResult<JobHandle> {
        let url = format!(
            "{}/v2/acts/{}/runs",
            self.base_url,
            urlencoding::encode(&actor_path_id(actor_id))
        );
        tracing::debug!("Submitting run for actor {}: {}", actor_id, input);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(input)
            .send()
            .await
            .map_err(|e| ResearchError::network(PROVIDER, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Run submission for {} rejected: HTTP {} {}", actor_id, status, body);
            return Err(ResearchError::ProviderRequest {
                provider: PROVIDER.to_string(),
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let envelope: Envelope<JobHandle> = response.json().await.map_err(|e| ResearchError::ProviderRequest {
            provider: PROVIDER.to_string(),
            status: Some(status.as_u16()),
            message: format!("run submission returned no run identifiers: {}", e),
        })?;

        Ok(envelope.data)
    }

    async fn run_status(&self, run_id: &str, token: &str) -> ProviderResult<RunInfo> {
        let url = format!("{}/v2/actor-runs/{}", self.base_url, urlencoding::encode(run_id));
        let envelope: Envelope<RunData> = self.get_json(&url, token).await?;

        Ok(RunInfo {
            run_id: envelope.data.id,
            status: RunStatus::parse(&envelope.data.status),
            dataset_id: envelope.data.default_dataset_id,
        })
    }

    async fn dataset_items(&self, dataset_id: &str, token: &str) -> ProviderResult<Vec<Value>> {
        let url = format!(
            "{}/v2/datasets/{}/items",
            self.base_url,
            urlencoding::encode(dataset_id)
        );
        self.get_json(&url, token).await
    }
}
