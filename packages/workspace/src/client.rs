//! Remote implementations of the editor's collaborator traits.
//!
//! All three talk to the same API root (e.g. `http://localhost:3003/api`)
//! and read failures from an `{error}` body when the server sends one.

use async_trait::async_trait;
use folio_editor::{
    ChartError, ChartImage, ChartRenderer, ChartRequest, GenerationError, GenerationRequest, NewVersion,
    ReportGenerator, StoreError, Version, VersionStore,
};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "http://localhost:3003/api";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedReport {
    #[serde(default)]
    content: Option<String>,
}

/// Status and message of a non-success response
async fn rejection(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    (status, message)
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Version history kept by a remote server
#[derive(Debug, Clone)]
pub struct HttpVersionStore {
    client: Client,
    base_url: String,
}

impl HttpVersionStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let (status, message) = rejection(response).await;
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl VersionStore for HttpVersionStore {
    async fn list(&self) -> Result<Vec<Version>, StoreError> {
        let response = self
            .client
            .get(endpoint(&self.base_url, "versions"))
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| StoreError::InvalidResponse(err.to_string()))
    }

    async fn create(&self, version: NewVersion) -> Result<Version, StoreError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, "versions"))
            .json(&version)
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        let version: Version = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|err| StoreError::InvalidResponse(err.to_string()))?;
        debug!(id = %version.id, "remote version created");
        Ok(version)
    }
}

/// Report generation backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpReportGenerator {
    client: Client,
    base_url: String,
}

impl HttpReportGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ReportGenerator for HttpReportGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, "generate"))
            .json(request)
            .send()
            .await
            .map_err(|err| GenerationError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            let (status, message) = rejection(response).await;
            warn!(status = status.as_u16(), %message, "report generation rejected");
            return Err(GenerationError::Failed(message));
        }

        let report: GeneratedReport = response
            .json()
            .await
            .map_err(|err| GenerationError::Failed(format!("unreadable response: {}", err)))?;
        report
            .content
            .ok_or_else(|| GenerationError::Failed("response carried no content".to_string()))
    }
}

/// Chart rendering through a remote `/charts` endpoint
#[derive(Debug, Clone)]
pub struct HttpChartRenderer {
    client: Client,
    base_url: String,
}

impl HttpChartRenderer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ChartRenderer for HttpChartRenderer {
    async fn render(&self, request: &ChartRequest) -> Result<ChartImage, ChartError> {
        request.validate()?;
        let response = self
            .client
            .post(endpoint(&self.base_url, "charts"))
            .json(request)
            .send()
            .await
            .map_err(|err| ChartError::Spawn(err.to_string()))?;

        if !response.status().is_success() {
            let (status, message) = rejection(response).await;
            return Err(if status == StatusCode::BAD_REQUEST {
                ChartError::InvalidRequest(message)
            } else {
                ChartError::Renderer(message)
            });
        }

        response
            .json()
            .await
            .map_err(|err| ChartError::InvalidOutput(err.to_string()))
    }
}
