//! HTTP collaborators: image upload and the analysis-history browser.
//!
//! These endpoints are invoked independently of the connection manager and
//! have no bearing on its state machine. The backend owns all persistence;
//! this client only uploads and reads.

use agrolink_core::ClientError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Response to an image upload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Identifier of the analysis created for the image.
    pub analysis_id: i64,
    /// Stored filename, when the backend reports it.
    #[serde(default)]
    pub filename: Option<String>,
}

/// One row of the analysis history listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Analysis identifier.
    pub id: i64,
    /// Uploaded image filename.
    #[serde(default)]
    pub filename: Option<String>,
    /// Lifecycle status: `pending`, `processing`, `completed`, `failed`.
    pub status: String,
    /// When the analysis was created (backend local format).
    #[serde(default)]
    pub analysis_date: Option<String>,
}

/// A full historical analysis, including per-agent results.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisDetail {
    /// Analysis identifier.
    pub id: i64,
    /// Lifecycle status.
    pub status: String,
    /// Per-agent results, in the backend's own shape.
    #[serde(default)]
    pub results: Vec<AgentResultRecord>,
}

/// One agent's stored result within a historical analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentResultRecord {
    /// Agent name.
    pub agent: String,
    /// Opaque result payload.
    pub data: Value,
}

/// Backend health report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `error`.
    pub status: String,
    /// Status of the model runtime behind the agents.
    #[serde(default)]
    pub ollama: Option<String>,
}

/// Client for the AgroTech HTTP endpoints.
#[derive(Clone, Debug)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a client for the given base URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            base,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    /// Upload an image and receive the identifier of its new analysis.
    pub async fn upload_image(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, ClientError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_owned());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("user_id", "1");

        let url = self.endpoint("/api/upload-image")?;
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Self::decode_json(response).await
    }

    /// Kick off processing of an uploaded analysis.
    pub async fn start_analysis(&self, id: i64) -> Result<AnalysisDetail, ClientError> {
        let url = self.endpoint(&format!("/api/analyses/{id}/analyze"))?;
        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Self::decode_json(response).await
    }

    /// List the most recent analyses, newest first.
    pub async fn list_analyses(&self, limit: usize) -> Result<Vec<AnalysisSummary>, ClientError> {
        let mut url = self.endpoint("/api/analyses")?;
        let _ = url
            .query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Self::decode_json(response).await
    }

    /// Fetch one historical analysis with its per-agent results.
    pub async fn get_analysis(&self, id: i64) -> Result<AnalysisDetail, ClientError> {
        let url = self.endpoint(&format!("/api/analyses/{id}"))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Self::decode_json(response).await
    }

    /// Check backend health.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = self.endpoint("/health")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Self::decode_json(response).await
    }

    async fn decode_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http(format!("{status}: {body}")));
        }
        response
            .json()
            .await
            .map_err(|e| ClientError::Http(format!("invalid response body: {e}")))
    }
}
