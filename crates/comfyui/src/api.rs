//! REST client for the ComfyUI HTTP surface.
//!
//! Wraps workflow submission, history retrieval, artifact download,
//! and availability probes using [`reqwest`]. Every call carries a
//! short per-call timeout — a backend that does not answer within it
//! is reported as unavailable, and the poll loop owns the retry
//! policy. Nothing here retries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mediagen_core::error::CoreError;
use mediagen_core::job::{GenerationBackend, JobHandle, JobProbe};
use serde::Deserialize;

use crate::history::probe_from_history;
use crate::workflow::ImageJobSpec;

/// Timeout for the availability probe, deliberately shorter than the
/// per-call timeout so health checks stay snappy.
const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for a single ComfyUI instance.
pub struct ComfyUIClient {
    client: reqwest::Client,
    api_url: String,
    /// Unique client ID sent with every submission so ComfyUI can
    /// correlate queue entries back to this process.
    client_id: String,
}

/// Response returned by `POST /prompt` after queuing a workflow.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned identifier for the queued prompt.
    pub prompt_id: String,
    /// Position in the execution queue.
    #[serde(default)]
    pub number: i32,
}

/// Errors from the ComfyUI REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ComfyUIApiError {
    /// The HTTP request itself failed (network, DNS, timeout) or the
    /// response body could not be decoded.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// ComfyUI returned a non-2xx status code.
    #[error("ComfyUI API error ({status}): {body}")]
    Api {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl From<ComfyUIApiError> for CoreError {
    fn from(err: ComfyUIApiError) -> Self {
        match err {
            // No usable answer from the process: transient.
            ComfyUIApiError::Request(e) => CoreError::BackendUnavailable(e.to_string()),
            // The backend answered and rejected the call.
            ComfyUIApiError::Api { status, body } => {
                CoreError::BackendError(format!("HTTP {status}: {body}"))
            }
        }
    }
}

impl ComfyUIClient {
    /// Create a client for a ComfyUI instance.
    ///
    /// * `api_url`      - base HTTP URL, e.g. `http://127.0.0.1:8188`.
    /// * `call_timeout` - per-request timeout, distinct from the
    ///   overall job budget.
    pub fn new(api_url: impl Into<String>, call_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .expect("ComfyUI HTTP client construction");
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            client_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// HTTP API base URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- health ----

    /// Whether the ComfyUI process answers its stats endpoint.
    pub async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/system_stats", self.api_url))
            .timeout(AVAILABILITY_TIMEOUT)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// List checkpoints loadable by `CheckpointLoaderSimple`.
    ///
    /// Returns an empty list when the endpoint cannot be queried —
    /// the health probe reports availability separately.
    pub async fn available_checkpoints(&self) -> Vec<String> {
        let response = self
            .client
            .get(format!(
                "{}/object_info/CheckpointLoaderSimple",
                self.api_url
            ))
            .send()
            .await;

        let json: serde_json::Value = match response {
            Ok(r) => match r.json().await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to decode checkpoint list");
                    return Vec::new();
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch checkpoint list");
                return Vec::new();
            }
        };

        // Nested shape: {CheckpointLoaderSimple: {input: {required: {ckpt_name: [[...names]]}}}}
        json["CheckpointLoaderSimple"]["input"]["required"]["ckpt_name"][0]
            .as_array()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ---- generation ----

    /// Submit a workflow for execution via `POST /prompt`.
    pub async fn submit_workflow(
        &self,
        workflow: &serde_json::Value,
    ) -> Result<SubmitResponse, ComfyUIApiError> {
        let body = serde_json::json!({
            "prompt": workflow,
            "client_id": self.client_id,
        });

        let response = self
            .client
            .post(format!("{}/prompt", self.api_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Retrieve execution history for a prompt via `GET /history/{id}`.
    ///
    /// The returned JSON contains output file paths, node results, and
    /// status data; [`probe_from_history`] interprets it.
    pub async fn get_history(
        &self,
        prompt_id: &str,
    ) -> Result<serde_json::Value, ComfyUIApiError> {
        let response = self
            .client
            .get(format!("{}/history/{}", self.api_url, prompt_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download a generated image into `dest_dir` via `GET /view`.
    ///
    /// Returns the absolute path of the written file.
    pub async fn download_image(
        &self,
        filename: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, CoreError> {
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| CoreError::Internal(format!("cannot create output dir: {e}")))?;

        let response = self
            .client
            .get(format!("{}/view", self.api_url))
            .query(&[("filename", filename), ("subfolder", ""), ("type", "output")])
            .send()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::BackendError(format!(
                "could not download image '{filename}': HTTP {}",
                response.status().as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        let dest_path = dest_dir.join(filename);
        tokio::fs::write(&dest_path, &bytes)
            .await
            .map_err(|e| CoreError::Internal(format!("cannot write {}: {e}", dest_path.display())))?;

        tracing::info!(
            filename,
            bytes = bytes.len(),
            "Downloaded generated image"
        );
        Ok(dest_path)
    }

    // ---- private helpers ----

    /// Parse a successful JSON response body into the expected type,
    /// or surface a non-2xx status with its body text.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ComfyUIApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ComfyUIApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl GenerationBackend for ComfyUIClient {
    type Spec = ImageJobSpec;

    fn name(&self) -> &'static str {
        "comfyui"
    }

    async fn submit(&self, spec: &ImageJobSpec) -> Result<JobHandle, CoreError> {
        let submitted = self.submit_workflow(&spec.workflow_json()).await?;
        tracing::info!(
            prompt_id = %submitted.prompt_id,
            queue_position = submitted.number,
            seed = spec.seed,
            "Workflow queued on ComfyUI"
        );
        Ok(JobHandle::new(submitted.prompt_id))
    }

    async fn query_status(&self, handle: &JobHandle) -> Result<JobProbe, CoreError> {
        let history = self.get_history(&handle.id).await?;
        Ok(probe_from_history(&history, &handle.id))
    }
}
