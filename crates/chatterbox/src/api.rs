//! REST client for the Chatterbox TTS HTTP surface.
//!
//! The speech backend exposes:
//!   POST /generate        - queue a synthesis job, returns `{job_id}`
//!   GET  /jobs/{id}       - job status (`queued|running|done|error`)
//!   GET  /audio/{file}    - download the produced WAV
//!   GET  /health          - readiness probe (model loaded)
//!   GET  /languages       - supported language codes
//!
//! Same discipline as the image client: short per-call timeout, no
//! internal retries, unavailability surfaced to the poll loop.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mediagen_core::error::CoreError;
use mediagen_core::job::{GenerationBackend, JobHandle, JobProbe, JobStatus};
use serde::Deserialize;

use crate::spec::SpeechJobSpec;

/// Timeout for the availability probe.
const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for a single Chatterbox TTS instance.
pub struct ChatterboxClient {
    client: reqwest::Client,
    api_url: String,
}

/// Response returned by `POST /generate` after queuing a job.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
}

/// Response returned by `GET /jobs/{id}`.
#[derive(Debug, Deserialize)]
pub struct JobStatusResponse {
    pub status: String,
    /// Output WAV filename; present once `status == "done"`.
    #[serde(default)]
    pub filename: Option<String>,
    /// Sample rate of the produced audio.
    #[serde(default)]
    pub sample_rate: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response returned by `GET /languages`.
#[derive(Debug, Deserialize)]
pub struct LanguagesResponse {
    /// Language code to display name. BTreeMap keeps the listing
    /// stable for callers.
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
}

/// Errors from the Chatterbox REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ChatterboxApiError {
    /// The HTTP request itself failed or the response body could not
    /// be decoded.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Chatterbox API error ({status}): {body}")]
    Api { status: u16, body: String },
}

impl From<ChatterboxApiError> for CoreError {
    fn from(err: ChatterboxApiError) -> Self {
        match err {
            ChatterboxApiError::Request(e) => CoreError::BackendUnavailable(e.to_string()),
            ChatterboxApiError::Api { status, body } => {
                CoreError::BackendError(format!("HTTP {status}: {body}"))
            }
        }
    }
}

impl ChatterboxClient {
    /// Create a client for a Chatterbox instance.
    pub fn new(api_url: impl Into<String>, call_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .expect("Chatterbox HTTP client construction");
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- health ----

    /// Whether the TTS process answers its health endpoint with the
    /// model loaded.
    pub async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/health", self.api_url))
            .timeout(AVAILABILITY_TIMEOUT)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Supported languages, code to display name.
    ///
    /// Falls back to English-only when the backend cannot be reached —
    /// the language list is advisory, not load-bearing.
    pub async fn supported_languages(&self) -> BTreeMap<String, String> {
        let fallback = || BTreeMap::from([("en".to_string(), "English".to_string())]);

        let response = self
            .client
            .get(format!("{}/languages", self.api_url))
            .send()
            .await;

        match response {
            Ok(r) => match r.json::<LanguagesResponse>().await {
                Ok(parsed) if !parsed.languages.is_empty() => parsed.languages,
                Ok(_) => fallback(),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to decode language list");
                    fallback()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch language list");
                fallback()
            }
        }
    }

    // ---- generation ----

    /// Queue a synthesis job via `POST /generate`.
    pub async fn submit_job(
        &self,
        spec: &SpeechJobSpec,
    ) -> Result<SubmitResponse, ChatterboxApiError> {
        let response = self
            .client
            .post(format!("{}/generate", self.api_url))
            .json(spec)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Query a job's status via `GET /jobs/{id}`.
    pub async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ChatterboxApiError> {
        let response = self
            .client
            .get(format!("{}/jobs/{}", self.api_url, job_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download a produced WAV into `dest_dir` via `GET /audio/{file}`.
    pub async fn download_audio(
        &self,
        filename: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, CoreError> {
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| CoreError::Internal(format!("cannot create output dir: {e}")))?;

        let response = self
            .client
            .get(format!("{}/audio/{}", self.api_url, filename))
            .send()
            .await
            .map_err(|e| CoreError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::BackendError(format!(
                "could not download audio '{filename}': HTTP {}",
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

        tracing::info!(filename, bytes = bytes.len(), "Downloaded generated audio");
        Ok(dest_path)
    }

    // ---- private helpers ----

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ChatterboxApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ChatterboxApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

/// Map a backend status string onto the job status machine.
///
/// Unknown strings are treated as still running rather than failing
/// the job — a newer backend may add intermediate states.
pub fn map_status(response: &JobStatusResponse) -> JobProbe {
    match response.status.as_str() {
        "queued" => JobProbe::queued(),
        "done" => JobProbe {
            status: JobStatus::Succeeded,
            outputs: response.filename.iter().cloned().collect(),
            error: None,
        },
        "error" => JobProbe::failed(
            response
                .error
                .clone()
                .unwrap_or_else(|| "unspecified synthesis failure".to_string()),
        ),
        "running" => JobProbe::running(),
        other => {
            tracing::debug!(status = other, "Unknown job status, treating as running");
            JobProbe::running()
        }
    }
}

#[async_trait::async_trait]
impl GenerationBackend for ChatterboxClient {
    type Spec = SpeechJobSpec;

    fn name(&self) -> &'static str {
        "chatterbox"
    }

    async fn submit(&self, spec: &SpeechJobSpec) -> Result<JobHandle, CoreError> {
        let submitted = self.submit_job(spec).await?;
        tracing::info!(
            job_id = %submitted.job_id,
            language = %spec.language_id,
            text_chars = spec.text.chars().count(),
            voice_cloning = spec.audio_prompt_path.is_some(),
            "Synthesis job queued on Chatterbox"
        );
        Ok(JobHandle::new(submitted.job_id))
    }

    async fn query_status(&self, handle: &JobHandle) -> Result<JobProbe, CoreError> {
        let status = self.job_status(&handle.id).await?;
        Ok(map_status(&status))
    }
}
