//! Health endpoint aggregating both generation backends.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// At most this many checkpoint names are echoed in the health body.
const CHECKPOINT_SAMPLE_LIMIT: usize = 5;

#[derive(Serialize)]
struct HealthResponse {
    /// `ok` when both backends answer, `degraded` when one does,
    /// `unavailable` when neither does.
    status: &'static str,
    version: &'static str,
    /// Whether a generation request would be admitted right now
    /// without queueing.
    generation_slot_free: bool,
    image_backend: BackendHealth,
    speech_backend: BackendHealth,
}

#[derive(Serialize)]
struct BackendHealth {
    available: bool,
    url: String,
    /// First few loadable checkpoints; image backend only, and only
    /// when it is reachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    checkpoints_sample: Option<Vec<String>>,
}

/// `GET /health`
///
/// Answers 200 while at least one backend is reachable, 503 when both
/// are down. The service itself stays up either way — a request for
/// the surviving modality still works.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let orchestrator = &state.orchestrator;
    let (image_up, speech_up) = tokio::join!(
        orchestrator.comfyui.is_available(),
        orchestrator.chatterbox.is_available(),
    );

    let checkpoints_sample = if image_up {
        let mut names = orchestrator.comfyui.available_checkpoints().await;
        names.truncate(CHECKPOINT_SAMPLE_LIMIT);
        Some(names)
    } else {
        None
    };

    let (status, http_status) = match (image_up, speech_up) {
        (true, true) => ("ok", StatusCode::OK),
        (false, false) => ("unavailable", StatusCode::SERVICE_UNAVAILABLE),
        _ => ("degraded", StatusCode::OK),
    };

    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        generation_slot_free: orchestrator.gate.available() > 0,
        image_backend: BackendHealth {
            available: image_up,
            url: orchestrator.comfyui.api_url().to_string(),
            checkpoints_sample,
        },
        speech_backend: BackendHealth {
            available: speech_up,
            url: orchestrator.chatterbox.api_url().to_string(),
            checkpoints_sample: None,
        },
    };

    (http_status, Json(body))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
