//! Shared test harness: app construction and mock generation backends.
//!
//! The mock backends are real axum servers bound to ephemeral ports,
//! so tests exercise the actual HTTP clients, the poll loop, and the
//! artifact downloads end to end.

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path as AxumPath, State};
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::routing;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use mediagen_api::config::ServerConfig;
use mediagen_api::router::build_app_router;
use mediagen_api::state::AppState;
use mediagen_orchestrator::config::OrchestratorConfig;
use mediagen_orchestrator::Orchestrator;

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Orchestrator configuration pointed at the given mock backends, with
/// artifacts landing in `output_root`.
pub fn test_orchestrator_config(
    comfyui_url: &str,
    chatterbox_url: &str,
    output_root: &Path,
) -> OrchestratorConfig {
    OrchestratorConfig {
        comfyui_url: comfyui_url.to_string(),
        chatterbox_url: chatterbox_url.to_string(),
        image_output_dir: output_root.join("images"),
        audio_output_dir: output_root.join("audio"),
        job_timeout: Duration::from_secs(30),
        call_timeout: Duration::from_secs(5),
        admission_timeout: Duration::from_secs(5),
        ..OrchestratorConfig::default()
    }
}

/// Build the application router exactly as `main.rs` does.
pub fn build_test_app(config: OrchestratorConfig) -> Router {
    build_test_app_with_orchestrator(config).0
}

/// Like [`build_test_app`], but also hands back the orchestrator so
/// tests can observe capacity-gate state.
#[allow(dead_code)]
pub fn build_test_app_with_orchestrator(
    config: OrchestratorConfig,
) -> (Router, Arc<Orchestrator>) {
    let orchestrator = Orchestrator::new(Arc::new(config));
    let state = AppState {
        orchestrator: Arc::clone(&orchestrator),
    };
    let router = build_app_router(
        state,
        &ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 60,
        },
    );
    (router, orchestrator)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

#[allow(dead_code)]
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

#[allow(dead_code)]
pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Mock ComfyUI
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct MockComfyState {
    counter: Arc<AtomicU32>,
}

/// Spawn a mock ComfyUI server; returns its base URL.
///
/// Every submitted workflow completes on the first history probe with
/// a unique output filename, and `/view` answers with a real 64x64
/// PNG.
#[allow(dead_code)]
pub async fn spawn_mock_comfyui() -> String {
    let state = MockComfyState {
        counter: Arc::new(AtomicU32::new(0)),
    };

    let router = Router::new()
        .route("/system_stats", routing::get(|| async { Json(json!({"system": {}})) }))
        .route(
            "/object_info/CheckpointLoaderSimple",
            routing::get(|| async {
                Json(json!({
                    "CheckpointLoaderSimple": {
                        "input": {
                            "required": {
                                "ckpt_name": [[
                                    "flux1-schnell-fp8.safetensors",
                                    "flux1-dev-fp8.safetensors",
                                ]]
                            }
                        }
                    }
                }))
            }),
        )
        .route("/prompt", routing::post(mock_submit))
        .route("/history/{prompt_id}", routing::get(mock_history))
        .route("/view", routing::get(|| async { png_bytes().into_response() }))
        .with_state(state);

    spawn(router).await
}

async fn mock_submit(State(state): State<MockComfyState>, Json(_body): Json<Value>) -> Json<Value> {
    let n = state.counter.fetch_add(1, Ordering::SeqCst);
    Json(json!({"prompt_id": format!("prompt-{n}"), "number": n}))
}

async fn mock_history(AxumPath(prompt_id): AxumPath<String>) -> Json<Value> {
    let filename = format!("flux_mediagen_{prompt_id}_00001_.png");
    let entry = json!({
        "status": {"status_str": "success", "completed": true},
        "outputs": {
            "8": {"images": [{"filename": filename, "subfolder": "", "type": "output"}]}
        }
    });
    let mut history = serde_json::Map::new();
    history.insert(prompt_id, entry);
    Json(Value::Object(history))
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(64, 64, image::Rgb([120, 40, 200]));
    let mut cursor = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut cursor, image::ImageFormat::Png)
        .unwrap();
    cursor.into_inner()
}

/// Spawn a mock ComfyUI whose jobs never finish: submission succeeds
/// but the history stays empty forever, so every poll sees a queued
/// job until the caller's budget runs out.
#[allow(dead_code)]
pub async fn spawn_stuck_comfyui() -> String {
    let router = Router::new()
        .route("/system_stats", routing::get(|| async { Json(json!({"system": {}})) }))
        .route(
            "/prompt",
            routing::post(|| async { Json(json!({"prompt_id": "prompt-stuck", "number": 0})) }),
        )
        .route("/history/{prompt_id}", routing::get(|| async { Json(json!({})) }));

    spawn(router).await
}

// ---------------------------------------------------------------------------
// Mock Chatterbox
// ---------------------------------------------------------------------------

/// Spawn a mock Chatterbox server; returns its base URL.
///
/// Jobs complete on the first status probe, and `/audio/{file}`
/// answers with a real 3-second WAV clip loud enough to exercise the
/// normalization path.
#[allow(dead_code)]
pub async fn spawn_mock_chatterbox() -> String {
    let router = Router::new()
        .route("/health", routing::get(|| async { Json(json!({"status": "ok"})) }))
        .route(
            "/languages",
            routing::get(|| async {
                Json(json!({"languages": {"en": "English", "de": "German"}}))
            }),
        )
        .route(
            "/generate",
            routing::post(|| async { Json(json!({"job_id": "job-1"})) }),
        )
        .route(
            "/jobs/{job_id}",
            routing::get(|| async {
                Json(json!({
                    "status": "done",
                    "filename": "synth.wav",
                    "sample_rate": 22_050,
                }))
            }),
        )
        .route(
            "/audio/{filename}",
            routing::get(|| async { wav_bytes().into_response() }),
        );

    spawn(router).await
}

/// Spawn a mock Chatterbox whose jobs report `running` forever.
#[allow(dead_code)]
pub async fn spawn_stuck_chatterbox() -> String {
    let router = Router::new()
        .route("/health", routing::get(|| async { Json(json!({"status": "ok"})) }))
        .route(
            "/generate",
            routing::post(|| async { Json(json!({"job_id": "job-stuck"})) }),
        )
        .route(
            "/jobs/{job_id}",
            routing::get(|| async { Json(json!({"status": "running"})) }),
        );

    spawn(router).await
}

fn wav_bytes() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 22_050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for n in 0..(22_050 * 3) {
            let t = n as f32 / 22_050.0;
            let sample = 0.3 * (std::f32::consts::TAU * 220.0 * t).sin();
            writer
                .write_sample((sample * i16::MAX as f32) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

// ---------------------------------------------------------------------------
// Plumbing
// ---------------------------------------------------------------------------

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base URL that nothing listens on (the port is bound and released
/// before returning, so connections are refused immediately).
#[allow(dead_code)]
pub async fn dead_backend_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
