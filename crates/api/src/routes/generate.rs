//! Generation endpoints.
//!
//! Invalid requests are rejected with 400 before touching the capacity
//! gate. Admitted requests always answer 200 with a result body whose
//! `success` flag and `error` message carry the outcome — automation
//! callers branch on the body, not the status code.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use mediagen_core::audio::AudioRequest;
use mediagen_core::image::ImageRequest;
use mediagen_core::result::{AudioGenerationResult, ImageGenerationResult};
use mediagen_orchestrator::{audio, image};

use crate::error::AppResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate/image", post(generate_image))
        .route("/generate/audio", post(generate_audio))
}

/// `POST /generate/image`
async fn generate_image(
    State(state): State<AppState>,
    Json(request): Json<ImageRequest>,
) -> AppResult<Json<ImageGenerationResult>> {
    let request = request.validate()?;
    Ok(Json(image::generate_image(&state.orchestrator, request).await))
}

/// `POST /generate/audio`
async fn generate_audio(
    State(state): State<AppState>,
    Json(request): Json<AudioRequest>,
) -> AppResult<Json<AudioGenerationResult>> {
    let request = request.validate()?;
    Ok(Json(audio::generate_audio(&state.orchestrator, request).await))
}
