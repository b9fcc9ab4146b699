//! Request validation behaviour at the HTTP boundary.
//!
//! Invalid requests must be rejected with 400 and a structured body
//! before any backend traffic or capacity admission happens — all
//! backends here are dead on purpose.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, post_json};
use serde_json::json;

async fn app_with_dead_backends() -> (Router, tempfile::TempDir) {
    let comfyui = common::dead_backend_url().await;
    let chatterbox = common::dead_backend_url().await;
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_orchestrator_config(&comfyui, &chatterbox, dir.path());
    (common::build_test_app(config), dir)
}

// ---------------------------------------------------------------------------
// Image request validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn image_prompt_too_short_is_rejected() {
    let (app, _dir) = app_with_dead_backends().await;
    let response = post_json(app, "/generate/image", json!({"prompt": "ab"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().unwrap().contains("prompt"));
}

#[tokio::test]
async fn image_steps_out_of_range_is_rejected() {
    let (app, _dir) = app_with_dead_backends().await;
    let response = post_json(
        app,
        "/generate/image",
        json!({"prompt": "a red apple", "steps": 0}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn image_custom_ratio_without_dimensions_is_rejected() {
    let (app, _dir) = app_with_dead_backends().await;
    let response = post_json(
        app,
        "/generate/image",
        json!({"prompt": "a red apple", "aspect_ratio": "custom"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn image_unknown_aspect_ratio_without_dimensions_is_rejected() {
    let (app, _dir) = app_with_dead_backends().await;
    let response = post_json(
        app,
        "/generate/image",
        json!({"prompt": "a red apple", "aspect_ratio": "2:3"}),
    )
    .await;
    // Unrecognized ratio tokens take the custom path, which needs
    // explicit dimensions.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().unwrap().contains("width and height"));
}

#[tokio::test]
async fn image_unknown_aspect_ratio_with_dimensions_is_admitted() {
    let (app, _dir) = app_with_dead_backends().await;
    let response = post_json(
        app,
        "/generate/image",
        json!({
            "prompt": "a red apple",
            "aspect_ratio": "2:3",
            "width": 1024,
            "height": 768,
        }),
    )
    .await;
    // Validation passes; the dead backend turns the admitted request
    // into a body-level failure, never a 4xx.
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));
}

#[tokio::test]
async fn image_missing_prompt_is_rejected_at_parse_time() {
    let (app, _dir) = app_with_dead_backends().await;
    let response = post_json(app, "/generate/image", json!({"steps": 8})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ---------------------------------------------------------------------------
// Audio request validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn audio_empty_text_is_rejected() {
    let (app, _dir) = app_with_dead_backends().await;
    let response = post_json(app, "/generate/audio", json!({"text": "   "})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn audio_tuning_parameter_out_of_range_is_rejected() {
    let (app, _dir) = app_with_dead_backends().await;
    let response = post_json(
        app,
        "/generate/audio",
        json!({"text": "Hello there", "temperature": 9.5}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("temperature"));
}
