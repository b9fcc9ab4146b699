//! End-to-end image generation flow.
//!
//! One accepted request produces exactly one result. Batches run as
//! sequential backend jobs under a single capacity token, each with a
//! deterministic per-image seed derived from the resolved base seed.

use std::path::Path;
use std::time::Instant;

use mediagen_comfyui::ImageJobSpec;
use mediagen_core::error::CoreError;
use mediagen_core::image::{resolve_dimensions, ImageRequest};
use mediagen_core::job::{resolve_seed, GenerationBackend};
use mediagen_core::result::{GeneratedImage, ImageGenerationResult};

use crate::poller::{poll_until_terminal, PollConfig, PollOutcome};
use crate::Orchestrator;

/// Run a validated image request to completion.
///
/// Never returns an `Err`: every failure mode is folded into a
/// `success: false` result carrying a caller-actionable message. The
/// webhook (when configured) receives the same result that is
/// returned.
pub async fn generate_image(
    orchestrator: &Orchestrator,
    request: ImageRequest,
) -> ImageGenerationResult {
    let started = Instant::now();
    let base_seed = resolve_seed(request.seed);
    let (width, height) = resolve_dimensions(&request);

    tracing::info!(
        prompt_chars = request.prompt.chars().count(),
        width,
        height,
        steps = request.steps,
        batch_size = request.batch_size,
        base_seed,
        "Image generation request accepted"
    );

    let token = match orchestrator.gate.acquire().await {
        Ok(token) => token,
        Err(e) => {
            return finish(orchestrator, ImageGenerationResult::failed(e.to_string()));
        }
    };

    let poll_config = PollConfig::with_budget(orchestrator.config.job_timeout);
    let mut images = Vec::with_capacity(request.batch_size as usize);

    for index in 0..request.batch_size {
        let seed = base_seed.wrapping_add(index);
        let spec = ImageJobSpec::from_request(&request, &orchestrator.config.checkpoint, seed);

        let handle = match orchestrator.comfyui.submit(&spec).await {
            Ok(handle) => handle,
            Err(e) => {
                return finish(
                    orchestrator,
                    ImageGenerationResult::failed(batch_error(index, &images, &e.to_string())),
                );
            }
        };

        let outcome = poll_until_terminal(
            &orchestrator.comfyui,
            &handle,
            &poll_config,
            &orchestrator.shutdown,
        )
        .await;

        let outputs = match outcome {
            PollOutcome::Succeeded(probe) => probe.outputs,
            PollOutcome::Failed(msg) => {
                return finish(
                    orchestrator,
                    ImageGenerationResult::failed(batch_error(index, &images, &msg)),
                );
            }
            PollOutcome::TimedOut => {
                // The backend may still be grinding on the abandoned
                // job; keep the slot for the configured cooldown so a
                // follow-up request does not pile on.
                if !orchestrator.config.timeout_cooldown.is_zero() {
                    tokio::time::sleep(orchestrator.config.timeout_cooldown).await;
                }
                let e = CoreError::Timeout(orchestrator.config.job_timeout);
                return finish(
                    orchestrator,
                    ImageGenerationResult::failed(batch_error(index, &images, &e.to_string())),
                );
            }
            PollOutcome::Cancelled => {
                return finish(
                    orchestrator,
                    ImageGenerationResult::failed("service is shutting down"),
                );
            }
        };

        if outputs.is_empty() {
            return finish(
                orchestrator,
                ImageGenerationResult::failed(batch_error(
                    index,
                    &images,
                    "backend reported success but produced no output files",
                )),
            );
        }

        for filename in &outputs {
            match orchestrator
                .comfyui
                .download_image(filename, &orchestrator.config.image_output_dir)
                .await
            {
                Ok(path) => {
                    images.push(
                        describe_artifact(&path, filename, &request, seed, width, height, started)
                            .await,
                    );
                }
                Err(e) => {
                    return finish(
                        orchestrator,
                        ImageGenerationResult::failed(batch_error(index, &images, &e.to_string())),
                    );
                }
            }
        }
    }

    drop(token);

    tracing::info!(
        total = images.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Image generation completed"
    );
    finish(orchestrator, ImageGenerationResult::succeeded(images))
}

// ---- private helpers ----

/// Dispatch the webhook (when configured) and hand the result back.
fn finish(orchestrator: &Orchestrator, result: ImageGenerationResult) -> ImageGenerationResult {
    orchestrator.webhook.dispatch("image.completed", &result);
    result
}

/// Failure message that accounts for artifacts already produced by
/// earlier batch entries. Partial output on disk is not surfaced as a
/// success.
fn batch_error(index: u32, completed: &[GeneratedImage], detail: &str) -> String {
    if index == 0 && completed.is_empty() {
        detail.to_string()
    } else {
        format!(
            "batch aborted at image {} of the request ({} already written): {detail}",
            index + 1,
            completed.len()
        )
    }
}

/// Assemble per-artifact metadata, preferring what the file on disk
/// actually says over what was requested.
async fn describe_artifact(
    path: &Path,
    filename: &str,
    request: &ImageRequest,
    seed: u32,
    requested_width: u32,
    requested_height: u32,
    started: Instant,
) -> GeneratedImage {
    let (width, height) = match image::image_dimensions(path) {
        Ok(dims) => dims,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Could not read image header, falling back to requested dimensions"
            );
            (requested_width, requested_height)
        }
    };

    let file_size_bytes = tokio::fs::metadata(path)
        .await
        .map(|m| m.len())
        .unwrap_or(0);

    GeneratedImage {
        image_path: path.display().to_string(),
        filename: filename.to_string(),
        width,
        height,
        format: request.output_format.as_str().to_string(),
        seed,
        prompt: request.prompt.clone(),
        steps: request.steps,
        guidance_scale: request.guidance_scale,
        file_size_bytes,
        generation_time_ms: started.elapsed().as_millis() as u64,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
