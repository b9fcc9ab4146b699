//! End-to-end speech synthesis flow.
//!
//! Submit, poll, download, loudness-normalize, then hand back both a
//! path on disk and an inline base64 payload so automation callers
//! never need a second fetch.

use std::path::{Path, PathBuf};
use std::time::Instant;

use base64::Engine;
use mediagen_chatterbox::SpeechJobSpec;
use mediagen_core::audio::AudioRequest;
use mediagen_core::error::CoreError;
use mediagen_core::job::GenerationBackend;
use mediagen_core::result::AudioGenerationResult;

use crate::loudness::normalize_wav;
use crate::poller::{poll_until_terminal, PollConfig, PollOutcome};
use crate::Orchestrator;

/// Run a validated speech request to completion.
///
/// Like the image flow, this never returns `Err`: all failure modes
/// fold into a `success: false` result, and the webhook (when
/// configured) receives the same result that is returned.
pub async fn generate_audio(
    orchestrator: &Orchestrator,
    request: AudioRequest,
) -> AudioGenerationResult {
    let started = Instant::now();
    let spec = SpeechJobSpec::from_request(&request, default_voice(orchestrator));

    tracing::info!(
        text_chars = request.text.chars().count(),
        language = %request.language,
        voice_cloning = spec.audio_prompt_path.is_some(),
        "Speech synthesis request accepted"
    );

    let token = match orchestrator.gate.acquire().await {
        Ok(token) => token,
        Err(e) => return finish(orchestrator, AudioGenerationResult::failed(e.to_string())),
    };

    let handle = match orchestrator.chatterbox.submit(&spec).await {
        Ok(handle) => handle,
        Err(e) => return finish(orchestrator, AudioGenerationResult::failed(e.to_string())),
    };

    let poll_config = PollConfig::with_budget(orchestrator.config.job_timeout);
    let outcome = poll_until_terminal(
        &orchestrator.chatterbox,
        &handle,
        &poll_config,
        &orchestrator.shutdown,
    )
    .await;

    let backend_filename = match outcome {
        PollOutcome::Succeeded(probe) => match probe.outputs.into_iter().next() {
            Some(filename) => filename,
            None => {
                return finish(
                    orchestrator,
                    AudioGenerationResult::failed(
                        "backend reported success but produced no audio file",
                    ),
                );
            }
        },
        PollOutcome::Failed(msg) => {
            return finish(
                orchestrator,
                AudioGenerationResult::failed(format!("speech synthesis failed: {msg}")),
            );
        }
        PollOutcome::TimedOut => {
            if !orchestrator.config.timeout_cooldown.is_zero() {
                tokio::time::sleep(orchestrator.config.timeout_cooldown).await;
            }
            let e = CoreError::Timeout(orchestrator.config.job_timeout);
            return finish(orchestrator, AudioGenerationResult::failed(e.to_string()));
        }
        PollOutcome::Cancelled => {
            return finish(
                orchestrator,
                AudioGenerationResult::failed("service is shutting down"),
            );
        }
    };

    let result = match assemble(orchestrator, &request, &backend_filename, started).await {
        Ok(result) => result,
        Err(e) => AudioGenerationResult::failed(e.to_string()),
    };

    drop(token);
    finish(orchestrator, result)
}

// ---- private helpers ----

fn finish(orchestrator: &Orchestrator, result: AudioGenerationResult) -> AudioGenerationResult {
    orchestrator.webhook.dispatch("audio.completed", &result);
    result
}

/// The configured default voice reference, dropped with a warning when
/// the file is missing so synthesis degrades to the stock voice
/// instead of failing on the backend.
fn default_voice(orchestrator: &Orchestrator) -> Option<&Path> {
    let path = orchestrator.config.voice_reference.as_deref()?;
    if path.exists() {
        Some(path)
    } else {
        tracing::warn!(
            path = %path.display(),
            "Configured voice reference does not exist, synthesizing without cloning"
        );
        None
    }
}

/// Download, rename, normalize, and encode the finished clip.
async fn assemble(
    orchestrator: &Orchestrator,
    request: &AudioRequest,
    backend_filename: &str,
    started: Instant,
) -> Result<AudioGenerationResult, CoreError> {
    let downloaded = orchestrator
        .chatterbox
        .download_audio(backend_filename, &orchestrator.config.audio_output_dir)
        .await?;

    // Stable, collision-free local name independent of whatever the
    // backend called the file.
    let filename = format!("chatterbox_{}.wav", chrono::Utc::now().timestamp_millis());
    let final_path = orchestrator.config.audio_output_dir.join(&filename);
    tokio::fs::rename(&downloaded, &final_path)
        .await
        .map_err(|e| {
            CoreError::Internal(format!("cannot move audio to {}: {e}", final_path.display()))
        })?;

    let clip = normalize_blocking(final_path.clone(), orchestrator.config.target_loudness_db)
        .await?;

    let bytes = tokio::fs::read(&final_path)
        .await
        .map_err(|e| CoreError::Internal(format!("cannot read {}: {e}", final_path.display())))?;
    let base64_audio = base64::engine::general_purpose::STANDARD.encode(&bytes);

    tracing::info!(
        filename = %filename,
        sample_rate = clip.sample_rate,
        duration_secs = clip.duration_secs,
        normalized = clip.normalized,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Speech synthesis completed"
    );

    Ok(AudioGenerationResult {
        success: true,
        filename: Some(filename),
        audio_path: Some(final_path.display().to_string()),
        sample_rate: Some(clip.sample_rate),
        text_length: Some(request.text.chars().count()),
        language_id: Some(request.language.clone()),
        base64_audio: Some(base64_audio),
        error: None,
    })
}

/// Loudness normalization does synchronous file I/O and sample math;
/// keep it off the async runtime threads.
async fn normalize_blocking(
    path: PathBuf,
    target_db: f64,
) -> Result<crate::loudness::ClipInfo, CoreError> {
    let handle =
        tokio::task::spawn_blocking(move || normalize_wav(&path, target_db));
    handle
        .await
        .map_err(|e| CoreError::Internal(format!("normalization task panicked: {e}")))?
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
