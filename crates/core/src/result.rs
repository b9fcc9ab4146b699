//! The stable caller-facing result contract.
//!
//! Exactly one result (success or failure) is produced per accepted
//! request. These shapes are the external contract — backend status
//! vocabulary must never appear in them.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Image results
// ---------------------------------------------------------------------------

/// Metadata for one generated image artifact, with the generation
/// parameters echoed back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Absolute path to the downloaded file.
    pub image_path: String,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
    /// The resolved seed actually used for this image.
    pub seed: u32,
    pub prompt: String,
    pub steps: u32,
    pub guidance_scale: f64,
    pub file_size_bytes: u64,
    /// Wall time from request acceptance to artifact on disk.
    pub generation_time_ms: u64,
}

/// Complete outcome of one image generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationResult {
    pub success: bool,
    pub images: Vec<GeneratedImage>,
    pub total_generated: usize,
    pub error: Option<String>,
}

impl ImageGenerationResult {
    pub fn succeeded(images: Vec<GeneratedImage>) -> Self {
        Self {
            success: true,
            total_generated: images.len(),
            images,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            images: Vec::new(),
            total_generated: 0,
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Audio results
// ---------------------------------------------------------------------------

/// Complete outcome of one speech synthesis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioGenerationResult {
    pub success: bool,
    pub filename: Option<String>,
    /// Absolute path to the normalized WAV on disk.
    pub audio_path: Option<String>,
    pub sample_rate: Option<u32>,
    pub text_length: Option<usize>,
    pub language_id: Option<String>,
    /// Standard-alphabet base64 of the WAV payload.
    pub base64_audio: Option<String>,
    pub error: Option<String>,
}

impl AudioGenerationResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            filename: None,
            audio_path: None,
            sample_rate: None,
            text_length: None,
            language_id: None,
            base64_audio: None,
            error: Some(error.into()),
        }
    }
}
