//! Speech synthesis request model and validation.
//!
//! Mirrors the Chatterbox multilingual TTS parameter surface. The
//! voice-reference path is resolved later against process-wide
//! configuration; validation here is purely range checking.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum synthesized text length; longer input is truncated, not
/// rejected (automation callers routinely paste whole articles).
pub const MAX_TEXT_LEN: usize = 5000;

/// Emotional intensity bounds. Lower reads flatter.
pub const MIN_EXAGGERATION: f64 = 0.0;
pub const MAX_EXAGGERATION: f64 = 2.0;
/// CFG / pacing weight bounds.
pub const MIN_CFG_WEIGHT: f64 = 0.0;
pub const MAX_CFG_WEIGHT: f64 = 1.0;
/// Sampling temperature bounds.
pub const MIN_TEMPERATURE: f64 = 0.05;
pub const MAX_TEMPERATURE: f64 = 2.0;
/// Repetition penalty bounds.
pub const MIN_REPETITION_PENALTY: f64 = 1.0;
pub const MAX_REPETITION_PENALTY: f64 = 3.0;
/// Nucleus/min-p sampling bounds.
pub const MIN_P_RANGE: (f64, f64) = (0.0, 1.0);
pub const TOP_P_RANGE: (f64, f64) = (0.0, 1.0);
/// Speaking-rate bounds. Below 1.0 is slower narration pacing.
pub const MIN_SPEED: f64 = 0.5;
pub const MAX_SPEED: f64 = 1.5;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// An inbound speech synthesis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioRequest {
    /// Text to synthesize. Accepts `prompt` as an alias.
    #[serde(alias = "prompt")]
    pub text: String,

    /// ISO language code (en, es, fr, ...). Defaults to "en".
    #[serde(default = "default_language", alias = "language_id")]
    pub language: String,

    /// Path to a reference clip for voice cloning. When absent, the
    /// configured process-wide default applies (if any).
    #[serde(default, alias = "audio_prompt")]
    pub audio_prompt_path: Option<String>,

    #[serde(default = "default_exaggeration")]
    pub exaggeration: f64,

    #[serde(default = "default_cfg_weight")]
    pub cfg_weight: f64,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f64,

    #[serde(default = "default_min_p")]
    pub min_p: f64,

    #[serde(default = "default_top_p")]
    pub top_p: f64,

    #[serde(default = "default_speed")]
    pub speed: f64,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_exaggeration() -> f64 {
    0.4
}

fn default_cfg_weight() -> f64 {
    0.5
}

fn default_temperature() -> f64 {
    0.6
}

fn default_repetition_penalty() -> f64 {
    2.0
}

fn default_min_p() -> f64 {
    0.05
}

fn default_top_p() -> f64 {
    1.0
}

fn default_speed() -> f64 {
    1.0
}

impl AudioRequest {
    /// Validate and normalize the request.
    ///
    /// The text is trimmed and truncated to [`MAX_TEXT_LEN`]
    /// characters; the language code is lowercased with an "en"
    /// fallback for blank input. All tuning parameters must lie within
    /// their documented ranges.
    pub fn validate(mut self) -> Result<Self, CoreError> {
        self.text = self.text.trim().to_string();
        if self.text.is_empty() {
            return Err(CoreError::Validation(
                "text must not be empty".to_string(),
            ));
        }
        if self.text.chars().count() > MAX_TEXT_LEN {
            self.text = self.text.chars().take(MAX_TEXT_LEN).collect();
        }

        self.language = self.language.trim().to_lowercase();
        if self.language.is_empty() {
            self.language = default_language();
        }

        let ranges: [(&str, f64, f64, f64); 7] = [
            (
                "exaggeration",
                self.exaggeration,
                MIN_EXAGGERATION,
                MAX_EXAGGERATION,
            ),
            ("cfg_weight", self.cfg_weight, MIN_CFG_WEIGHT, MAX_CFG_WEIGHT),
            (
                "temperature",
                self.temperature,
                MIN_TEMPERATURE,
                MAX_TEMPERATURE,
            ),
            (
                "repetition_penalty",
                self.repetition_penalty,
                MIN_REPETITION_PENALTY,
                MAX_REPETITION_PENALTY,
            ),
            ("min_p", self.min_p, MIN_P_RANGE.0, MIN_P_RANGE.1),
            ("top_p", self.top_p, TOP_P_RANGE.0, TOP_P_RANGE.1),
            ("speed", self.speed, MIN_SPEED, MAX_SPEED),
        ];
        for (name, value, min, max) in ranges {
            if !(min..=max).contains(&value) {
                return Err(CoreError::Validation(format!(
                    "{name} must be between {min} and {max}, got {value}"
                )));
            }
        }

        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
