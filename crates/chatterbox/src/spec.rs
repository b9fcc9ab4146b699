//! Speech job spec resolution.

use std::path::Path;

use mediagen_core::audio::AudioRequest;
use serde::Serialize;

/// Fully resolved description of one speech synthesis job.
///
/// Serialized as-is into the backend's `POST /generate` body. Never
/// mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechJobSpec {
    pub text: String,
    pub language_id: String,
    /// Reference clip for voice cloning; `None` synthesizes with the
    /// model's stock voice.
    pub audio_prompt_path: Option<String>,
    pub exaggeration: f64,
    pub cfg_weight: f64,
    pub temperature: f64,
    pub repetition_penalty: f64,
    pub min_p: f64,
    pub top_p: f64,
    pub speed: f64,
}

impl SpeechJobSpec {
    /// Resolve a validated request into a job spec.
    ///
    /// A request without an `audio_prompt_path` falls back to the
    /// configured process-wide default voice reference when one is
    /// set; otherwise synthesis proceeds without cloning.
    pub fn from_request(request: &AudioRequest, default_voice: Option<&Path>) -> Self {
        let audio_prompt_path = request
            .audio_prompt_path
            .clone()
            .or_else(|| default_voice.map(|p| p.to_string_lossy().into_owned()));

        Self {
            text: request.text.clone(),
            language_id: request.language.clone(),
            audio_prompt_path,
            exaggeration: request.exaggeration,
            cfg_weight: request.cfg_weight,
            temperature: request.temperature,
            repetition_penalty: request.repetition_penalty,
            min_p: request.min_p,
            top_p: request.top_p,
            speed: request.speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn request(json: serde_json::Value) -> AudioRequest {
        serde_json::from_value::<AudioRequest>(json)
            .unwrap()
            .validate()
            .unwrap()
    }

    #[test]
    fn explicit_voice_reference_wins_over_default() {
        let req = request(serde_json::json!({
            "text": "Hello",
            "audio_prompt_path": "/voices/custom.wav",
        }));
        let spec = SpeechJobSpec::from_request(&req, Some(&PathBuf::from("/voices/default.mp3")));
        assert_eq!(spec.audio_prompt_path.as_deref(), Some("/voices/custom.wav"));
    }

    #[test]
    fn missing_reference_falls_back_to_configured_default() {
        let req = request(serde_json::json!({ "text": "Hello", "language": "es" }));
        let spec = SpeechJobSpec::from_request(&req, Some(&PathBuf::from("/voices/default.mp3")));
        assert_eq!(spec.audio_prompt_path.as_deref(), Some("/voices/default.mp3"));
        assert_eq!(spec.language_id, "es");
    }

    #[test]
    fn no_default_means_no_cloning() {
        let req = request(serde_json::json!({ "text": "Hello" }));
        let spec = SpeechJobSpec::from_request(&req, None);
        assert!(spec.audio_prompt_path.is_none());
    }

    #[test]
    fn identical_request_resolves_identically() {
        let req = request(serde_json::json!({ "text": "Hello", "temperature": 0.7 }));
        let a = SpeechJobSpec::from_request(&req, None);
        let b = SpeechJobSpec::from_request(&req, None);
        assert_eq!(a, b);
    }
}
