//! Process-wide orchestration configuration.
//!
//! Built once at startup from environment variables, then passed
//! around behind an `Arc` and never mutated.

use std::path::PathBuf;
use std::time::Duration;

/// Immutable configuration for the orchestration layer.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// ComfyUI base HTTP URL.
    pub comfyui_url: String,
    /// Chatterbox TTS base HTTP URL.
    pub chatterbox_url: String,
    /// Where downloaded images land.
    pub image_output_dir: PathBuf,
    /// Where downloaded (and normalized) audio lands.
    pub audio_output_dir: PathBuf,
    /// FLUX.1 checkpoint filename in ComfyUI's `models/checkpoints/`.
    pub checkpoint: String,
    /// Default voice-reference clip for cloning; `None` disables the
    /// fallback and requests without a reference synthesize uncloned.
    pub voice_reference: Option<PathBuf>,
    /// Overall per-job budget (submit to terminal status).
    pub job_timeout: Duration,
    /// Per-HTTP-call timeout against the backends.
    pub call_timeout: Duration,
    /// How long a request may wait for the generation slot.
    pub admission_timeout: Duration,
    /// Held before releasing the slot after a client-side timeout —
    /// the backend may still be busy with the abandoned job.
    pub timeout_cooldown: Duration,
    /// Automation-platform webhook notified when a result is ready.
    pub webhook_url: Option<String>,
    /// Target RMS loudness for synthesized audio, in dBFS.
    pub target_loudness_db: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            comfyui_url: "http://127.0.0.1:8188".to_string(),
            chatterbox_url: "http://127.0.0.1:8004".to_string(),
            image_output_dir: PathBuf::from("./outputs/images"),
            audio_output_dir: PathBuf::from("./outputs/audio"),
            checkpoint: "flux1-schnell-fp8.safetensors".to_string(),
            voice_reference: None,
            job_timeout: Duration::from_secs(120),
            call_timeout: Duration::from_secs(30),
            admission_timeout: Duration::from_secs(30),
            timeout_cooldown: Duration::ZERO,
            webhook_url: None,
            target_loudness_db: -16.0,
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                          |
    /// |----------------------------------|----------------------------------|
    /// | `MEDIAGEN_COMFYUI_URL`           | `http://127.0.0.1:8188`          |
    /// | `MEDIAGEN_CHATTERBOX_URL`        | `http://127.0.0.1:8004`          |
    /// | `MEDIAGEN_IMAGE_OUTPUT_DIR`      | `./outputs/images`               |
    /// | `MEDIAGEN_AUDIO_OUTPUT_DIR`      | `./outputs/audio`                |
    /// | `MEDIAGEN_CHECKPOINT`            | `flux1-schnell-fp8.safetensors`  |
    /// | `MEDIAGEN_VOICE_REFERENCE`       | unset (no cloning fallback)      |
    /// | `MEDIAGEN_JOB_TIMEOUT_SECS`      | `120`                            |
    /// | `MEDIAGEN_CALL_TIMEOUT_SECS`     | `30`                             |
    /// | `MEDIAGEN_ADMISSION_TIMEOUT_SECS`| `30`                             |
    /// | `MEDIAGEN_TIMEOUT_COOLDOWN_SECS` | `0`                              |
    /// | `MEDIAGEN_WEBHOOK_URL`           | unset (no webhook dispatch)      |
    /// | `MEDIAGEN_TARGET_LOUDNESS_DB`    | `-16.0`                          |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            comfyui_url: env_or("MEDIAGEN_COMFYUI_URL", defaults.comfyui_url),
            chatterbox_url: env_or("MEDIAGEN_CHATTERBOX_URL", defaults.chatterbox_url),
            image_output_dir: PathBuf::from(env_or(
                "MEDIAGEN_IMAGE_OUTPUT_DIR",
                defaults.image_output_dir.display().to_string(),
            )),
            audio_output_dir: PathBuf::from(env_or(
                "MEDIAGEN_AUDIO_OUTPUT_DIR",
                defaults.audio_output_dir.display().to_string(),
            )),
            checkpoint: env_or("MEDIAGEN_CHECKPOINT", defaults.checkpoint),
            voice_reference: std::env::var("MEDIAGEN_VOICE_REFERENCE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            job_timeout: env_secs("MEDIAGEN_JOB_TIMEOUT_SECS", defaults.job_timeout),
            call_timeout: env_secs("MEDIAGEN_CALL_TIMEOUT_SECS", defaults.call_timeout),
            admission_timeout: env_secs(
                "MEDIAGEN_ADMISSION_TIMEOUT_SECS",
                defaults.admission_timeout,
            ),
            timeout_cooldown: env_secs(
                "MEDIAGEN_TIMEOUT_COOLDOWN_SECS",
                defaults.timeout_cooldown,
            ),
            webhook_url: std::env::var("MEDIAGEN_WEBHOOK_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            target_loudness_db: std::env::var("MEDIAGEN_TARGET_LOUDNESS_DB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.target_loudness_db),
        }
    }
}

fn env_or(var: &str, default: String) -> String {
    std::env::var(var).unwrap_or(default)
}

fn env_secs(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
