//! Post-generation loudness normalization for synthesized speech.
//!
//! Clips are pulled toward a uniform RMS loudness target so that output
//! volume does not vary with voice reference or text. Short clips and
//! near-silent clips are left untouched: gain estimation on them is
//! unreliable and near-silence would be amplified into noise.

use std::path::Path;

use mediagen_core::error::CoreError;

/// Clips shorter than this are returned unmodified.
const MIN_DURATION_SECS: f64 = 2.0;

/// Clips quieter than this RMS level are treated as silence and
/// returned unmodified.
const SILENCE_FLOOR_DB: f64 = -60.0;

/// Basic facts about a WAV clip, measured while normalizing.
#[derive(Debug, Clone, Copy)]
pub struct ClipInfo {
    pub sample_rate: u32,
    pub duration_secs: f64,
    /// Whether a gain was actually applied to the file.
    pub normalized: bool,
}

/// Normalize the WAV file at `path` in place toward `target_db` RMS.
///
/// Multi-channel clips are normalized with a single gain computed over
/// all channels. Samples are clamped to [-1, 1] after the gain is
/// applied, so a very quiet clip cannot be pushed into wraparound.
pub fn normalize_wav(path: &Path, target_db: f64) -> Result<ClipInfo, CoreError> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| CoreError::Internal(format!("failed to open WAV {}: {e}", path.display())))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let mut samples = read_samples_f32(reader, &spec)?;
    let frames = samples.len() / channels;
    let duration_secs = frames as f64 / spec.sample_rate.max(1) as f64;

    let info = |normalized| ClipInfo {
        sample_rate: spec.sample_rate,
        duration_secs,
        normalized,
    };

    if duration_secs < MIN_DURATION_SECS {
        tracing::debug!(
            path = %path.display(),
            duration_secs,
            "Clip too short for loudness normalization, leaving as-is"
        );
        return Ok(info(false));
    }

    let rms = rms_dbfs(&samples);
    if rms <= SILENCE_FLOOR_DB {
        tracing::debug!(
            path = %path.display(),
            rms_db = rms,
            "Clip below silence floor, leaving as-is"
        );
        return Ok(info(false));
    }

    let gain = 10f64.powf((target_db - rms) / 20.0) as f32;
    for sample in &mut samples {
        *sample = (*sample * gain).clamp(-1.0, 1.0);
    }

    write_samples_i16(path, &spec, &samples)?;
    tracing::debug!(
        path = %path.display(),
        rms_db = rms,
        target_db,
        gain,
        "Normalized clip loudness"
    );
    Ok(info(true))
}

/// RMS level of the samples in dBFS, where a full-scale square wave is
/// 0 dB. Returns negative infinity for an empty or all-zero clip.
pub fn rms_dbfs(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return f64::NEG_INFINITY;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    let mean_sq = sum_sq / samples.len() as f64;
    if mean_sq <= 0.0 {
        return f64::NEG_INFINITY;
    }
    10.0 * mean_sq.log10()
}

// ---- private helpers ----

fn read_samples_f32<R: std::io::Read>(
    mut reader: hound::WavReader<R>,
    spec: &hound::WavSpec,
) -> Result<Vec<f32>, CoreError> {
    let samples = match spec.sample_format {
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample.max(1) as u32;
            let max_val = if bits > 1 {
                ((1i64 << (bits - 1)) - 1) as f32
            } else {
                1.0
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v as f32 / max_val).clamp(-1.0, 1.0)))
                .collect::<Result<Vec<f32>, _>>()
        }
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<f32>, _>>(),
    };
    samples.map_err(|e| CoreError::Internal(format!("failed to decode WAV samples: {e}")))
}

fn write_samples_i16(
    path: &Path,
    spec: &hound::WavSpec,
    samples: &[f32],
) -> Result<(), CoreError> {
    let out_spec = hound::WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, out_spec)
        .map_err(|e| CoreError::Internal(format!("failed to rewrite WAV {}: {e}", path.display())))?;
    for &sample in samples {
        let value = (sample * i16::MAX as f32).round() as i16;
        writer
            .write_sample(value)
            .map_err(|e| CoreError::Internal(format!("failed to write WAV sample: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| CoreError::Internal(format!("failed to finalize WAV: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
