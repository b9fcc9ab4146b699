//! Image generation request model, validation, and dimension
//! resolution.
//!
//! The validated [`ImageRequest`] is the single source of truth for
//! everything the workflow builder needs; validation is a pure
//! function of the input and never partially applies a request.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum prompt length after trimming.
pub const MIN_PROMPT_LEN: usize = 3;
/// Maximum prompt length.
pub const MAX_PROMPT_LEN: usize = 2000;
/// Maximum negative-prompt length.
pub const MAX_NEGATIVE_PROMPT_LEN: usize = 500;
/// Inference step bounds. FLUX schnell wants 4-8, dev 20-30.
pub const MIN_STEPS: u32 = 1;
pub const MAX_STEPS: u32 = 50;
/// Guidance scale bounds for FLUX.1.
pub const MIN_GUIDANCE: f64 = 0.0;
pub const MAX_GUIDANCE: f64 = 20.0;
/// Custom dimension bounds in pixels.
pub const MIN_DIMENSION: u32 = 256;
pub const MAX_DIMENSION: u32 = 4096;
/// Batch size bounds (VRAM-limited).
pub const MIN_BATCH_SIZE: u32 = 1;
pub const MAX_BATCH_SIZE: u32 = 4;

/// FLUX.1 requires dimensions that are multiples of this.
pub const DIMENSION_MULTIPLE: u32 = 64;

/// Default negative prompt applied when the caller sends none.
pub const DEFAULT_NEGATIVE_PROMPT: &str = "blurry, low quality, distorted, watermark, text";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Predefined aspect ratios with fixed high-quality dimensions.
///
/// `Custom` requires explicit `width`/`height` on the request.
/// Deserialization is tolerant: an unrecognized ratio token falls back
/// to `Custom` rather than failing the parse, so callers hit the
/// dimension requirement in validation instead of a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Photo,
    #[serde(rename = "21:9")]
    Wide,
    #[serde(rename = "custom")]
    Custom,
}

impl AspectRatio {
    /// Map a ratio token onto a preset. Anything unrecognized becomes
    /// `Custom`, which `validate()` then requires dimensions for.
    pub fn from_token(token: &str) -> Self {
        match token {
            "1:1" => AspectRatio::Square,
            "16:9" => AspectRatio::Landscape,
            "9:16" => AspectRatio::Portrait,
            "4:3" => AspectRatio::Photo,
            "21:9" => AspectRatio::Wide,
            _ => AspectRatio::Custom,
        }
    }

    /// Fixed pixel dimensions for each predefined ratio (multiples of
    /// 64, sized for ~4K output on an 8GB card).
    ///
    /// Returns `None` for [`AspectRatio::Custom`].
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            AspectRatio::Square => Some((2048, 2048)),
            AspectRatio::Landscape => Some((3840, 2160)),
            AspectRatio::Portrait => Some((2160, 3840)),
            AspectRatio::Photo => Some((2560, 1920)),
            AspectRatio::Wide => Some((3840, 1600)),
            AspectRatio::Custom => None,
        }
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        Ok(AspectRatio::from_token(&token))
    }
}

/// Output image encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// An inbound image generation request.
///
/// Deserialized straight from the HTTP body. Call
/// [`ImageRequest::validate`] before handing it to the workflow
/// builder; the returned request is normalized (trimmed prompt) and
/// guaranteed in-range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Text description of the image. Accepts `description` as an
    /// alias for automation-platform callers.
    #[serde(alias = "description")]
    pub prompt: String,

    /// Elements to steer away from.
    #[serde(default = "default_negative_prompt")]
    pub negative_prompt: String,

    #[serde(default)]
    pub aspect_ratio: AspectRatio,

    /// Explicit width in pixels; only honoured with `aspect_ratio = "custom"`.
    #[serde(default)]
    pub width: Option<u32>,

    /// Explicit height in pixels; only honoured with `aspect_ratio = "custom"`.
    #[serde(default)]
    pub height: Option<u32>,

    #[serde(default = "default_steps")]
    pub steps: u32,

    #[serde(default = "default_guidance")]
    pub guidance_scale: f64,

    /// Seed for reproducibility. `None` draws a fresh random seed at
    /// job-spec time.
    #[serde(default)]
    pub seed: Option<u32>,

    #[serde(default)]
    pub output_format: ImageFormat,

    /// Number of images generated per request, each with seed `seed + i`.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_negative_prompt() -> String {
    DEFAULT_NEGATIVE_PROMPT.to_string()
}

fn default_steps() -> u32 {
    8
}

fn default_guidance() -> f64 {
    4.0
}

fn default_batch_size() -> u32 {
    1
}

impl ImageRequest {
    /// Validate and normalize the request.
    ///
    /// Checks every field against its documented range and fails with
    /// a [`CoreError::Validation`] naming the offending field. The
    /// prompt is trimmed; nothing else is mutated.
    pub fn validate(mut self) -> Result<Self, CoreError> {
        self.prompt = self.prompt.trim().to_string();

        if self.prompt.chars().count() < MIN_PROMPT_LEN {
            return Err(CoreError::Validation(format!(
                "prompt must be at least {MIN_PROMPT_LEN} characters"
            )));
        }
        if self.prompt.chars().count() > MAX_PROMPT_LEN {
            return Err(CoreError::Validation(format!(
                "prompt must not exceed {MAX_PROMPT_LEN} characters"
            )));
        }
        if self.negative_prompt.chars().count() > MAX_NEGATIVE_PROMPT_LEN {
            return Err(CoreError::Validation(format!(
                "negative_prompt must not exceed {MAX_NEGATIVE_PROMPT_LEN} characters"
            )));
        }
        if !(MIN_STEPS..=MAX_STEPS).contains(&self.steps) {
            return Err(CoreError::Validation(format!(
                "steps must be between {MIN_STEPS} and {MAX_STEPS}, got {}",
                self.steps
            )));
        }
        if !(MIN_GUIDANCE..=MAX_GUIDANCE).contains(&self.guidance_scale) {
            return Err(CoreError::Validation(format!(
                "guidance_scale must be between {MIN_GUIDANCE} and {MAX_GUIDANCE}, got {}",
                self.guidance_scale
            )));
        }
        if !(MIN_BATCH_SIZE..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(CoreError::Validation(format!(
                "batch_size must be between {MIN_BATCH_SIZE} and {MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if let Some(v) = value {
                if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&v) {
                    return Err(CoreError::Validation(format!(
                        "{name} must be between {MIN_DIMENSION} and {MAX_DIMENSION}, got {v}"
                    )));
                }
            }
        }
        if self.aspect_ratio == AspectRatio::Custom
            && (self.width.is_none() || self.height.is_none())
        {
            return Err(CoreError::Validation(
                "aspect_ratio \"custom\" (and any unrecognized ratio) requires explicit width and height"
                    .to_string(),
            ));
        }

        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Dimension resolution
// ---------------------------------------------------------------------------

/// Resolve the final pixel dimensions for a validated request.
///
/// Predefined ratios use the fixed lookup table; `custom` uses the
/// caller-supplied width/height. Both axes are snapped down to the
/// nearest multiple of 64 (FLUX.1 requirement), floored at 64.
pub fn resolve_dimensions(request: &ImageRequest) -> (u32, u32) {
    let (w, h) = match request.aspect_ratio.dimensions() {
        Some(dims) => dims,
        // validate() guarantees both are present for Custom.
        None => (
            request.width.unwrap_or(MIN_DIMENSION),
            request.height.unwrap_or(MIN_DIMENSION),
        ),
    };
    (snap_dimension(w), snap_dimension(h))
}

fn snap_dimension(v: u32) -> u32 {
    ((v / DIMENSION_MULTIPLE) * DIMENSION_MULTIPLE).max(DIMENSION_MULTIPLE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> ImageRequest {
        serde_json::from_value(serde_json::json!({ "prompt": prompt })).unwrap()
    }

    // -- prompt bounds --------------------------------------------------------

    #[test]
    fn prompt_of_two_chars_rejected() {
        assert!(request("ab").validate().is_err());
    }

    #[test]
    fn prompt_of_three_chars_accepted() {
        assert!(request("abc").validate().is_ok());
    }

    #[test]
    fn whitespace_only_prompt_rejected() {
        assert!(request("   \t  ").validate().is_err());
    }

    #[test]
    fn prompt_is_trimmed() {
        let validated = request("  a red apple  ").validate().unwrap();
        assert_eq!(validated.prompt, "a red apple");
    }

    #[test]
    fn over_long_prompt_rejected() {
        let long = "x".repeat(MAX_PROMPT_LEN + 1);
        assert!(request(&long).validate().is_err());
    }

    // -- numeric ranges -------------------------------------------------------

    #[test]
    fn zero_steps_rejected() {
        let mut req = request("abc");
        req.steps = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn steps_above_max_rejected() {
        let mut req = request("abc");
        req.steps = MAX_STEPS + 1;
        assert!(req.validate().is_err());
    }

    #[test]
    fn guidance_out_of_range_rejected() {
        let mut req = request("abc");
        req.guidance_scale = 20.5;
        assert!(req.validate().is_err());
    }

    #[test]
    fn batch_size_of_five_rejected() {
        let mut req = request("abc");
        req.batch_size = 5;
        assert!(req.validate().is_err());
    }

    // -- aspect ratio / dimensions --------------------------------------------

    #[test]
    fn unknown_aspect_ratio_falls_back_to_custom() {
        assert_eq!(AspectRatio::from_token("2:3"), AspectRatio::Custom);
        assert_eq!(AspectRatio::from_token("banana"), AspectRatio::Custom);
        assert_eq!(AspectRatio::from_token("16:9"), AspectRatio::Landscape);
    }

    #[test]
    fn unknown_aspect_ratio_without_dimensions_rejected_in_validation() {
        let req: ImageRequest = serde_json::from_value(serde_json::json!({
            "prompt": "abc",
            "aspect_ratio": "2:3",
        }))
        .unwrap();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("width and height"), "{err}");
    }

    #[test]
    fn unknown_aspect_ratio_with_dimensions_accepted() {
        let req: ImageRequest = serde_json::from_value(serde_json::json!({
            "prompt": "abc",
            "aspect_ratio": "2:3",
            "width": 1024,
            "height": 768,
        }))
        .unwrap();
        let validated = req.validate().unwrap();
        assert_eq!(validated.aspect_ratio, AspectRatio::Custom);
        assert_eq!(resolve_dimensions(&validated), (1024, 768));
    }

    #[test]
    fn custom_without_dimensions_rejected() {
        let req: ImageRequest = serde_json::from_value(serde_json::json!({
            "prompt": "abc",
            "aspect_ratio": "custom",
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn custom_with_dimensions_accepted() {
        let req: ImageRequest = serde_json::from_value(serde_json::json!({
            "prompt": "abc",
            "aspect_ratio": "custom",
            "width": 1024,
            "height": 768,
        }))
        .unwrap();
        let validated = req.validate().unwrap();
        assert_eq!(resolve_dimensions(&validated), (1024, 768));
    }

    #[test]
    fn custom_dimensions_snap_to_multiple_of_64() {
        let req: ImageRequest = serde_json::from_value(serde_json::json!({
            "prompt": "abc",
            "aspect_ratio": "custom",
            "width": 1000,
            "height": 700,
        }))
        .unwrap();
        let validated = req.validate().unwrap();
        assert_eq!(resolve_dimensions(&validated), (960, 640));
    }

    #[test]
    fn oversized_custom_dimension_rejected() {
        let req: ImageRequest = serde_json::from_value(serde_json::json!({
            "prompt": "abc",
            "aspect_ratio": "custom",
            "width": 8192,
            "height": 768,
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn predefined_ratios_resolve_from_table() {
        for (ratio, expected) in [
            ("1:1", (2048, 2048)),
            ("16:9", (3840, 2160)),
            ("9:16", (2160, 3840)),
            ("4:3", (2560, 1920)),
            ("21:9", (3840, 1600)),
        ] {
            let req: ImageRequest = serde_json::from_value(serde_json::json!({
                "prompt": "abc",
                "aspect_ratio": ratio,
            }))
            .unwrap();
            assert_eq!(resolve_dimensions(&req.validate().unwrap()), expected);
        }
    }

    // -- defaults -------------------------------------------------------------

    #[test]
    fn defaults_match_documented_values() {
        let req = request("abc").validate().unwrap();
        assert_eq!(req.steps, 8);
        assert_eq!(req.guidance_scale, 4.0);
        assert_eq!(req.batch_size, 1);
        assert_eq!(req.aspect_ratio, AspectRatio::Square);
        assert_eq!(req.negative_prompt, DEFAULT_NEGATIVE_PROMPT);
        assert_eq!(req.output_format, ImageFormat::Png);
        assert!(req.seed.is_none());
    }

    #[test]
    fn description_alias_accepted() {
        let req: ImageRequest = serde_json::from_value(serde_json::json!({
            "description": "a red apple on a white table",
        }))
        .unwrap();
        assert_eq!(req.prompt, "a red apple on a white table");
    }
}
