//! FLUX.1 job spec construction.
//!
//! An [`ImageJobSpec`] is the fully resolved description of one image
//! generation task: explicit pixel dimensions, a concrete seed, and
//! the checkpoint to load. Building the ComfyUI workflow graph from it
//! is deterministic — identical spec, identical JSON.

use mediagen_core::image::{resolve_dimensions, ImageFormat, ImageRequest};

/// Filename prefix ComfyUI applies to saved outputs.
pub const OUTPUT_FILENAME_PREFIX: &str = "flux_mediagen";

/// Fully resolved description of one image generation job.
///
/// Owned by the backend client during submission; never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageJobSpec {
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub guidance: f64,
    pub seed: u32,
    /// Checkpoint filename in ComfyUI's `models/checkpoints/`.
    pub checkpoint: String,
    pub output_format: ImageFormat,
}

impl ImageJobSpec {
    /// Resolve a validated request into a job spec.
    ///
    /// `seed` must already be resolved (explicit or freshly drawn) so
    /// that the mapping stays deterministic and the seed can be echoed
    /// in the final result.
    pub fn from_request(request: &ImageRequest, checkpoint: &str, seed: u32) -> Self {
        let (width, height) = resolve_dimensions(request);
        Self {
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            width,
            height,
            steps: request.steps,
            guidance: request.guidance_scale,
            seed,
            checkpoint: checkpoint.to_string(),
            output_format: request.output_format,
        }
    }

    /// Build the ComfyUI workflow graph for FLUX.1 schnell/dev.
    ///
    /// FLUX.1 uses a FluxGuidance node instead of classic CFG, so the
    /// KSampler runs with `cfg = 1.0` and the guidance value feeds the
    /// conditioning. Compatible with `flux1-schnell-fp8.safetensors`
    /// and `flux1-dev.safetensors`.
    pub fn workflow_json(&self) -> serde_json::Value {
        serde_json::json!({
            "1": {
                "class_type": "CheckpointLoaderSimple",
                "inputs": { "ckpt_name": self.checkpoint },
            },
            "2": {
                "class_type": "CLIPTextEncode",
                "inputs": {
                    "text": self.prompt,
                    "clip": ["1", 1],
                },
            },
            "3": {
                "class_type": "CLIPTextEncode",
                "inputs": {
                    "text": self.negative_prompt,
                    "clip": ["1", 1],
                },
            },
            "4": {
                "class_type": "EmptyLatentImage",
                "inputs": {
                    "width": self.width,
                    "height": self.height,
                    "batch_size": 1,
                },
            },
            "5": {
                "class_type": "FluxGuidance",
                "inputs": {
                    "conditioning": ["2", 0],
                    "guidance": self.guidance,
                },
            },
            "6": {
                "class_type": "KSampler",
                "inputs": {
                    "model": ["1", 0],
                    "positive": ["5", 0],
                    "negative": ["3", 0],
                    "latent_image": ["4", 0],
                    "seed": self.seed,
                    "steps": self.steps,
                    "cfg": 1.0,
                    "sampler_name": "euler",
                    "scheduler": "simple",
                    "denoise": 1.0,
                },
            },
            "7": {
                "class_type": "VAEDecode",
                "inputs": {
                    "samples": ["6", 0],
                    "vae": ["1", 2],
                },
            },
            "8": {
                "class_type": "SaveImage",
                "inputs": {
                    "images": ["7", 0],
                    "filename_prefix": OUTPUT_FILENAME_PREFIX,
                },
            },
        })
    }
}
