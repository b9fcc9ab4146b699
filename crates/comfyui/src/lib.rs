//! ComfyUI REST client library.
//!
//! Provides the FLUX.1 workflow (job spec) builder, HTTP wrappers for
//! the ComfyUI API surface (`/prompt`, `/history`, `/view`,
//! `/system_stats`, `/object_info`), and typed history parsing. The
//! orchestration layer drives this client through the
//! [`mediagen_core::job::GenerationBackend`] trait.

pub mod api;
pub mod history;
pub mod workflow;

pub use api::{ComfyUIApiError, ComfyUIClient};
pub use workflow::ImageJobSpec;
