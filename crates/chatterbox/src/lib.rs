//! Chatterbox TTS REST client library.
//!
//! The speech backend loads one multilingual TTS model on one GPU and
//! exposes a narrow job surface: submit a synthesis job, poll its
//! status, download the produced WAV. This crate wraps that surface
//! and the speech job spec; the orchestration layer drives it through
//! [`mediagen_core::job::GenerationBackend`].

pub mod api;
pub mod spec;

pub use api::{ChatterboxApiError, ChatterboxClient};
pub use spec::SpeechJobSpec;
