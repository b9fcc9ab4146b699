//! HTTP surface of the media generation service.
//!
//! Thin axum layer over the orchestration crate: parse and validate the
//! request, run the generation flow, serialize the result. All
//! generation semantics live in `mediagen-orchestrator`; this crate
//! owns only HTTP concerns (routing, middleware, status codes).

pub mod config;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;
