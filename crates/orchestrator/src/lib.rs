//! Generation job orchestration.
//!
//! Turns a validated request into a backend job spec, serializes
//! access to the single-capacity compute resource, submits and polls
//! the job to a terminal state within a bounded budget, and assembles
//! the heterogeneous backend output into the stable result contract.
//!
//! Control flow per request: build job spec -> acquire capacity ->
//! submit -> poll -> assemble result -> release capacity -> dispatch
//! webhook.

pub mod audio;
pub mod capacity;
pub mod config;
pub mod image;
pub mod loudness;
pub mod poller;
pub mod webhook;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use mediagen_chatterbox::ChatterboxClient;
use mediagen_comfyui::ComfyUIClient;

use crate::capacity::CapacityGate;
use crate::config::OrchestratorConfig;
use crate::webhook::WebhookDispatcher;

/// Shared orchestration state, created once at startup.
///
/// Cheaply cloneable behind an `Arc`; handlers call
/// [`image::generate_image`] and [`audio::generate_audio`] through it.
pub struct Orchestrator {
    pub config: Arc<OrchestratorConfig>,
    /// Single-slot gate guarding the shared GPU.
    pub gate: CapacityGate,
    pub comfyui: ComfyUIClient,
    pub chatterbox: ChatterboxClient,
    pub webhook: WebhookDispatcher,
    /// Triggered on shutdown; in-flight poll loops stop at the next
    /// probe boundary.
    pub shutdown: CancellationToken,
}

impl Orchestrator {
    pub fn new(config: Arc<OrchestratorConfig>) -> Arc<Self> {
        let comfyui = ComfyUIClient::new(config.comfyui_url.clone(), config.call_timeout);
        let chatterbox = ChatterboxClient::new(config.chatterbox_url.clone(), config.call_timeout);
        let gate = CapacityGate::new(config.admission_timeout);
        let webhook = WebhookDispatcher::new(config.webhook_url.clone());

        Arc::new(Self {
            config,
            gate,
            comfyui,
            chatterbox,
            webhook,
            shutdown: CancellationToken::new(),
        })
    }
}
