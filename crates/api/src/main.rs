use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediagen_api::config::ServerConfig;
use mediagen_api::router::build_app_router;
use mediagen_api::state::AppState;
use mediagen_orchestrator::config::OrchestratorConfig;
use mediagen_orchestrator::Orchestrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediagen=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let server_config = ServerConfig::from_env();
    let orchestrator_config = Arc::new(OrchestratorConfig::from_env());
    tracing::info!(
        comfyui = %orchestrator_config.comfyui_url,
        chatterbox = %orchestrator_config.chatterbox_url,
        checkpoint = %orchestrator_config.checkpoint,
        job_timeout_secs = orchestrator_config.job_timeout.as_secs(),
        "Loaded orchestration configuration"
    );

    // --- Orchestrator ---
    let orchestrator = Orchestrator::new(orchestrator_config);
    let state = AppState {
        orchestrator: Arc::clone(&orchestrator),
    };

    let app = build_app_router(state, &server_config);

    let addr = SocketAddr::new(
        server_config
            .host
            .parse()
            .expect("MEDIAGEN_HOST must be a valid IP address"),
        server_config.port,
    );
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(orchestrator))
        .await
        .expect("Server error");
}

/// Resolve on Ctrl-C, stopping in-flight poll loops first so their
/// requests answer with a terminal result before the listener closes.
async fn shutdown_signal(orchestrator: Arc<Orchestrator>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
    orchestrator.shutdown.cancel();
}
