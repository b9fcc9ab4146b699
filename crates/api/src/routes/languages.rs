//! Supported synthesis languages, proxied from the speech backend.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct LanguagesResponse {
    languages: BTreeMap<String, String>,
    count: usize,
}

/// `GET /languages`
///
/// Falls back to English-only when the backend cannot be queried, so
/// callers can always enumerate something.
async fn list_languages(State(state): State<AppState>) -> Json<LanguagesResponse> {
    let languages = state.orchestrator.chatterbox.supported_languages().await;
    let count = languages.len();
    Json(LanguagesResponse { languages, count })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/languages", get(list_languages))
}
