//! Typed interpretation of ComfyUI `/history/{prompt_id}` responses.
//!
//! The history endpoint keys entries by prompt id. A job that has not
//! appeared yet is still queued or executing; an entry with an error
//! status is a terminal failure; an entry with saved output images is
//! a success.

use mediagen_core::job::{JobProbe, JobStatus};

/// Interpret one history response for the given prompt id.
pub fn probe_from_history(history: &serde_json::Value, prompt_id: &str) -> JobProbe {
    let Some(entry) = history.get(prompt_id) else {
        // Not in history yet: still queued (or mid-execution; ComfyUI
        // only writes the entry once the prompt leaves the queue).
        return JobProbe::queued();
    };

    if let Some(error) = status_error(entry) {
        return JobProbe::failed(error);
    }

    let filenames = extract_output_filenames(entry);
    if filenames.is_empty() {
        // Entry exists but no saved outputs yet.
        JobProbe::running()
    } else {
        JobProbe::succeeded(filenames)
    }
}

/// Pull a terminal error message out of a history entry, if any.
///
/// ComfyUI reports failures either as an `error` key or as
/// `status_str == "error"` with accompanying messages.
fn status_error(entry: &serde_json::Value) -> Option<String> {
    let status = entry.get("status")?;

    if let Some(error) = status.get("error") {
        return Some(render_error(error));
    }
    if status.get("status_str").and_then(|s| s.as_str()) == Some("error") {
        let detail = status
            .get("messages")
            .map(render_error)
            .unwrap_or_else(|| "unknown error".to_string());
        return Some(detail);
    }
    None
}

fn render_error(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}

/// Collect saved output image filenames from a history entry.
///
/// Only images of `type == "output"` count; previews and temp files
/// are skipped.
fn extract_output_filenames(entry: &serde_json::Value) -> Vec<String> {
    let mut filenames = Vec::new();
    let Some(outputs) = entry.get("outputs").and_then(|o| o.as_object()) else {
        return filenames;
    };
    for node_output in outputs.values() {
        let Some(images) = node_output.get("images").and_then(|i| i.as_array()) else {
            continue;
        };
        for img in images {
            if img.get("type").and_then(|t| t.as_str()) == Some("output") {
                if let Some(name) = img.get("filename").and_then(|f| f.as_str()) {
                    filenames.push(name.to_string());
                }
            }
        }
    }
    filenames
}
