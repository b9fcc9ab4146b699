//! Job status machine, job handles, and the backend contract.
//!
//! A generation job is an explicit finite-state object: submitted once,
//! polled until terminal. Backends only ever report forward progress;
//! `TimedOut` is a client-side classification that the backend never
//! reports itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status machine
// ---------------------------------------------------------------------------

/// Lifecycle states of one generation job.
///
/// Transitions are forward-only:
/// `Queued -> Running -> {Succeeded, Failed}`, with `TimedOut`
/// reachable from any non-terminal state when the client-side budget
/// elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobStatus {
    /// Whether no further transitions can occur from this state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::TimedOut
        )
    }

    /// Whether moving from `self` to `next` is a legal forward
    /// transition. Self-transitions are allowed (poll observed no
    /// change); backward transitions are not.
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (a, b) if a == b => true,
            (Queued, Running | Succeeded | Failed | TimedOut) => true,
            (Running, Succeeded | Failed | TimedOut) => true,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Handles and probes
// ---------------------------------------------------------------------------

/// Opaque backend-issued identifier for one submitted job.
///
/// Created on submit, consulted by the poll loop, discarded once a
/// terminal result is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Backend-assigned job identifier (e.g. a ComfyUI prompt id).
    pub id: String,
    /// When the job was accepted by the backend.
    pub submitted_at: DateTime<Utc>,
}

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// Snapshot of a job's state as reported by one status query.
#[derive(Debug, Clone)]
pub struct JobProbe {
    pub status: JobStatus,
    /// Artifact filenames produced so far; populated on `Succeeded`.
    pub outputs: Vec<String>,
    /// Backend-reported failure detail; populated on `Failed`.
    pub error: Option<String>,
}

impl JobProbe {
    /// A probe for a job the backend still has queued.
    pub fn queued() -> Self {
        Self {
            status: JobStatus::Queued,
            outputs: Vec::new(),
            error: None,
        }
    }

    pub fn running() -> Self {
        Self {
            status: JobStatus::Running,
            outputs: Vec::new(),
            error: None,
        }
    }

    pub fn succeeded(outputs: Vec<String>) -> Self {
        Self {
            status: JobStatus::Succeeded,
            outputs,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            outputs: Vec::new(),
            error: Some(error.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Backend contract
// ---------------------------------------------------------------------------

/// A generative backend reachable over a narrow HTTP surface.
///
/// Implementations translate a job spec into the backend's wire format
/// and a handle into a status query. They must not retry network
/// failures internally — a missing or malformed response surfaces as
/// [`CoreError::BackendUnavailable`] and the poll loop owns the retry
/// policy.
#[async_trait::async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Fully resolved, backend-specific job description.
    type Spec: Send + Sync;

    /// Backend name for logging ("comfyui", "chatterbox").
    fn name(&self) -> &'static str;

    /// Submit a job spec; returns the backend-issued handle.
    async fn submit(&self, spec: &Self::Spec) -> Result<JobHandle, CoreError>;

    /// Query the current status of a submitted job.
    async fn query_status(&self, handle: &JobHandle) -> Result<JobProbe, CoreError>;
}

// ---------------------------------------------------------------------------
// Seed resolution
// ---------------------------------------------------------------------------

/// Resolve a caller-supplied seed, drawing a fresh random one when
/// absent. The resolved value is recorded in the job spec and echoed
/// unchanged in the final result.
pub fn resolve_seed(requested: Option<u32>) -> u32 {
    requested.unwrap_or_else(|| rand::random::<u32>())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- status machine -------------------------------------------------------

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::TimedOut.is_terminal());
    }

    #[test]
    fn forward_transitions_allowed() {
        assert!(JobStatus::Queued.can_advance_to(JobStatus::Running));
        assert!(JobStatus::Running.can_advance_to(JobStatus::Succeeded));
        assert!(JobStatus::Queued.can_advance_to(JobStatus::TimedOut));
        assert!(JobStatus::Running.can_advance_to(JobStatus::Running));
    }

    #[test]
    fn backward_transitions_rejected() {
        assert!(!JobStatus::Running.can_advance_to(JobStatus::Queued));
        assert!(!JobStatus::Succeeded.can_advance_to(JobStatus::Running));
        assert!(!JobStatus::Failed.can_advance_to(JobStatus::Succeeded));
        assert!(!JobStatus::TimedOut.can_advance_to(JobStatus::Running));
    }

    // -- seed resolution ------------------------------------------------------

    #[test]
    fn explicit_seed_is_preserved() {
        assert_eq!(resolve_seed(Some(42)), 42);
        assert_eq!(resolve_seed(Some(0)), 0);
        assert_eq!(resolve_seed(Some(u32::MAX)), u32::MAX);
    }

    #[test]
    fn missing_seed_draws_distinct_values() {
        // 16 draws all colliding is ~2^-480; treat any repeat run of
        // identical values as a failure.
        let draws: Vec<u32> = (0..16).map(|_| resolve_seed(None)).collect();
        let first = draws[0];
        assert!(
            draws.iter().any(|&s| s != first),
            "random seeds should not all be identical: {draws:?}"
        );
    }
}
