//! Poll-until-terminal loop over a submitted generation job.
//!
//! The backend decouples submission from completion, so the job is an
//! explicit state object driven by repeated status queries: poll at a
//! bounded interval (growing with capped exponential backoff) until a
//! terminal backend status is observed or the overall budget elapses,
//! at which point the job is unilaterally classified `TimedOut` and
//! abandoned. Cancellation of the backend job is not assumed to be
//! supported and is never attempted.

use std::time::Duration;

use mediagen_core::job::{GenerationBackend, JobHandle, JobProbe, JobStatus};
use mediagen_core::error::CoreError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Tunable parameters for one poll loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay before the first probe and floor of the backoff curve.
    pub initial_interval: Duration,
    /// Upper bound on the delay between probes.
    pub max_interval: Duration,
    /// Factor by which the delay grows after each probe.
    pub multiplier: f64,
    /// Consecutive unavailable probes tolerated before the job is
    /// escalated to `Failed`.
    pub max_transient_failures: u32,
    /// Total elapsed-time budget for the job.
    pub budget: Duration,
}

impl PollConfig {
    pub fn with_budget(budget: Duration) -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            multiplier: 2.0,
            max_transient_failures: 3,
            budget,
        }
    }
}

/// Terminal outcome of one poll loop.
#[derive(Debug)]
pub enum PollOutcome {
    /// The backend reported success; the probe carries the artifacts.
    Succeeded(JobProbe),
    /// The backend reported a terminal failure, or became unreachable
    /// beyond the transient tolerance.
    Failed(String),
    /// The budget elapsed without a terminal status. The backend job
    /// is abandoned, not cancelled.
    TimedOut,
    /// The caller went away before the job finished.
    Cancelled,
}

/// Calculate the next backoff delay, clamped to the configured cap.
pub fn next_interval(current: Duration, config: &PollConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_interval)
}

/// Drive a submitted job to a terminal outcome.
///
/// Every observed status transition is logged; the loop never skips a
/// status silently. Transient unavailability resets on any successful
/// probe.
pub async fn poll_until_terminal<B: GenerationBackend>(
    backend: &B,
    handle: &JobHandle,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> PollOutcome {
    let started = Instant::now();
    let mut interval = config.initial_interval;
    let mut transient_failures = 0u32;
    let mut last_status = JobStatus::Queued;

    loop {
        let Some(remaining) = config.budget.checked_sub(started.elapsed()) else {
            tracing::warn!(
                backend = backend.name(),
                job_id = %handle.id,
                budget_secs = config.budget.as_secs(),
                "Job exceeded its budget, classifying as timed out"
            );
            return PollOutcome::TimedOut;
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(
                    backend = backend.name(),
                    job_id = %handle.id,
                    "Poll loop cancelled before terminal status"
                );
                return PollOutcome::Cancelled;
            }
            _ = tokio::time::sleep(interval.min(remaining)) => {}
        }

        if started.elapsed() >= config.budget {
            tracing::warn!(
                backend = backend.name(),
                job_id = %handle.id,
                budget_secs = config.budget.as_secs(),
                "Job exceeded its budget, classifying as timed out"
            );
            return PollOutcome::TimedOut;
        }

        match backend.query_status(handle).await {
            Ok(probe) => {
                transient_failures = 0;
                observe_transition(backend.name(), handle, last_status, probe.status);
                last_status = probe.status;

                match probe.status {
                    JobStatus::Succeeded => return PollOutcome::Succeeded(probe),
                    JobStatus::Failed => {
                        return PollOutcome::Failed(
                            probe
                                .error
                                .unwrap_or_else(|| "backend reported failure".to_string()),
                        )
                    }
                    // Backends never report TimedOut; that state is
                    // client-side only.
                    JobStatus::Queued | JobStatus::Running | JobStatus::TimedOut => {}
                }
            }
            Err(CoreError::BackendUnavailable(msg)) => {
                transient_failures += 1;
                tracing::warn!(
                    backend = backend.name(),
                    job_id = %handle.id,
                    attempt = transient_failures,
                    tolerated = config.max_transient_failures,
                    error = %msg,
                    "Backend unavailable during polling"
                );
                if transient_failures > config.max_transient_failures {
                    return PollOutcome::Failed(format!(
                        "backend unavailable for {transient_failures} consecutive probes: {msg}"
                    ));
                }
            }
            Err(e) => return PollOutcome::Failed(e.to_string()),
        }

        interval = next_interval(interval, config);
    }
}

fn observe_transition(backend: &str, handle: &JobHandle, from: JobStatus, to: JobStatus) {
    if from == to {
        return;
    }
    if !from.can_advance_to(to) {
        tracing::warn!(
            backend,
            job_id = %handle.id,
            ?from,
            ?to,
            "Backend reported a backward status transition"
        );
        return;
    }
    tracing::info!(backend, job_id = %handle.id, ?from, ?to, "Job status transition");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
