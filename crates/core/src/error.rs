use std::time::Duration;

/// Domain-level error taxonomy for the orchestration layer.
///
/// Every failure a generation request can hit maps onto exactly one of
/// these classes; the result assembler turns them into the
/// caller-facing `success: false` contract and never leaks backend
/// status vocabulary.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The request is malformed or out of range. Caller-fixable,
    /// never retried.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The capacity gate could not admit the job within the admission
    /// timeout. Caller should retry later.
    #[error("Backend is busy: no generation slot became available within {}s", .0.as_secs())]
    Overloaded(Duration),

    /// The backend process did not answer (connection refused, per-call
    /// timeout, malformed response). Transient; the poller retries a
    /// bounded number of times before giving up.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend reported a terminal failure for the job.
    #[error("Backend error: {0}")]
    BackendError(String),

    /// The overall job budget elapsed before the backend reached a
    /// terminal status. Classified client-side; the backend job is not
    /// cancelled.
    #[error("Timeout: job did not complete within {}s", .0.as_secs())]
    Timeout(Duration),

    /// An unexpected local failure (filesystem, encoding).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable cause-class token used in caller-facing error messages.
    pub fn cause_class(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "validation",
            CoreError::Overloaded(_) => "overloaded",
            CoreError::BackendUnavailable(_) => "backend-unavailable",
            CoreError::BackendError(_) => "backend-error",
            CoreError::Timeout(_) => "timeout",
            CoreError::Internal(_) => "internal",
        }
    }
}
