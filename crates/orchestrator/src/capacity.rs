//! Admission control for the single-capacity backend resource.
//!
//! The generative backends hold one model in limited GPU memory and
//! cannot safely interleave two jobs, so the gate hands out exactly
//! one [`CapacityToken`] at a time. Waiters queue FIFO (tokio's
//! semaphore is fair) and give up with `Overloaded` once the admission
//! timeout elapses.

use std::sync::Arc;
use std::time::Duration;

use mediagen_core::error::CoreError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Single-slot FIFO gate in front of the shared compute resource.
pub struct CapacityGate {
    semaphore: Arc<Semaphore>,
    admission_timeout: Duration,
}

/// Exclusive right to run one job on the backend.
///
/// Held for the submit-to-terminal window of exactly one job and
/// released when dropped, on every exit path including errors and
/// timeouts.
#[derive(Debug)]
pub struct CapacityToken {
    _permit: OwnedSemaphorePermit,
}

impl CapacityGate {
    pub fn new(admission_timeout: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            admission_timeout,
        }
    }

    /// Wait for the generation slot.
    ///
    /// Suspends the caller until the slot frees up, or fails with
    /// [`CoreError::Overloaded`] once the admission timeout elapses.
    pub async fn acquire(&self) -> Result<CapacityToken, CoreError> {
        let acquired = tokio::time::timeout(
            self.admission_timeout,
            Arc::clone(&self.semaphore).acquire_owned(),
        )
        .await;

        match acquired {
            Ok(Ok(permit)) => Ok(CapacityToken { _permit: permit }),
            // The semaphore is never closed while the gate lives.
            Ok(Err(e)) => Err(CoreError::Internal(format!("capacity gate closed: {e}"))),
            Err(_) => Err(CoreError::Overloaded(self.admission_timeout)),
        }
    }

    /// Number of free slots (0 or 1); used by the health probe.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
