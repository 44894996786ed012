//! Phase failure sinks

use crate::error::PhaseFailure;
use crate::phase::CheckPhase;
use parking_lot::Mutex;

/// Receiver of phase failures
pub trait ErrorSink: Send + Sync {
    /// Report one failure
    fn report(&self, failure: PhaseFailure);
}

/// Logs failures at `warn`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, failure: PhaseFailure) {
        tracing::warn!(
            check = %failure.check,
            phase = %failure.phase,
            "{}",
            failure
        );
    }
}

/// Keeps failures for later inspection
#[derive(Debug, Default)]
pub struct CollectingSink {
    failures: Mutex<Vec<PhaseFailure>>,
}

impl CollectingSink {
    /// Create empty sink
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of reported failures
    #[must_use]
    pub fn failures(&self) -> Vec<PhaseFailure> {
        self.failures.lock().clone()
    }

    /// Phases that failed, in report order
    #[must_use]
    pub fn phases(&self) -> Vec<CheckPhase> {
        self.failures.lock().iter().map(|f| f.phase).collect()
    }

    /// Drain reported failures
    pub fn take(&self) -> Vec<PhaseFailure> {
        std::mem::take(&mut *self.failures.lock())
    }
}

impl ErrorSink for CollectingSink {
    fn report(&self, failure: PhaseFailure) {
        tracing::debug!("collected {}", failure);
        self.failures.lock().push(failure);
    }
}
