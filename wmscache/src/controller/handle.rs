//! Handle to the background fetch-and-reduce pipeline.

use crate::fetch::FetchReport;
use crate::mip::{MipError, MipReport};
use std::fmt;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Stage the pipeline is in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelinePhase {
    /// Retrieving the finest level.
    #[default]
    Fetching,

    /// Building coarser levels.
    Reducing,

    /// Every level is built.
    Completed,

    /// Some finest-level tiles were abandoned; coarser levels were not built.
    Incomplete,

    /// Stopped on request.
    Cancelled,

    /// Mip construction failed.
    Failed,
}

impl PipelinePhase {
    /// Returns true once the pipeline has stopped.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Fetching | Self::Reducing)
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching => write!(f, "Fetching"),
            Self::Reducing => write!(f, "Reducing"),
            Self::Completed => write!(f, "Completed"),
            Self::Incomplete => write!(f, "Incomplete"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// What the pipeline did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
    pub fetch: FetchReport,
    /// `None` when reduction did not run
    pub mip: Option<MipReport>,
}

/// Pipeline failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Mip construction stopped on a load or store failure; the finest
    /// level remains usable.
    #[error("mip construction failed: {source}")]
    Reduction {
        fetch: FetchReport,
        #[source]
        source: MipError,
    },

    #[error("pipeline task panicked: {0}")]
    TaskPanicked(String),
}

/// Handle returned by [`CacheController::start`](super::CacheController::start).
pub struct PipelineHandle {
    phase_rx: watch::Receiver<PipelinePhase>,
    cancel: CancellationToken,
    task: JoinHandle<Result<PipelineReport, PipelineError>>,
}

impl PipelineHandle {
    pub(crate) fn new(
        phase_rx: watch::Receiver<PipelinePhase>,
        cancel: CancellationToken,
        task: JoinHandle<Result<PipelineReport, PipelineError>>,
    ) -> Self {
        Self {
            phase_rx,
            cancel,
            task,
        }
    }

    /// Current phase, without waiting.
    pub fn phase(&self) -> PipelinePhase {
        *self.phase_rx.borrow()
    }

    /// Receiver notified on every phase change.
    pub fn subscribe(&self) -> watch::Receiver<PipelinePhase> {
        self.phase_rx.clone()
    }

    /// Request cancellation. In-flight requests finish their current attempt.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the pipeline to stop.
    pub async fn wait(self) -> Result<PipelineReport, PipelineError> {
        match self.task.await {
            Ok(result) => result,
            Err(join_err) => Err(PipelineError::TaskPanicked(join_err.to_string())),
        }
    }
}

impl fmt::Debug for PipelineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineHandle")
            .field("phase", &self.phase())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(!PipelinePhase::Fetching.is_terminal());
        assert!(!PipelinePhase::Reducing.is_terminal());
        assert!(PipelinePhase::Completed.is_terminal());
        assert!(PipelinePhase::Incomplete.is_terminal());
        assert!(PipelinePhase::Cancelled.is_terminal());
        assert!(PipelinePhase::Failed.is_terminal());
    }

    async fn explode() -> Result<PipelineReport, PipelineError> {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_panicked_task_is_reported() {
        let (_tx, rx) = watch::channel(PipelinePhase::Fetching);
        let task = tokio::spawn(explode());
        let handle = PipelineHandle::new(rx, CancellationToken::new(), task);

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, PipelineError::TaskPanicked(_)));
    }
}
