use shared::domain::StudentId;
use thiserror::Error;

/// Everything the workflow can fail with. All variants are recoverable at
/// the orchestrator boundary; none aborts the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("no capture device is available on this host")]
    DeviceUnavailable,
    #[error("camera permission has not been granted")]
    PermissionDenied,
    #[error("photo capture failed: {0}")]
    CaptureFailed(String),
    #[error("an upload is already in flight for this session")]
    JobInProgress,
    #[error("unknown student id {0}")]
    NotFound(StudentId),
    #[error("no attendance has been marked for this round")]
    NothingToSubmit,
    #[error("cannot {operation} while the session is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: &'static str,
    },
    #[error("session was discarded before the upload response arrived")]
    SessionDiscarded,
}
