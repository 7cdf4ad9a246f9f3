use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{error::WorkflowError, CaptureDevice};

/// A captured photo awaiting upload or discard. Owns its bytes, so releasing
/// the artifact frees the buffer immediately instead of waiting on any
/// host-side cleanup.
#[derive(Debug)]
pub struct PhotoArtifact {
    pub local_ref: String,
    pub bytes: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl PhotoArtifact {
    pub fn new(local_ref: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            local_ref: local_ref.into(),
            bytes,
            captured_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Inactive,
    Armed,
    Captured,
}

impl CaptureState {
    pub(crate) fn name(self) -> &'static str {
        match self {
            CaptureState::Inactive => "inactive",
            CaptureState::Armed => "armed",
            CaptureState::Captured => "captured",
        }
    }
}

/// Lifecycle of one photo acquisition: `Inactive -> Armed -> Captured`,
/// with `retake` looping back to `Armed` and `discard` returning to
/// `Inactive`. Holds at most one live artifact at a time.
pub struct CaptureSession {
    device: Arc<dyn CaptureDevice>,
    state: CaptureState,
    artifact: Option<Arc<PhotoArtifact>>,
}

impl CaptureSession {
    pub fn new(device: Arc<dyn CaptureDevice>) -> Self {
        Self {
            device,
            state: CaptureState::Inactive,
            artifact: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn artifact(&self) -> Option<&Arc<PhotoArtifact>> {
        self.artifact.as_ref()
    }

    /// Requests camera activation. Permission acquisition is an external
    /// collaborator invoked before this call; only the prior grant is
    /// checked here.
    pub fn arm(&mut self) -> Result<(), WorkflowError> {
        if !self.device.is_available() {
            return Err(WorkflowError::DeviceUnavailable);
        }
        if !self.device.permission_granted() {
            return Err(WorkflowError::PermissionDenied);
        }
        self.state = CaptureState::Armed;
        debug!("capture device armed");
        Ok(())
    }

    /// Takes a photo. On device failure the session stays `Armed` and any
    /// previous artifact is untouched.
    pub async fn capture(&mut self) -> Result<(), WorkflowError> {
        if self.state != CaptureState::Armed {
            return Err(WorkflowError::InvalidPhase {
                operation: "capture",
                phase: self.state.name(),
            });
        }

        let artifact = match self.device.take_photo().await {
            Ok(artifact) => artifact,
            Err(err) => {
                warn!(error = %err, "device-level capture failure");
                return Err(WorkflowError::CaptureFailed(err.to_string()));
            }
        };

        info!(
            local_ref = %artifact.local_ref,
            bytes = artifact.bytes.len(),
            "photo captured"
        );
        self.release();
        self.artifact = Some(Arc::new(artifact));
        self.state = CaptureState::Captured;
        Ok(())
    }

    /// Releases the current artifact and re-arms for another shot.
    pub fn retake(&mut self) -> Result<(), WorkflowError> {
        if self.state != CaptureState::Captured {
            return Err(WorkflowError::InvalidPhase {
                operation: "retake",
                phase: self.state.name(),
            });
        }
        self.release();
        self.state = CaptureState::Armed;
        Ok(())
    }

    /// Releases any artifact and deactivates the camera.
    pub fn discard(&mut self) -> Result<(), WorkflowError> {
        match self.state {
            CaptureState::Armed | CaptureState::Captured => {
                self.release();
                self.state = CaptureState::Inactive;
                Ok(())
            }
            CaptureState::Inactive => Err(WorkflowError::InvalidPhase {
                operation: "discard",
                phase: self.state.name(),
            }),
        }
    }

    fn release(&mut self) {
        if let Some(artifact) = self.artifact.take() {
            debug!(local_ref = %artifact.local_ref, "photo artifact released");
        }
    }
}
