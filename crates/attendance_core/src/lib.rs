use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use shared::domain::{PermissionStatus, Person, StudentId};
use tokio::sync::Mutex;
use tracing::{info, warn};

pub mod capture;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod roster;
pub mod uploader;

pub use capture::{CaptureSession, CaptureState, PhotoArtifact};
pub use config::{load_settings, Settings};
pub use error::WorkflowError;
pub use reconcile::{AttendanceSummary, ReconciliationResult};
pub use roster::RosterStore;
pub use uploader::{PhotoUploader, UploadJobKind, UploadOutcome, UploadPayload};

/// Camera collaborator. Permission acquisition is driven by the presentation
/// layer ahead of arming; the session only checks the grant.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn request_permission(&self) -> anyhow::Result<PermissionStatus>;
    fn permission_granted(&self) -> bool;
    fn is_available(&self) -> bool;
    async fn take_photo(&self) -> anyhow::Result<PhotoArtifact>;
}

pub struct MissingCaptureDevice;

#[async_trait]
impl CaptureDevice for MissingCaptureDevice {
    async fn request_permission(&self) -> anyhow::Result<PermissionStatus> {
        Ok(PermissionStatus::Denied)
    }

    fn permission_granted(&self) -> bool {
        false
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn take_photo(&self) -> anyhow::Result<PhotoArtifact> {
        Err(anyhow!("no capture device on this host"))
    }
}

/// Supplies the bearer token for upload requests. Consumed read-only; token
/// acquisition and refresh live outside this crate.
pub trait AuthSession: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

pub struct MissingAuthSession;

impl AuthSession for MissingAuthSession {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

pub struct StaticAuthSession {
    token: String,
}

impl StaticAuthSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl AuthSession for StaticAuthSession {
    fn bearer_token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

/// The orchestrator's current phase. Render logic is a pure function of
/// this value; the presentation layer consumes nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Arming,
    Armed,
    Captured,
    Uploading,
    Reconciled,
}

impl SessionPhase {
    fn name(self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Arming => "arming",
            SessionPhase::Armed => "armed",
            SessionPhase::Captured => "captured",
            SessionPhase::Uploading => "uploading",
            SessionPhase::Reconciled => "reconciled",
        }
    }
}

struct SessionInner {
    roster: RosterStore,
    capture: CaptureSession,
    phase: SessionPhase,
    job_kind: Option<UploadJobKind>,
    upload_in_flight: bool,
    // Bumped on discard so a late upload response is recognized as stale.
    generation: u64,
}

/// Top-level state machine sequencing capture, upload, and reconciliation
/// for one attendance session. All mutation goes through the single inner
/// lock; the lock is released across the network round trip so a discard
/// can race a slow response.
pub struct AttendanceSession {
    uploader: PhotoUploader,
    inner: Mutex<SessionInner>,
}

impl AttendanceSession {
    pub fn new(
        roster: RosterStore,
        device: Arc<dyn CaptureDevice>,
        uploader: PhotoUploader,
    ) -> Arc<Self> {
        Arc::new(Self {
            uploader,
            inner: Mutex::new(SessionInner {
                roster,
                capture: CaptureSession::new(device),
                phase: SessionPhase::Idle,
                job_kind: None,
                upload_in_flight: false,
                generation: 0,
            }),
        })
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.phase
    }

    pub async fn roster_snapshot(&self) -> Vec<Person> {
        self.inner.lock().await.roster.people().to_vec()
    }

    /// Clears every presence flag ahead of a new attendance round.
    pub async fn begin_attendance_round(&self) {
        let mut guard = self.inner.lock().await;
        guard.roster.reset_presence();
        info!("attendance round started");
    }

    /// Arms the camera for a smart-capture flow. Registration targets are
    /// validated against the roster before any device interaction.
    pub async fn start_smart_capture(&self, kind: UploadJobKind) -> Result<(), WorkflowError> {
        let mut guard = self.inner.lock().await;
        if guard.upload_in_flight {
            return Err(WorkflowError::JobInProgress);
        }
        if guard.phase != SessionPhase::Idle {
            return Err(WorkflowError::InvalidPhase {
                operation: "start_smart_capture",
                phase: guard.phase.name(),
            });
        }
        if let UploadJobKind::Registration(student_id) = &kind {
            if guard.roster.get(student_id).is_none() {
                return Err(WorkflowError::NotFound(student_id.clone()));
            }
        }

        guard.phase = SessionPhase::Arming;
        match guard.capture.arm() {
            Ok(()) => {
                info!(job = kind.describe(), "smart capture armed");
                guard.job_kind = Some(kind);
                guard.phase = SessionPhase::Armed;
                Ok(())
            }
            Err(err) => {
                warn!(job = kind.describe(), error = %err, "failed to arm capture device");
                guard.phase = SessionPhase::Idle;
                Err(err)
            }
        }
    }

    /// Takes a photo. Device failure leaves the session armed for an
    /// immediate retry.
    pub async fn capture(&self) -> Result<(), WorkflowError> {
        let mut guard = self.inner.lock().await;
        if guard.phase != SessionPhase::Armed {
            return Err(WorkflowError::InvalidPhase {
                operation: "capture",
                phase: guard.phase.name(),
            });
        }
        guard.capture.capture().await?;
        guard.phase = SessionPhase::Captured;
        Ok(())
    }

    /// Releases the captured photo and returns to the armed camera.
    pub async fn retake(&self) -> Result<(), WorkflowError> {
        let mut guard = self.inner.lock().await;
        if guard.phase != SessionPhase::Captured {
            return Err(WorkflowError::InvalidPhase {
                operation: "retake",
                phase: guard.phase.name(),
            });
        }
        guard.capture.retake()?;
        guard.phase = SessionPhase::Armed;
        Ok(())
    }

    /// Abandons the capture flow: releases any artifact, returns to `Idle`,
    /// and invalidates any in-flight upload so its late response is dropped.
    /// Never touches the roster.
    pub async fn discard(&self) -> Result<(), WorkflowError> {
        let mut guard = self.inner.lock().await;
        match guard.phase {
            SessionPhase::Armed | SessionPhase::Captured | SessionPhase::Uploading => {
                guard.capture.discard()?;
                guard.phase = SessionPhase::Idle;
                guard.job_kind = None;
                guard.generation += 1;
                info!("capture session discarded");
                Ok(())
            }
            _ => Err(WorkflowError::InvalidPhase {
                operation: "discard",
                phase: guard.phase.name(),
            }),
        }
    }

    /// Submits the captured photo and reconciles the outcome. On success the
    /// artifact is released and the session reports the reconciliation; on a
    /// rejected or failed upload the artifact is retained so the operator
    /// can retry without recapturing.
    pub async fn confirm_upload(&self) -> Result<ReconciliationResult, WorkflowError> {
        let (artifact, kind, generation) = {
            let mut guard = self.inner.lock().await;
            if guard.upload_in_flight {
                return Err(WorkflowError::JobInProgress);
            }
            if guard.phase != SessionPhase::Captured {
                return Err(WorkflowError::InvalidPhase {
                    operation: "confirm_upload",
                    phase: guard.phase.name(),
                });
            }
            let Some(artifact) = guard.capture.artifact() else {
                return Err(WorkflowError::InvalidPhase {
                    operation: "confirm_upload",
                    phase: guard.capture.state().name(),
                });
            };
            let Some(kind) = guard.job_kind.clone() else {
                return Err(WorkflowError::InvalidPhase {
                    operation: "confirm_upload",
                    phase: guard.phase.name(),
                });
            };
            let artifact = Arc::clone(artifact);
            guard.upload_in_flight = true;
            guard.phase = SessionPhase::Uploading;
            (artifact, kind, guard.generation)
        };

        info!(job = kind.describe(), local_ref = %artifact.local_ref, "submitting capture");
        let outcome = self.uploader.submit(&artifact, &kind).await;
        drop(artifact);

        let mut guard = self.inner.lock().await;
        guard.upload_in_flight = false;
        if guard.generation != generation {
            warn!(job = kind.describe(), "dropping upload response for a discarded session");
            return Err(WorkflowError::SessionDiscarded);
        }

        let succeeded = matches!(outcome, UploadOutcome::Success(_));
        let result = reconcile::apply_outcome(&mut guard.roster, &kind, outcome)?;
        if succeeded {
            guard.capture.discard()?;
            guard.job_kind = None;
            guard.phase = SessionPhase::Reconciled;
        } else {
            guard.phase = SessionPhase::Captured;
        }
        Ok(result)
    }

    /// Dismisses a reconciled result and returns to `Idle`.
    pub async fn acknowledge(&self) -> Result<(), WorkflowError> {
        let mut guard = self.inner.lock().await;
        if guard.phase != SessionPhase::Reconciled {
            return Err(WorkflowError::InvalidPhase {
                operation: "acknowledge",
                phase: guard.phase.name(),
            });
        }
        guard.phase = SessionPhase::Idle;
        Ok(())
    }

    /// Flips a person's presence by hand. Available in every phase and never
    /// triggers reconciliation. Returns the new value.
    pub async fn toggle_manual(&self, id: &StudentId) -> Result<bool, WorkflowError> {
        let mut guard = self.inner.lock().await;
        let current = guard
            .roster
            .get(id)
            .map(|person| person.present)
            .ok_or_else(|| WorkflowError::NotFound(id.clone()))?;
        guard.roster.set_present(id, !current)?;
        info!(student_id = %id, present = !current, "manual attendance toggle");
        Ok(!current)
    }

    /// Produces the round's present/absent partition. Local-only; fails if
    /// nobody has been marked since the round began.
    pub async fn submit_attendance_round(&self) -> Result<AttendanceSummary, WorkflowError> {
        let guard = self.inner.lock().await;
        if !guard.roster.any_marked() {
            return Err(WorkflowError::NothingToSubmit);
        }
        Ok(reconcile::summarize(&guard.roster))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
