use std::{collections::HashSet, sync::Arc, time::Duration};

use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    domain::StudentId,
    error::rejection_message,
    protocol::{RecognitionResponse, RegistrationResponse},
};
use tracing::{info, warn};

use crate::{capture::PhotoArtifact, AuthSession};

const ATTENDANCE_REJECTED_FALLBACK: &str = "Failed to upload.";
const REGISTRATION_REJECTED_FALLBACK: &str = "Failed to register";
const MALFORMED_RESPONSE: &str = "malformed response";

/// Which workflow a submitted photo belongs to. Picks the endpoint, the
/// multipart shape, and the reconciliation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadJobKind {
    Attendance,
    Registration(StudentId),
}

impl UploadJobKind {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            UploadJobKind::Attendance => "attendance",
            UploadJobKind::Registration(_) => "registration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPayload {
    Attendance { present_ids: HashSet<StudentId> },
    Registration { student_id: StudentId, name: String },
}

/// Exactly one outcome is produced per submitted job. Retrying is always a
/// fresh, caller-initiated `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success(UploadPayload),
    RemoteRejected(String),
    NetworkFailure,
}

/// Performs the single network round trip for a capture-upload job and
/// classifies the response.
pub struct PhotoUploader {
    http: Client,
    base_url: String,
    auth: Arc<dyn AuthSession>,
}

impl PhotoUploader {
    pub fn new(
        base_url: impl Into<String>,
        upload_timeout: Duration,
        auth: Arc<dyn AuthSession>,
    ) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(upload_timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            auth,
        })
    }

    /// One POST, one outcome. Transport failures and timeout expiry map to
    /// `NetworkFailure`; any received response settles the job.
    pub async fn submit(&self, artifact: &PhotoArtifact, kind: &UploadJobKind) -> UploadOutcome {
        let (endpoint, form) = match build_request(&self.base_url, artifact, kind) {
            Ok(parts) => parts,
            Err(err) => {
                warn!(job = kind.describe(), error = %err, "failed to build upload request");
                return UploadOutcome::NetworkFailure;
            }
        };

        let mut request = self.http.post(&endpoint).multipart(form);
        if let Some(token) = self.auth.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(job = kind.describe(), error = %err, "upload transport failure");
                return UploadOutcome::NetworkFailure;
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(job = kind.describe(), error = %err, "failed to read upload response");
                return UploadOutcome::NetworkFailure;
            }
        };

        if !status.is_success() {
            let reason = rejection_message(&body, rejected_fallback(kind));
            warn!(
                job = kind.describe(),
                status = status.as_u16(),
                reason = %reason,
                "upload rejected by server"
            );
            return UploadOutcome::RemoteRejected(reason);
        }

        match parse_success(kind, &body) {
            Some(payload) => {
                info!(job = kind.describe(), "upload accepted");
                UploadOutcome::Success(payload)
            }
            None => {
                warn!(
                    job = kind.describe(),
                    "success response did not match the expected shape"
                );
                UploadOutcome::RemoteRejected(MALFORMED_RESPONSE.to_string())
            }
        }
    }
}

fn build_request(
    base_url: &str,
    artifact: &PhotoArtifact,
    kind: &UploadJobKind,
) -> reqwest::Result<(String, Form)> {
    Ok(match kind {
        UploadJobKind::Attendance => (
            format!("{base_url}/upload-photo"),
            Form::new().part("photo", photo_part(artifact, "attendance.jpg")?),
        ),
        UploadJobKind::Registration(student_id) => (
            format!("{base_url}/register-student"),
            Form::new()
                .text("studentId", student_id.to_string())
                .part("photo", photo_part(artifact, "photo.jpg")?),
        ),
    })
}

fn photo_part(artifact: &PhotoArtifact, file_name: &'static str) -> reqwest::Result<Part> {
    Part::bytes(artifact.bytes.clone())
        .file_name(file_name)
        .mime_str("image/jpeg")
}

fn rejected_fallback(kind: &UploadJobKind) -> &'static str {
    match kind {
        UploadJobKind::Attendance => ATTENDANCE_REJECTED_FALLBACK,
        UploadJobKind::Registration(_) => REGISTRATION_REJECTED_FALLBACK,
    }
}

fn parse_success(kind: &UploadJobKind, body: &str) -> Option<UploadPayload> {
    match kind {
        UploadJobKind::Attendance => serde_json::from_str::<RecognitionResponse>(body)
            .ok()
            .map(|response| UploadPayload::Attendance {
                present_ids: response.present_students.into_iter().collect(),
            }),
        UploadJobKind::Registration(expected) => serde_json::from_str::<RegistrationResponse>(body)
            .ok()
            .and_then(|response| {
                if &response.student_id != expected {
                    warn!(
                        expected = %expected,
                        echoed = %response.student_id,
                        "server echoed a different student in the registration response"
                    );
                    return None;
                }
                Some(UploadPayload::Registration {
                    student_id: response.student_id,
                    name: response.name,
                })
            }),
    }
}
