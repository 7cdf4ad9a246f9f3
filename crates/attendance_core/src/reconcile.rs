use shared::domain::StudentId;
use tracing::info;

use crate::{
    error::WorkflowError,
    roster::RosterStore,
    uploader::{UploadJobKind, UploadOutcome, UploadPayload},
};

const NETWORK_FAILURE_MESSAGE: &str = "Network error, please try again later.";
const MALFORMED_RESPONSE: &str = "malformed response";

/// Ordered present/absent name partition, in roster order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub present: Vec<String>,
    pub absent: Vec<String>,
}

/// What the presentation layer renders once an upload settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationResult {
    AttendanceApplied(AttendanceSummary),
    RegistrationConfirmed { name: String },
    Failed { reason: String },
}

/// Applies a settled upload outcome to the roster. A successful attendance
/// result is authoritative: every roster entry is set from the recognized
/// set, replacing any prior flags rather than merging. Failures never touch
/// the roster and pass through as display text.
pub fn apply_outcome(
    roster: &mut RosterStore,
    kind: &UploadJobKind,
    outcome: UploadOutcome,
) -> Result<ReconciliationResult, WorkflowError> {
    match (kind, outcome) {
        (
            UploadJobKind::Attendance,
            UploadOutcome::Success(UploadPayload::Attendance { present_ids }),
        ) => {
            let ids: Vec<StudentId> = roster
                .people()
                .iter()
                .map(|person| person.id.clone())
                .collect();
            for id in &ids {
                roster.set_present(id, present_ids.contains(id))?;
            }
            let summary = summarize(roster);
            info!(
                present = summary.present.len(),
                absent = summary.absent.len(),
                "attendance reconciled from recognition result"
            );
            Ok(ReconciliationResult::AttendanceApplied(summary))
        }
        (
            UploadJobKind::Registration(student_id),
            UploadOutcome::Success(UploadPayload::Registration { name, .. }),
        ) => {
            roster.set_registered(student_id, true)?;
            info!(student_id = %student_id, "registration reconciled");
            Ok(ReconciliationResult::RegistrationConfirmed { name })
        }
        (_, UploadOutcome::RemoteRejected(reason)) => Ok(ReconciliationResult::Failed { reason }),
        (_, UploadOutcome::NetworkFailure) => Ok(ReconciliationResult::Failed {
            reason: NETWORK_FAILURE_MESSAGE.to_string(),
        }),
        // The uploader never produces a payload for the other job kind.
        (_, UploadOutcome::Success(_)) => Ok(ReconciliationResult::Failed {
            reason: MALFORMED_RESPONSE.to_string(),
        }),
    }
}

pub(crate) fn summarize(roster: &RosterStore) -> AttendanceSummary {
    let mut present = Vec::new();
    let mut absent = Vec::new();
    for person in roster.people() {
        if person.present {
            present.push(person.name.clone());
        } else {
            absent.push(person.name.clone());
        }
    }
    AttendanceSummary { present, absent }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use shared::domain::Person;

    use super::*;

    fn roster() -> RosterStore {
        RosterStore::new(vec![
            Person::new(StudentId::new("S001"), "John Doe"),
            Person::new(StudentId::new("S002"), "Jane Smith"),
            Person::new(StudentId::new("S003"), "Alice Johnson"),
            Person::new(StudentId::new("S004"), "Bob Williams"),
        ])
    }

    fn attendance_success(ids: &[&str]) -> UploadOutcome {
        UploadOutcome::Success(UploadPayload::Attendance {
            present_ids: ids.iter().map(|id| StudentId::new(*id)).collect::<HashSet<_>>(),
        })
    }

    #[test]
    fn attendance_success_replaces_prior_flags() {
        let mut store = roster();
        // A manual mark from before the upload must not survive the partition.
        store
            .set_present(&StudentId::new("S002"), true)
            .expect("manual mark");

        let result = apply_outcome(
            &mut store,
            &UploadJobKind::Attendance,
            attendance_success(&["S001", "S003"]),
        )
        .expect("reconcile");

        assert_eq!(
            result,
            ReconciliationResult::AttendanceApplied(AttendanceSummary {
                present: vec!["John Doe".to_string(), "Alice Johnson".to_string()],
                absent: vec!["Jane Smith".to_string(), "Bob Williams".to_string()],
            })
        );
        let flags: Vec<bool> = store.people().iter().map(|p| p.present).collect();
        assert_eq!(flags, vec![true, false, true, false]);
    }

    #[test]
    fn unknown_recognized_ids_are_ignored() {
        let mut store = roster();
        let result = apply_outcome(
            &mut store,
            &UploadJobKind::Attendance,
            attendance_success(&["S001", "S999"]),
        )
        .expect("reconcile");

        match result {
            ReconciliationResult::AttendanceApplied(summary) => {
                assert_eq!(summary.present, vec!["John Doe".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn registration_success_flips_exactly_one_flag() {
        let mut store = roster();
        let id = StudentId::new("S002");
        let result = apply_outcome(
            &mut store,
            &UploadJobKind::Registration(id.clone()),
            UploadOutcome::Success(UploadPayload::Registration {
                student_id: id.clone(),
                name: "Jane Smith".to_string(),
            }),
        )
        .expect("reconcile");

        assert_eq!(
            result,
            ReconciliationResult::RegistrationConfirmed {
                name: "Jane Smith".to_string()
            }
        );
        for person in store.people() {
            assert_eq!(person.registered, person.id == id);
            assert!(!person.present);
        }
    }

    #[test]
    fn failures_never_mutate_the_roster() {
        let mut store = roster();
        let before = store.people().to_vec();

        let rejected = apply_outcome(
            &mut store,
            &UploadJobKind::Attendance,
            UploadOutcome::RemoteRejected("No classroom detected".to_string()),
        )
        .expect("reconcile");
        assert_eq!(
            rejected,
            ReconciliationResult::Failed {
                reason: "No classroom detected".to_string()
            }
        );

        let network = apply_outcome(
            &mut store,
            &UploadJobKind::Registration(StudentId::new("S001")),
            UploadOutcome::NetworkFailure,
        )
        .expect("reconcile");
        assert_eq!(
            network,
            ReconciliationResult::Failed {
                reason: NETWORK_FAILURE_MESSAGE.to_string()
            }
        );

        assert_eq!(store.people(), before.as_slice());
        assert!(!store.any_marked());
    }

    #[test]
    fn registration_for_unknown_student_is_not_found() {
        let mut store = roster();
        let err = apply_outcome(
            &mut store,
            &UploadJobKind::Registration(StudentId::new("S999")),
            UploadOutcome::Success(UploadPayload::Registration {
                student_id: StudentId::new("S999"),
                name: "Ghost".to_string(),
            }),
        )
        .expect_err("unknown id");
        assert_eq!(err, WorkflowError::NotFound(StudentId::new("S999")));
    }
}
