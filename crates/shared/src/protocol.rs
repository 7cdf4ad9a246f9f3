use serde::{Deserialize, Serialize};

use crate::domain::StudentId;

/// Success body of the attendance recognition endpoint: the ids the remote
/// service recognized as present in the submitted photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResponse {
    pub present_students: Vec<StudentId>,
}

/// Success body of the registration endpoint. The echo is used only for the
/// confirmation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub student_id: StudentId,
    pub name: String,
}
