use serde::{Deserialize, Serialize};

/// Error body the recognition service returns on non-success statuses. The
/// `message` field is optional on the wire; callers fall back to an
/// operation-specific default when it is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Best-effort extraction of the server-supplied reason from an error body.
pub fn rejection_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_server_message_when_present() {
        assert_eq!(
            rejection_message(r#"{"message":"No face detected"}"#, "Failed to upload."),
            "No face detected"
        );
    }

    #[test]
    fn falls_back_when_message_absent_or_body_malformed() {
        assert_eq!(rejection_message("{}", "Failed to upload."), "Failed to upload.");
        assert_eq!(
            rejection_message("<html>502</html>", "Failed to register"),
            "Failed to register"
        );
    }
}
