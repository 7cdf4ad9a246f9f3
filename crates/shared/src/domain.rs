use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable roster identifier (`"S001"` style). The recognition service echoes
/// these back verbatim, so the newtype serializes as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

impl StudentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// One roster entry. The workflow never creates or deletes entries; only the
/// two flags mutate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: StudentId,
    pub name: String,
    pub present: bool,
    pub registered: bool,
}

impl Person {
    pub fn new(id: StudentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            present: false,
            registered: false,
        }
    }

    pub fn with_registration(mut self, registered: bool) -> Self {
        self.registered = registered;
        self
    }
}
