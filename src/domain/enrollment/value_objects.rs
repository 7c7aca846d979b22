use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Enrollment Value Objects
// ============================================================================

/// Enrollment status. Free-form: callers may move an enrollment to any
/// non-empty status, `PENDING` is only the value new enrollments start with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrollmentStatus(String);

impl EnrollmentStatus {
    pub const PENDING: &'static str = "PENDING";

    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn pending() -> Self {
        Self::new(Self::PENDING)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EnrollmentStatus {
    fn from(status: &str) -> Self {
        Self::new(status)
    }
}
