use serde::{Deserialize, Serialize};

use crate::domain::enrollment::EnrollmentStatus;

/// One read-model row per enrollment id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentView {
    pub enrollment_id: String,
    pub student_id: i64,
    pub course_id: i64,
    pub status: EnrollmentStatus,
}
