use super::value_objects::EnrollmentStatus;

// ============================================================================
// Enrollment Commands - Represent user intent
// ============================================================================
//
// Fields that callers may omit are `Option`s so that a missing value reaches
// the aggregate and is rejected there, before any event exists.
//
// ============================================================================

#[derive(Debug, Clone)]
pub enum EnrollmentCommand {
    CreateEnrollment {
        enrollment_id: String,
        student_id: Option<i64>,
        course_id: Option<i64>,
        status: EnrollmentStatus,
    },
    UpdateStatus {
        enrollment_id: String,
        status: Option<String>,
    },
}

impl EnrollmentCommand {
    /// Target identity of the command
    pub fn enrollment_id(&self) -> &str {
        match self {
            EnrollmentCommand::CreateEnrollment { enrollment_id, .. }
            | EnrollmentCommand::UpdateStatus { enrollment_id, .. } => enrollment_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EnrollmentCommand::CreateEnrollment { .. } => "CreateEnrollment",
            EnrollmentCommand::UpdateStatus { .. } => "UpdateEnrollmentStatus",
        }
    }
}
