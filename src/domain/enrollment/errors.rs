// ============================================================================
// Enrollment Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error("Student ID is required")]
    MissingStudentId,

    #[error("Course ID is required")]
    MissingCourseId,

    #[error("Status is required")]
    EmptyStatus,

    #[error("Enrollment already exists: {0}")]
    AlreadyExists(String),

    #[error("Enrollment not found: {0}")]
    NotFound(String),

    #[error("Aggregate not initialized")]
    NotInitialized,
}

impl EnrollmentError {
    /// Missing or empty command fields
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EnrollmentError::MissingStudentId
                | EnrollmentError::MissingCourseId
                | EnrollmentError::EmptyStatus
        )
    }
}
